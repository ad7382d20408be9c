use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::app::{AppAction, AppActionDispatcher};
use crate::core::provision::{ModelRequest, ProvisionEvent, ProvisioningService};

/// Runs an acquisition and forwards its events tagged with `load_id`.
pub fn spawn_model_loader(
    service: ProvisioningService,
    dispatcher: AppActionDispatcher,
    load_id: u64,
    request: ModelRequest,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut events = service.spawn_acquire(request, cancel);
        while let Some(event) = events.recv().await {
            let action = match event {
                ProvisionEvent::Progress(event) => AppAction::ProvisionProgress { load_id, event },
                ProvisionEvent::Ready(capability) => {
                    AppAction::ProvisionReady { load_id, capability }
                }
                ProvisionEvent::Failed(message) => AppAction::ProvisionFailed { load_id, message },
                ProvisionEvent::Cancelled => {
                    debug!(load_id, "Load cancelled");
                    AppAction::ProvisionCancelled { load_id }
                }
            };
            dispatcher.dispatch(action);
        }
    });
}

pub fn spawn_cache_purge(
    service: ProvisioningService,
    dispatcher: AppActionDispatcher,
    request: ModelRequest,
) {
    tokio::spawn(async move {
        let purge_result = match service.purge_caches(&request).await {
            Ok(()) => {
                info!(model = %request.model, "Model cache purged");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Purging model cache failed");
                Err(err.to_string())
            }
        };
        dispatcher.dispatch(AppAction::CacheClearFinished { purge_result });
    });
}
