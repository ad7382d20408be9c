use tracing::debug;

use crate::core::app::{AppAction, AppActionDispatcher, AppCommand};
use crate::core::provision::ProvisioningService;

pub mod generation;
pub mod model_loader;

use self::generation::spawn_generation;
use self::model_loader::{spawn_cache_purge, spawn_model_loader};

/// Turns reducer commands into background tasks whose results come back
/// as actions through the dispatcher.
#[derive(Clone)]
pub struct CommandExecutor {
    service: ProvisioningService,
    dispatcher: AppActionDispatcher,
}

impl CommandExecutor {
    pub fn new(service: ProvisioningService, dispatcher: AppActionDispatcher) -> Self {
        Self {
            service,
            dispatcher,
        }
    }

    pub fn execute(&self, command: AppCommand) {
        match command {
            AppCommand::Provision {
                load_id,
                request,
                cancel,
            } => spawn_model_loader(
                self.service.clone(),
                self.dispatcher.clone(),
                load_id,
                request,
                cancel,
            ),
            AppCommand::Generate {
                turn_id,
                capability,
                messages,
                options,
            } => spawn_generation(
                self.dispatcher.clone(),
                turn_id,
                capability,
                messages,
                options,
            ),
            AppCommand::PurgeCaches { request } => {
                spawn_cache_purge(self.service.clone(), self.dispatcher.clone(), request)
            }
            AppCommand::EnterChatAfter { load_id, delay } => {
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    debug!(load_id, "Entering chat");
                    dispatcher.dispatch(AppAction::EnterChat { load_id });
                });
            }
        }
    }
}
