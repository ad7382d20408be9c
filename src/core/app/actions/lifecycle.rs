use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{App, AppAction, AppCommand};
use crate::core::provision::{Capability, ProgressEvent};
use crate::core::state::Screen;

pub(super) fn handle_lifecycle_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::ConfirmOnboarding => confirm_onboarding(app),
        AppAction::ProvisionProgress { load_id, event } => {
            if !is_live_load(app, load_id) {
                return None;
            }
            record_progress(app, event);
            None
        }
        AppAction::ProvisionReady {
            load_id,
            capability,
        } => {
            if !is_live_load(app, load_id) {
                return None;
            }
            finish_loading(app, load_id, capability)
        }
        AppAction::ProvisionFailed { load_id, message } => {
            if !is_live_load(app, load_id) {
                return None;
            }
            fail_loading(app, message);
            None
        }
        AppAction::ProvisionCancelled { load_id } => {
            debug!(load_id, "Acquisition acknowledged cancellation");
            None
        }
        AppAction::EnterChat { load_id } => {
            enter_chat(app, load_id);
            None
        }
        AppAction::RequestCancelLoading => {
            request_cancel(app);
            None
        }
        AppAction::DismissCancelLoading => {
            app.ui.cancel_confirm_pending = false;
            None
        }
        AppAction::RetryLoading => retry_loading(app),
        AppAction::NavigateTo { screen } => {
            app.navigate_to(screen);
            None
        }
        AppAction::ResetOnboarding => {
            app.reset_onboarding();
            None
        }
        AppAction::ClearModelCache => {
            app.ui.set_status("Lösche Cache...");
            Some(app.clear_model_cache())
        }
        AppAction::CacheClearFinished { purge_result } => {
            finish_cache_clear(app, purge_result);
            None
        }
        _ => unreachable!("non-lifecycle action routed to lifecycle handler"),
    }
}

/// Stale events from a superseded or cancelled acquisition fall through
/// here.
fn is_live_load(app: &App, load_id: u64) -> bool {
    let live = app.session.is_current_load(load_id) && app.session.provision.is_loading();
    if !live {
        debug!(
            load_id,
            current = app.session.current_load_id,
            "Dropping event from inactive load"
        );
    }
    live
}

fn confirm_onboarding(app: &mut App) -> Option<AppCommand> {
    if !app.state.onboarding_complete {
        app.state.onboarding_complete = true;
        app.persist();
        info!("Onboarding confirmed");
    }

    if app.state.model_loaded {
        app.navigate_to(Screen::Home);
        return None;
    }
    if app.state.model_loading {
        app.navigate_to(Screen::ModelLoader);
        return None;
    }
    app.begin_loading()
}

fn record_progress(app: &mut App, event: ProgressEvent) {
    app.session.progress.apply(event);
}

fn finish_loading(
    app: &mut App,
    load_id: u64,
    capability: Arc<dyn Capability>,
) -> Option<AppCommand> {
    if !app.session.provision.succeed() {
        return None;
    }
    info!(model = capability.model_id(), "Model loaded");
    app.session.capability = Some(capability);
    app.session.load_cancel_token = None;
    app.session.progress.mark_ready();
    app.state.model_loading = false;
    app.state.model_loaded = true;
    app.ui.cancel_confirm_pending = false;
    app.persist();

    Some(AppCommand::EnterChatAfter {
        load_id,
        delay: app.session.ready_delay,
    })
}

fn fail_loading(app: &mut App, message: String) {
    let message = if message.trim().is_empty() {
        "Unbekannter Fehler".to_string()
    } else {
        message
    };
    warn!(error = %message, "Model loading failed");
    app.session.provision.fail(message.clone());
    app.session.load_cancel_token = None;
    app.session.progress.mark_failed(message);
    app.state.model_loading = false;
    app.ui.cancel_confirm_pending = false;
}

fn enter_chat(app: &mut App, load_id: u64) {
    if !app.session.is_current_load(load_id) || !app.session.provision.is_ready() {
        return;
    }
    if app.state.current_screen != Screen::ModelLoader {
        return;
    }
    if app.navigate_to(Screen::Home) {
        app.ui.scroll_to_bottom();
        info!(messages = app.state.messages.len(), "Entering chat");
    }
}

fn request_cancel(app: &mut App) {
    if !app.session.provision.is_loading() {
        return;
    }
    if !app.ui.cancel_confirm_pending {
        app.ui.cancel_confirm_pending = true;
        return;
    }

    app.ui.cancel_confirm_pending = false;
    app.session.cancel_load();
    app.session.provision.cancel();
    app.session.provision.settle_cancelled();
    app.session.progress.mark_cancelled();
    app.state.model_loading = false;
    info!(load_id = app.session.current_load_id, "Model loading cancelled");
}

fn retry_loading(app: &mut App) -> Option<AppCommand> {
    if !app.state.onboarding_complete {
        return None;
    }
    app.begin_loading()
}

fn finish_cache_clear(app: &mut App, purge_result: Result<(), String>) {
    let outcome = purge_result.and_then(|()| app.store().clear().map_err(|err| err.to_string()));
    match outcome {
        Ok(()) => {
            info!("Model cache cleared");
            app.ui.set_status("Cache gelöscht");
        }
        Err(err) => {
            warn!(error = %err, "Clearing the model cache failed");
            app.ui.set_error(format!("Cache löschen fehlgeschlagen: {err}"));
        }
    }
}
