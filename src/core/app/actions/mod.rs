mod input;
mod lifecycle;
mod turns;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use turns::{EMPTY_REPLY_FALLBACK, GENERATION_ERROR_FALLBACK};

use super::App;
use crate::api::ChatMessage;
use crate::core::provision::{
    Capability, GenerationOptions, GenerationOutput, ModelRequest, ProgressEvent,
};
use crate::core::state::Screen;

pub enum AppAction {
    ConfirmOnboarding,
    ProvisionProgress {
        load_id: u64,
        event: ProgressEvent,
    },
    ProvisionReady {
        load_id: u64,
        capability: Arc<dyn Capability>,
    },
    ProvisionFailed {
        load_id: u64,
        message: String,
    },
    ProvisionCancelled {
        load_id: u64,
    },
    EnterChat {
        load_id: u64,
    },
    RequestCancelLoading,
    DismissCancelLoading,
    RetryLoading,
    NavigateTo {
        screen: Screen,
    },
    ResetOnboarding,
    ClearModelCache,
    CacheClearFinished {
        purge_result: Result<(), String>,
    },
    SubmitMessage {
        message: String,
    },
    GenerationFinished {
        turn_id: u64,
        result: Result<GenerationOutput, String>,
    },
    ClearAllChats,
    InsertIntoInput {
        text: String,
    },
    InputBackspace,
    ClearInput,
    ProcessCommand {
        input: String,
    },
    ScrollUp {
        lines: u16,
    },
    ScrollDown {
        lines: u16,
    },
    ToggleHelp,
    ClearStatus,
    Quit,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppAction>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppAction>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction) {
        let _ = self.tx.send(action);
    }
}

/// Async work the reducer needs the event loop to run.
pub enum AppCommand {
    Provision {
        load_id: u64,
        request: ModelRequest,
        cancel: CancellationToken,
    },
    Generate {
        turn_id: u64,
        capability: Arc<dyn Capability>,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
    },
    PurgeCaches {
        request: ModelRequest,
    },
    EnterChatAfter {
        load_id: u64,
        delay: Duration,
    },
}

pub fn apply_actions(
    app: &mut App,
    actions: impl IntoIterator<Item = AppAction>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for action in actions {
        if let Some(cmd) = apply_action(app, action) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::ConfirmOnboarding
        | AppAction::ProvisionProgress { .. }
        | AppAction::ProvisionReady { .. }
        | AppAction::ProvisionFailed { .. }
        | AppAction::ProvisionCancelled { .. }
        | AppAction::EnterChat { .. }
        | AppAction::RequestCancelLoading
        | AppAction::DismissCancelLoading
        | AppAction::RetryLoading
        | AppAction::NavigateTo { .. }
        | AppAction::ResetOnboarding
        | AppAction::ClearModelCache
        | AppAction::CacheClearFinished { .. } => lifecycle::handle_lifecycle_action(app, action),

        AppAction::SubmitMessage { .. }
        | AppAction::GenerationFinished { .. }
        | AppAction::ClearAllChats => turns::handle_turn_action(app, action),

        AppAction::InsertIntoInput { .. }
        | AppAction::InputBackspace
        | AppAction::ClearInput
        | AppAction::ProcessCommand { .. }
        | AppAction::ScrollUp { .. }
        | AppAction::ScrollDown { .. }
        | AppAction::ToggleHelp
        | AppAction::ClearStatus
        | AppAction::Quit => input::handle_input_action(app, action),
    }
}
