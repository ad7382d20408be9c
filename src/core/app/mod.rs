//! The lifecycle controller.
//!
//! [`App`] owns the application state and moves it between onboarding,
//! model loading and chatting. It never awaits anything itself: inputs
//! arrive as [`AppAction`]s, and whenever async work is needed the reducer
//! hands an [`AppCommand`] back to the event loop, whose executors report
//! the outcome as another action.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::conversation::ConversationStore;
use crate::core::message::Message;
use crate::core::persistence::{persist, StateStore};
use crate::core::provision::ModelRequest;
use crate::core::state::{startup_screen, ApplicationState, Screen};

pub mod actions;
pub mod progress;
pub mod session;
pub mod ui_state;


pub use actions::{apply_action, apply_actions, AppAction, AppActionDispatcher, AppCommand};
pub use progress::{LoadProgress, LoadStage, ResourceLabel};
pub use session::{ModelSession, READY_TRANSITION_DELAY};
pub use ui_state::{StatusNote, UiState};

pub const MODEL_STATUS_IDLE: &str = "Bereit";
pub const MODEL_STATUS_GENERATING: &str = "Generiert...";

/// Read-only copy of the controller state, as returned by
/// [`App::get_state`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    #[serde(flatten)]
    pub state: ApplicationState,
    pub provision_status: &'static str,
    pub provision_error: Option<String>,
    pub progress: LoadProgress,
    pub model_status: &'static str,
    pub model_id: String,
}

impl StateSnapshot {
    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }
}

pub struct App {
    pub state: ApplicationState,
    pub session: ModelSession,
    pub ui: UiState,
    store: Box<dyn StateStore>,
}

impl App {
    /// Restores whatever the store remembers. Nothing is scheduled until
    /// [`App::start`] runs.
    pub fn new(store: Box<dyn StateStore>, request: ModelRequest) -> Self {
        let state = store
            .load()
            .map(ApplicationState::from_persisted)
            .unwrap_or_default();
        Self {
            state,
            session: ModelSession::new(request),
            ui: UiState::default(),
            store,
        }
    }

    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.session.ready_delay = delay;
        self
    }

    /// Picks the startup screen, kicking off a load when onboarding is
    /// already done.
    pub fn start(&mut self) -> Option<AppCommand> {
        let screen = startup_screen(self.state.onboarding_complete, self.state.model_loaded);
        info!(
            screen = screen.as_str(),
            messages = self.state.messages.len(),
            "Starting session"
        );
        self.state.current_screen = screen;
        match screen {
            Screen::ModelLoader => self.begin_loading(),
            Screen::Onboarding | Screen::Home => None,
        }
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn conversation(&mut self) -> ConversationStore<'_> {
        ConversationStore::new(&mut self.state, self.store.as_ref())
    }

    pub fn persist(&self) {
        persist(self.store.as_ref(), &self.state);
    }

    pub fn get_state(&self) -> StateSnapshot {
        StateSnapshot {
            state: self.state.clone(),
            provision_status: self.session.provision.as_str(),
            provision_error: self
                .session
                .provision
                .error_message()
                .map(str::to_string),
            progress: self.session.progress.clone(),
            model_status: self.model_status(),
            model_id: self.session.request.model.clone(),
        }
    }

    pub fn model_status(&self) -> &'static str {
        if self.state.is_generating {
            MODEL_STATUS_GENERATING
        } else {
            MODEL_STATUS_IDLE
        }
    }

    /// Switches screens when the readiness flags allow it. Returns whether
    /// the screen changed hands.
    pub fn navigate_to(&mut self, screen: Screen) -> bool {
        if !self.state.permits(screen) {
            debug!(
                screen = screen.as_str(),
                onboarding_complete = self.state.onboarding_complete,
                model_loaded = self.state.model_loaded,
                "Navigation refused"
            );
            return false;
        }
        self.state.current_screen = screen;
        true
    }

    /// Empties the message log. A reply still on its way is abandoned.
    pub fn clear_all_chats(&mut self) {
        self.abandon_turn();
        self.conversation().clear();
        self.ui.scroll_to_bottom();
        info!("Cleared all chats");
    }

    /// Asks the executor to purge the runtime's caches. The persisted blob
    /// is removed once the purge has succeeded; in-memory state stays as
    /// it is.
    pub fn clear_model_cache(&mut self) -> AppCommand {
        AppCommand::PurgeCaches {
            request: self.session.request.clone(),
        }
    }

    /// Back to a first-launch state, from any screen.
    pub fn reset_onboarding(&mut self) {
        self.abandon_turn();
        self.session.discard_model();
        self.state.onboarding_complete = false;
        self.state.model_loaded = false;
        self.state.model_loading = false;
        self.state.messages.clear();
        self.state.current_screen = Screen::Onboarding;
        self.ui = UiState::default();
        self.persist();
        info!("Onboarding reset");
    }

    /// Begins a fresh acquisition unless one is running or a model is
    /// already in hand.
    pub(crate) fn begin_loading(&mut self) -> Option<AppCommand> {
        if !self.session.provision.begin() {
            debug!(
                state = self.session.provision.as_str(),
                "Ignoring load request"
            );
            return None;
        }

        let (load_id, cancel) = self.session.next_load();
        self.state.model_loading = true;
        self.state.model_loaded = false;
        self.state.current_screen = Screen::ModelLoader;
        self.ui.cancel_confirm_pending = false;

        Some(AppCommand::Provision {
            load_id,
            request: self.session.request.clone(),
            cancel,
        })
    }

    fn abandon_turn(&mut self) {
        if self.state.is_generating {
            debug!(
                turn_id = self.session.current_turn_id,
                "Abandoning in-flight turn"
            );
        }
        self.state.is_generating = false;
        self.session.next_turn();
    }
}
