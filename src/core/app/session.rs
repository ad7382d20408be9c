use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::provision::{Capability, ModelRequest, ProvisionState};

use super::progress::LoadProgress;

/// Pause between a finished load and the switch to the chat screen, long
/// enough for "Fertig!" to register.
pub const READY_TRANSITION_DELAY: Duration = Duration::from_millis(500);

/// Everything the controller tracks about the model for the current
/// process. None of it is persisted.
pub struct ModelSession {
    pub request: ModelRequest,
    pub provision: ProvisionState,
    pub progress: LoadProgress,
    pub capability: Option<Arc<dyn Capability>>,
    pub load_cancel_token: Option<CancellationToken>,
    /// Bumped for every acquisition; events tagged with an older id are
    /// ignored.
    pub current_load_id: u64,
    /// Bumped for every submitted turn and whenever the log is wiped.
    pub current_turn_id: u64,
    /// Set while a `generate` call is running, even after its turn was
    /// abandoned. Only the call's own completion clears it.
    pub generation_in_flight: bool,
    pub ready_delay: Duration,
}

impl ModelSession {
    pub fn new(request: ModelRequest) -> Self {
        Self {
            request,
            provision: ProvisionState::default(),
            progress: LoadProgress::default(),
            capability: None,
            load_cancel_token: None,
            current_load_id: 0,
            current_turn_id: 0,
            generation_in_flight: false,
            ready_delay: READY_TRANSITION_DELAY,
        }
    }

    pub fn is_current_load(&self, load_id: u64) -> bool {
        load_id == self.current_load_id
    }

    /// Starts a fresh acquisition id and cancellation token.
    pub fn next_load(&mut self) -> (u64, CancellationToken) {
        self.cancel_load();
        self.current_load_id += 1;
        self.progress = LoadProgress::default();
        let token = CancellationToken::new();
        self.load_cancel_token = Some(token.clone());
        (self.current_load_id, token)
    }

    /// Cancels the in-flight acquisition, if any.
    pub fn cancel_load(&mut self) {
        if let Some(token) = self.load_cancel_token.take() {
            token.cancel();
        }
    }

    pub fn next_turn(&mut self) -> u64 {
        self.current_turn_id += 1;
        self.current_turn_id
    }

    /// Forgets the capability and any acquisition, returning to
    /// `Uninitialized`.
    pub fn discard_model(&mut self) {
        self.cancel_load();
        self.current_load_id += 1;
        self.capability = None;
        self.provision.reset();
        self.progress = LoadProgress::default();
    }
}
