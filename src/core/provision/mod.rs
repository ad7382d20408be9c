//! Model provisioning: acquiring a text-generation capability from a model
//! runtime while reporting progress and honoring cancellation.
//!
//! [`ProvisioningService::spawn_acquire`] runs one acquisition as a Tokio
//! task and hands back a receiver of [`ProvisionEvent`]s. The stream is
//! finite: zero or more `Progress` events followed by exactly one of
//! `Ready`, `Failed` or `Cancelled`.

pub mod backend;
pub mod ollama;
mod relay;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use backend::{
    extract_reply, Capability, GenerationError, GenerationOptions, GenerationOutput, ModelBackend,
    ModelRequest, ProvisionError,
};
pub use ollama::OllamaBackend;
pub use relay::ProgressSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    /// Fetching of a named resource is about to begin.
    Initiate,
    /// Bulk transfer of a resource has started.
    Download,
    /// Transfer progress, with a percentage.
    Progress,
    /// A resource finished.
    Done,
}

impl ProgressPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressPhase::Initiate => "initiate",
            ProgressPhase::Download => "download",
            ProgressPhase::Progress => "progress",
            ProgressPhase::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub percent: Option<u8>,
    pub file_label: Option<String>,
}

impl ProgressEvent {
    pub fn initiate(file: impl Into<String>) -> Self {
        Self {
            phase: ProgressPhase::Initiate,
            percent: None,
            file_label: Some(file.into()),
        }
    }

    pub fn download(file: impl Into<String>) -> Self {
        Self {
            phase: ProgressPhase::Download,
            percent: None,
            file_label: Some(file.into()),
        }
    }

    /// Rounds `percent` to the nearest whole number inside `0..=100`.
    pub fn progress(percent: f64, file: Option<String>) -> Self {
        let rounded = if percent.is_finite() {
            percent.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };
        Self {
            phase: ProgressPhase::Progress,
            percent: Some(rounded),
            file_label: file,
        }
    }

    pub fn done(file: impl Into<String>) -> Self {
        Self {
            phase: ProgressPhase::Done,
            percent: None,
            file_label: Some(file.into()),
        }
    }
}

/// Lifecycle of the provisioning service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProvisionState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Failed {
        message: String,
    },
    Cancelled,
}

impl ProvisionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionState::Uninitialized => "uninitialized",
            ProvisionState::Loading => "loading",
            ProvisionState::Ready => "ready",
            ProvisionState::Failed { .. } => "failed",
            ProvisionState::Cancelled => "cancelled",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ProvisionState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ProvisionState::Ready)
    }

    /// Whether a fresh acquisition may start from here.
    pub fn can_begin(&self) -> bool {
        matches!(
            self,
            ProvisionState::Uninitialized | ProvisionState::Failed { .. }
        )
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ProvisionState::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// `Uninitialized | Failed → Loading`.
    pub fn begin(&mut self) -> bool {
        self.transition(|state| state.can_begin().then_some(ProvisionState::Loading))
    }

    /// `Loading → Ready`.
    pub fn succeed(&mut self) -> bool {
        self.transition(|state| state.is_loading().then_some(ProvisionState::Ready))
    }

    /// `Loading → Failed`.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.transition(move |state| {
            state
                .is_loading()
                .then_some(ProvisionState::Failed { message })
        })
    }

    /// `Loading → Cancelled`.
    pub fn cancel(&mut self) -> bool {
        self.transition(|state| state.is_loading().then_some(ProvisionState::Cancelled))
    }

    /// `Cancelled → Uninitialized`.
    pub fn settle_cancelled(&mut self) -> bool {
        self.transition(|state| {
            matches!(state, ProvisionState::Cancelled).then_some(ProvisionState::Uninitialized)
        })
    }

    /// Drops back to `Uninitialized` from anywhere.
    pub fn reset(&mut self) {
        *self = ProvisionState::Uninitialized;
    }

    fn transition<F>(&mut self, next: F) -> bool
    where
        F: FnOnce(&ProvisionState) -> Option<ProvisionState>,
    {
        match next(self) {
            Some(state) => {
                debug!(from = self.as_str(), to = state.as_str(), "Provisioning transition");
                *self = state;
                true
            }
            None => false,
        }
    }
}

pub enum ProvisionEvent {
    Progress(ProgressEvent),
    Ready(Arc<dyn Capability>),
    Failed(String),
    Cancelled,
}

impl fmt::Debug for ProvisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionEvent::Progress(event) => f.debug_tuple("Progress").field(event).finish(),
            ProvisionEvent::Ready(capability) => {
                f.debug_tuple("Ready").field(&capability.model_id()).finish()
            }
            ProvisionEvent::Failed(message) => f.debug_tuple("Failed").field(message).finish(),
            ProvisionEvent::Cancelled => f.write_str("Cancelled"),
        }
    }
}

#[derive(Clone)]
pub struct ProvisioningService {
    backend: Arc<dyn ModelBackend>,
}

impl ProvisioningService {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    /// Starts acquiring `request` in the background.
    pub fn spawn_acquire(
        &self,
        request: ModelRequest,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<ProvisionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = self.backend.clone();
        tokio::spawn(async move {
            run_acquisition(backend, request, cancel, tx).await;
        });
        rx
    }

    pub async fn purge_caches(&self, request: &ModelRequest) -> Result<(), ProvisionError> {
        self.backend.purge_caches(request).await
    }
}

async fn run_acquisition(
    backend: Arc<dyn ModelBackend>,
    request: ModelRequest,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<ProvisionEvent>,
) {
    let sink = ProgressSink::new(tx.clone(), cancel.clone());
    info!(
        backend = backend.name(),
        model = %request.model,
        dtype = %request.dtype,
        device = %request.device,
        "Acquiring model"
    );

    let outcome = tokio::select! {
        _ = cancel.cancelled() => Err(ProvisionError::Cancelled),
        result = backend.acquire(&request, &sink, &cancel) => result,
    };

    let event = if cancel.is_cancelled() {
        ProvisionEvent::Cancelled
    } else {
        match outcome {
            Ok(capability) => {
                sink.complete();
                info!(model = capability.model_id(), "Model ready");
                ProvisionEvent::Ready(capability)
            }
            Err(ProvisionError::Cancelled) => ProvisionEvent::Cancelled,
            Err(err) => {
                warn!(error = %err, "Model acquisition failed");
                ProvisionEvent::Failed(err.to_string())
            }
        }
    };
    let _ = tx.send(event);
}
