use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::api::ChatMessage;
use crate::core::app::App;
use crate::core::message::Role;
use crate::core::persistence::MemoryStateStore;
use crate::core::provision::{
    Capability, GenerationError, GenerationOptions, GenerationOutput, ModelBackend, ModelRequest,
    ProgressEvent, ProgressSink, ProvisionError,
};

pub fn test_request() -> ModelRequest {
    ModelRequest {
        model: "test-model".to_string(),
        dtype: "q4".to_string(),
        device: "gpu".to_string(),
    }
}

/// An app on a fresh in-memory store with no transition delay.
pub fn create_test_app() -> App {
    create_test_app_with_store(Arc::new(MemoryStateStore::new()))
}

pub fn create_test_app_with_store(store: Arc<MemoryStateStore>) -> App {
    App::new(Box::new(store), test_request()).with_ready_delay(Duration::ZERO)
}

/// How a [`ScriptedBackend`] ends its acquisition after replaying its steps.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Ready,
    Fail(String),
    /// Never finishes; only cancellation ends it.
    Hang,
}

/// A backend that replays a fixed list of progress events.
pub struct ScriptedBackend {
    steps: Vec<ProgressEvent>,
    outcome: ScriptedOutcome,
    capability: Arc<ScriptedCapability>,
    purge_result: Mutex<Result<(), String>>,
    purges: AtomicUsize,
}

impl ScriptedBackend {
    pub fn with_steps(steps: Vec<ProgressEvent>) -> Self {
        Self {
            steps,
            outcome: ScriptedOutcome::Ready,
            capability: Arc::new(ScriptedCapability::new()),
            purge_result: Mutex::new(Ok(())),
            purges: AtomicUsize::new(0),
        }
    }

    pub fn outcome(mut self, outcome: ScriptedOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn capability(mut self, capability: Arc<ScriptedCapability>) -> Self {
        self.capability = capability;
        self
    }

    pub fn failing_purge(self, message: &str) -> Self {
        *self.purge_result.lock().expect("purge lock") = Err(message.to_string());
        self
    }

    pub fn purge_count(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn acquire(
        &self,
        _request: &ModelRequest,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn Capability>, ProvisionError> {
        for step in &self.steps {
            if cancel.is_cancelled() {
                return Err(ProvisionError::Cancelled);
            }
            progress.emit(step.clone());
            tokio::task::yield_now().await;
        }

        match &self.outcome {
            ScriptedOutcome::Ready => Ok(self.capability.clone()),
            ScriptedOutcome::Fail(message) => Err(ProvisionError::Runtime(message.clone())),
            ScriptedOutcome::Hang => {
                cancel.cancelled().await;
                Err(ProvisionError::Cancelled)
            }
        }
    }

    async fn purge_caches(&self, _request: &ModelRequest) -> Result<(), ProvisionError> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        self.purge_result
            .lock()
            .expect("purge lock")
            .clone()
            .map_err(ProvisionError::Runtime)
    }
}

/// A capability that answers from a queue of canned results.
///
/// Each call records the prompt it was given. When a gate is installed the
/// call waits on it before answering, which lets tests observe the
/// in-flight state.
pub struct ScriptedCapability {
    replies: Mutex<VecDeque<Result<GenerationOutput, String>>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedCapability {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    /// Queues a reply that comes back as the tail of the conversation.
    pub fn reply(&self, text: &str) {
        self.push(Ok(GenerationOutput::Text(text.to_string())));
    }

    pub fn push(&self, result: Result<GenerationOutput, String>) {
        self.replies.lock().expect("replies lock").push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

impl Default for ScriptedCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Capability for ScriptedCapability {
    fn model_id(&self) -> &str {
        "test-model"
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<GenerationOutput, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(messages.to_vec());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self.replies.lock().expect("replies lock").pop_front();
        match next {
            Some(Ok(GenerationOutput::Text(text))) => {
                let mut conversation = messages.to_vec();
                conversation.push(ChatMessage::new(Role::Assistant.as_str(), text));
                Ok(GenerationOutput::Conversation(conversation))
            }
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(GenerationError::Protocol(message)),
            None => Err(GenerationError::Protocol("no scripted reply".to_string())),
        }
    }
}
