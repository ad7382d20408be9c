//! Seams between the provisioning service and a concrete model runtime.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::ChatMessage;
use crate::core::message::Role;

use super::relay::ProgressSink;

/// What to provision: a model identifier plus quantization and device
/// preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub model: String,
    pub dtype: String,
    pub device: String,
}

/// Sampling parameters for a single `generate` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub do_sample: bool,
}

impl GenerationOptions {
    /// The only options the chat ever uses.
    pub const CHAT: GenerationOptions = GenerationOptions {
        max_new_tokens: 512,
        temperature: 0.7,
        top_p: 0.9,
        do_sample: true,
    };
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::CHAT
    }
}

/// Raw result of a generation call, before reply extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    /// The full conversation with the model's turn appended.
    Conversation(Vec<ChatMessage>),
    /// A bare completion string.
    Text(String),
}

/// Pulls the assistant's reply out of a generation result, verbatim. Returns
/// `None` when there is nothing but whitespace, so the caller can substitute
/// its fallback.
pub fn extract_reply(output: GenerationOutput) -> Option<String> {
    let reply = match output {
        GenerationOutput::Conversation(messages) => {
            let last = messages.into_iter().last()?;
            if last.role != Role::Assistant.as_str() {
                return None;
            }
            last.content
        }
        GenerationOutput::Text(text) => text,
    };

    if reply.trim().is_empty() {
        None
    } else {
        Some(reply)
    }
}

#[derive(Debug)]
pub enum ProvisionError {
    /// The runtime is unreachable or lacks a required capability.
    Runtime(String),
    /// Transport failure while talking to the runtime.
    Http(reqwest::Error),
    /// The runtime answered with something we could not interpret.
    Protocol(String),
    /// The acquisition noticed a cancellation request and stopped.
    Cancelled,
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::Runtime(message) => write!(f, "{message}"),
            ProvisionError::Http(source) => write!(f, "Model runtime request failed: {source}"),
            ProvisionError::Protocol(message) => write!(f, "Unexpected runtime response: {message}"),
            ProvisionError::Cancelled => write!(f, "Model download cancelled"),
        }
    }
}

impl StdError for ProvisionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ProvisionError::Http(source) => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProvisionError {
    fn from(value: reqwest::Error) -> Self {
        ProvisionError::Http(value)
    }
}

#[derive(Debug)]
pub enum GenerationError {
    Http(reqwest::Error),
    Protocol(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Http(source) => write!(f, "Generation request failed: {source}"),
            GenerationError::Protocol(message) => write!(f, "Generation failed: {message}"),
        }
    }
}

impl StdError for GenerationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            GenerationError::Http(source) => Some(source),
            GenerationError::Protocol(_) => None,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(value: reqwest::Error) -> Self {
        GenerationError::Http(value)
    }
}

/// A ready-to-use text generation handle.
#[async_trait]
pub trait Capability: Send + Sync {
    fn model_id(&self) -> &str;

    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<GenerationOutput, GenerationError>;
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches and prepares the model, reporting progress through `progress`.
    /// Implementations should check `cancel` between progress steps.
    async fn acquire(
        &self,
        request: &ModelRequest,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn Capability>, ProvisionError>;

    /// Removes any model artifacts the runtime has cached for `request`.
    async fn purge_caches(&self, request: &ModelRequest) -> Result<(), ProvisionError>;
}
