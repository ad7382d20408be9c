//! Provisioning against a local Ollama daemon.
//!
//! Acquisition pulls the model through `/api/pull`, whose NDJSON status
//! stream is translated into progress phases by [`PullTracker`]. Generation
//! goes through a non-streaming `/api/chat` call.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use memchr::memchr;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{
    ChatMessage, ChatOptions, ChatRequest, ChatResponse, DeleteRequest, PullRequest, PullStatus,
};
use crate::utils::url::{Endpoint, RuntimeUrl};

use super::backend::{
    Capability, GenerationError, GenerationOptions, GenerationOutput, ModelBackend, ModelRequest,
    ProvisionError,
};
use super::relay::ProgressSink;
use super::ProgressEvent;

const MANIFEST_LABEL: &str = "manifest";

pub struct OllamaBackend {
    client: Client,
    base_url: RuntimeUrl,
}

impl OllamaBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: RuntimeUrl::new(base_url),
        }
    }

    fn unreachable(&self, err: reqwest::Error) -> ProvisionError {
        if err.is_connect() {
            ProvisionError::Runtime(format!(
                "Model runtime not reachable at {}. Make sure it is running with: ollama serve",
                self.base_url
            ))
        } else {
            ProvisionError::Http(err)
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn acquire(
        &self,
        request: &ModelRequest,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn Capability>, ProvisionError> {
        let url = self.base_url.endpoint(Endpoint::Pull);
        let response = self
            .client
            .post(url)
            .json(&PullRequest {
                model: request.model.clone(),
                stream: true,
            })
            .send()
            .await
            .map_err(|err| self.unreachable(err))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ProvisionError::Runtime(format!(
                "Runtime rejected the download ({status}): {}",
                body.trim()
            )));
        }

        let mut tracker = PullTracker::new();
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut finished = false;

        while let Some(chunk) = stream.next().await {
            if cancel.is_cancelled() {
                return Err(ProvisionError::Cancelled);
            }
            buffer.extend_from_slice(&chunk?);

            while let Some(newline_pos) = memchr(b'\n', &buffer) {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                finished |= process_line(&line, &mut tracker, progress)?;
            }
        }

        if !buffer.is_empty() {
            finished |= process_line(&buffer, &mut tracker, progress)?;
        }

        if cancel.is_cancelled() {
            return Err(ProvisionError::Cancelled);
        }
        if !finished {
            return Err(ProvisionError::Protocol(
                "download stream ended before the model was ready".to_string(),
            ));
        }

        Ok(Arc::new(OllamaCapability {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            model: request.model.clone(),
            use_gpu: request.device != "cpu",
        }))
    }

    async fn purge_caches(&self, request: &ModelRequest) -> Result<(), ProvisionError> {
        let url = self.base_url.endpoint(Endpoint::Delete);
        let response = self
            .client
            .delete(url)
            .json(&DeleteRequest {
                model: request.model.clone(),
            })
            .send()
            .await
            .map_err(|err| self.unreachable(err))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(model = %request.model, "Model already absent from runtime cache");
                Ok(())
            }
            status => Err(ProvisionError::Runtime(format!(
                "Runtime refused to delete {} ({status})",
                request.model
            ))),
        }
    }
}

/// Returns whether the line carried the final `success` status.
fn process_line(
    line: &[u8],
    tracker: &mut PullTracker,
    progress: &ProgressSink,
) -> Result<bool, ProvisionError> {
    let text = std::str::from_utf8(line)
        .map_err(|err| ProvisionError::Protocol(format!("invalid UTF-8 in stream: {err}")))?
        .trim();
    if text.is_empty() {
        return Ok(false);
    }

    let status: PullStatus = serde_json::from_str(text)
        .map_err(|err| ProvisionError::Protocol(format!("{err}: {text}")))?;
    let step = tracker.observe(&status)?;
    for event in step.events {
        progress.emit(event);
    }
    Ok(step.finished)
}

#[derive(Debug, Default)]
struct Layer {
    label: String,
    total: u64,
    completed: u64,
    started: bool,
    done: bool,
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct PullStep {
    pub events: Vec<ProgressEvent>,
    pub finished: bool,
}

/// Translates the runtime's pull statuses into progress phases.
///
/// The reported percentage covers every layer seen so far, so a large blob
/// dominates the bar the way it dominates the download.
#[derive(Debug, Default)]
pub(crate) struct PullTracker {
    layers: Vec<Layer>,
    manifest_announced: bool,
}

impl PullTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, status: &PullStatus) -> Result<PullStep, ProvisionError> {
        if let Some(error) = &status.error {
            return Err(ProvisionError::Runtime(error.clone()));
        }

        let mut step = PullStep::default();

        if status.status == "success" {
            for layer in self.layers.iter_mut().filter(|layer| !layer.done) {
                layer.done = true;
                step.events.push(ProgressEvent::done(layer.label.clone()));
            }
            step.finished = true;
            return Ok(step);
        }

        if let Some(digest) = &status.digest {
            let label = short_digest(digest);
            let index = match self.layers.iter().position(|layer| layer.label == label) {
                Some(index) => index,
                None => {
                    step.events.push(ProgressEvent::initiate(label.clone()));
                    self.layers.push(Layer {
                        label: label.clone(),
                        ..Layer::default()
                    });
                    self.layers.len() - 1
                }
            };

            if let Some(total) = status.total.filter(|total| *total > 0) {
                let layer = &mut self.layers[index];
                layer.total = total;
                layer.completed = status.completed.unwrap_or(0).min(total);
                if !layer.started {
                    layer.started = true;
                    step.events.push(ProgressEvent::download(label.clone()));
                }
                let finished_layer = layer.completed >= layer.total && !layer.done;
                if finished_layer {
                    layer.done = true;
                }

                step.events
                    .push(ProgressEvent::progress(self.aggregate_percent(), Some(label.clone())));
                if finished_layer {
                    step.events.push(ProgressEvent::done(label));
                }
            }
            return Ok(step);
        }

        if status.status.starts_with("pulling manifest") && !self.manifest_announced {
            self.manifest_announced = true;
            step.events.push(ProgressEvent::initiate(MANIFEST_LABEL));
        }
        Ok(step)
    }

    fn aggregate_percent(&self) -> f64 {
        let (completed, total) = self
            .layers
            .iter()
            .fold((0u64, 0u64), |(completed, total), layer| {
                (completed + layer.completed, total + layer.total)
            });
        if total == 0 {
            0.0
        } else {
            completed as f64 * 100.0 / total as f64
        }
    }
}

fn short_digest(digest: &str) -> String {
    let hex = digest
        .split_once(':')
        .map(|(_, hex)| hex)
        .unwrap_or(digest);
    hex.chars().take(12).collect()
}

pub struct OllamaCapability {
    client: Client,
    base_url: RuntimeUrl,
    model: String,
    use_gpu: bool,
}

#[async_trait]
impl Capability for OllamaCapability {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<GenerationOutput, GenerationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream: false,
            options: ChatOptions {
                num_predict: options.max_new_tokens,
                temperature: if options.do_sample {
                    options.temperature
                } else {
                    0.0
                },
                top_p: options.top_p,
                num_gpu: (!self.use_gpu).then_some(0),
            },
        };

        let url = self.base_url.endpoint(Endpoint::Chat);
        let response = self.client.post(url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(GenerationError::Protocol(format!(
                "runtime answered {status}: {}",
                body.trim()
            )));
        }

        let body: ChatResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(GenerationError::Protocol(error));
        }

        let mut conversation = messages.to_vec();
        conversation.extend(body.message);
        Ok(GenerationOutput::Conversation(conversation))
    }
}
