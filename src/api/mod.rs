//! Wire payloads exchanged with the local model runtime.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
pub struct PullRequest {
    pub model: String,
    pub stream: bool,
}

/// One line of the NDJSON progress stream returned by `/api/pull`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ChatOptions {
    pub num_predict: u32,
    pub temperature: f32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<u32>,
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: ChatOptions,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteRequest {
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_status_tolerates_sparse_lines() {
        let status: PullStatus = serde_json::from_str(r#"{"status":"pulling manifest"}"#)
            .expect("status line parses");
        assert_eq!(status.status, "pulling manifest");
        assert!(status.digest.is_none());
        assert!(status.total.is_none());
    }

    #[test]
    fn chat_request_serializes_sampling_options() {
        let request = ChatRequest {
            model: "m".into(),
            messages: vec![ChatMessage::new("user", "Hallo")],
            stream: false,
            options: ChatOptions {
                num_predict: 512,
                temperature: 0.7,
                top_p: 0.9,
                num_gpu: None,
            },
        };
        let value = serde_json::to_value(&request).expect("serializes");
        assert_eq!(value["options"]["num_predict"], 512);
        assert_eq!(value["messages"][0]["content"], "Hallo");
        assert_eq!(value["stream"], false);
        assert!(value["options"].get("num_gpu").is_none());
    }
}
