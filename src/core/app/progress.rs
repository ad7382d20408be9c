use serde::Serialize;

use crate::core::provision::{ProgressEvent, ProgressPhase};

/// Where the model loader currently stands, as far as the loader screen is
/// concerned.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase", tag = "stage", content = "message")]
pub enum LoadStage {
    /// No acquisition has reported anything yet.
    #[default]
    Starting,
    Initiating,
    Downloading,
    Ready,
    Failed(String),
    Cancelled,
}

/// Label of the resource the loader is working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLabel {
    pub name: String,
    pub done: bool,
}

/// Folded view of one acquisition's progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadProgress {
    pub stage: LoadStage,
    pub percent: u8,
    pub resource: Option<ResourceLabel>,
    pub last_event: Option<ProgressEvent>,
}

impl LoadProgress {
    pub fn apply(&mut self, event: ProgressEvent) {
        match event.phase {
            ProgressPhase::Initiate => {
                self.stage = LoadStage::Initiating;
                self.set_resource(event.file_label.as_deref(), false);
            }
            ProgressPhase::Download => {
                self.stage = LoadStage::Downloading;
            }
            ProgressPhase::Progress => {
                if let Some(percent) = event.percent {
                    self.percent = self.percent.max(percent.min(100));
                }
                self.set_resource(event.file_label.as_deref(), false);
            }
            ProgressPhase::Done => {
                self.set_resource(event.file_label.as_deref(), true);
            }
        }
        self.last_event = Some(event);
    }

    pub fn mark_ready(&mut self) {
        self.stage = LoadStage::Ready;
        self.percent = 100;
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.stage = LoadStage::Failed(message.into());
    }

    pub fn mark_cancelled(&mut self) {
        self.stage = LoadStage::Cancelled;
    }

    fn set_resource(&mut self, name: Option<&str>, done: bool) {
        if let Some(name) = name {
            self.resource = Some(ResourceLabel {
                name: name.to_string(),
                done,
            });
        }
    }
}
