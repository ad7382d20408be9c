use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::ChatMessage;
use crate::core::app::{AppAction, AppActionDispatcher};
use crate::core::provision::{Capability, GenerationOptions};

pub fn spawn_generation(
    dispatcher: AppActionDispatcher,
    turn_id: u64,
    capability: Arc<dyn Capability>,
    messages: Vec<ChatMessage>,
    options: GenerationOptions,
) {
    tokio::spawn(async move {
        debug!(turn_id, prompt_len = messages.len(), "Generating reply");
        let result = capability
            .generate(&messages, &options)
            .await
            .map_err(|err| {
                warn!(turn_id, error = %err, "Generation failed");
                err.to_string()
            });
        dispatcher.dispatch(AppAction::GenerationFinished { turn_id, result });
    });
}
