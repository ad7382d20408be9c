use tracing::{debug, warn};

use super::{App, AppAction, AppCommand};
use crate::core::message::Role;
use crate::core::provision::{extract_reply, GenerationOptions, GenerationOutput};
use crate::core::state::Screen;

pub const EMPTY_REPLY_FALLBACK: &str = "Entschuldigung, ich konnte keine Antwort generieren.";
pub const GENERATION_ERROR_FALLBACK: &str =
    "Es ist ein Fehler aufgetreten. Bitte versuche es erneut.";

pub(super) fn handle_turn_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SubmitMessage { message } => submit_message(app, message),
        AppAction::GenerationFinished { turn_id, result } => {
            finish_turn(app, turn_id, result);
            None
        }
        AppAction::ClearAllChats => {
            app.clear_all_chats();
            None
        }
        _ => unreachable!("non-turn action routed to turn handler"),
    }
}

/// Starts a turn. Blank input, a turn already in flight, or a missing model
/// all leave the state untouched. An abandoned turn whose `generate` call has
/// not returned yet still blocks the next one.
pub(super) fn submit_message(app: &mut App, message: String) -> Option<AppCommand> {
    let text = message.trim();
    if text.is_empty() || app.state.is_generating {
        return None;
    }
    if app.state.current_screen != Screen::Home {
        return None;
    }
    if app.session.generation_in_flight {
        debug!(
            turn_id = app.session.current_turn_id,
            "Submit ignored while an abandoned reply is still generating"
        );
        app.ui.set_status("Die vorherige Antwort wird noch beendet...");
        return None;
    }
    let capability = match &app.session.capability {
        Some(capability) => capability.clone(),
        None => {
            debug!("Submit ignored without a loaded model");
            return None;
        }
    };

    // The window is cut before the new turn lands so the user text is sent
    // exactly once.
    let messages = app.conversation().build_prompt(text);
    app.conversation().append(Role::User, text);
    app.state.is_generating = true;
    app.session.generation_in_flight = true;
    app.ui.clear_status();
    app.ui.scroll_to_bottom();
    let turn_id = app.session.next_turn();
    debug!(turn_id, prompt_len = messages.len(), "Submitting turn");

    Some(AppCommand::Generate {
        turn_id,
        capability,
        messages,
        options: GenerationOptions::CHAT,
    })
}

fn finish_turn(app: &mut App, turn_id: u64, result: Result<GenerationOutput, String>) {
    app.session.generation_in_flight = false;
    if turn_id != app.session.current_turn_id || !app.state.is_generating {
        debug!(
            turn_id,
            current = app.session.current_turn_id,
            "Dropping reply for abandoned turn"
        );
        return;
    }

    let reply = match result {
        Ok(output) => extract_reply(output).unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string()),
        Err(err) => {
            warn!(turn_id, error = %err, "Generation failed");
            GENERATION_ERROR_FALLBACK.to_string()
        }
    };

    app.conversation().append(Role::Assistant, reply);
    app.state.is_generating = false;
    app.ui.scroll_to_bottom();
}
