//! Slash commands typed into the chat input.

mod registry;

pub use registry::{all_commands, matching_commands, Command};

use crate::core::app::{App, AppCommand};

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    /// The command needs async work from the event loop.
    Spawn(AppCommand),
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    // Trailing words after the name are ignored; no command takes arguments.
    let command_name = match trimmed[1..].split_whitespace().next() {
        Some(name) => name,
        None => return CommandResult::ProcessAsMessage(input.to_string()),
    };

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(app)
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

pub(super) fn handle_help(app: &mut App) -> CommandResult {
    app.ui.help_visible = !app.ui.help_visible;
    CommandResult::Continue
}

pub(super) fn handle_clear(app: &mut App) -> CommandResult {
    app.clear_all_chats();
    app.ui.set_status("Alle Chats gelöscht");
    CommandResult::Continue
}

pub(super) fn handle_clear_cache(app: &mut App) -> CommandResult {
    app.ui.set_status("Lösche Cache...");
    CommandResult::Spawn(app.clear_model_cache())
}

pub(super) fn handle_reset(app: &mut App) -> CommandResult {
    app.reset_onboarding();
    CommandResult::Continue
}

pub(super) fn handle_quit(app: &mut App) -> CommandResult {
    app.ui.exit_requested = true;
    CommandResult::Continue
}

#[cfg(test)]
mod tests;
