use super::{turns, App, AppAction, AppCommand};
use crate::commands::{process_input, CommandResult};

pub(super) fn handle_input_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::InsertIntoInput { text } => {
            if !text.is_empty() {
                app.ui.input.push_str(&text);
            }
            None
        }
        AppAction::InputBackspace => {
            app.ui.input.pop();
            None
        }
        AppAction::ClearInput => {
            app.ui.input.clear();
            None
        }
        AppAction::ProcessCommand { input } => handle_process_command(app, input),
        AppAction::ScrollUp { lines } => {
            app.ui.scroll_offset = app.ui.scroll_offset.saturating_add(lines);
            None
        }
        AppAction::ScrollDown { lines } => {
            app.ui.scroll_offset = app.ui.scroll_offset.saturating_sub(lines);
            None
        }
        AppAction::ToggleHelp => {
            app.ui.help_visible = !app.ui.help_visible;
            None
        }
        AppAction::ClearStatus => {
            app.ui.clear_status();
            None
        }
        AppAction::Quit => {
            app.ui.exit_requested = true;
            None
        }
        _ => unreachable!("non-input action routed to input handler"),
    }
}

/// The input buffer is only consumed when the line is accepted, so text
/// typed while a reply is pending survives.
fn handle_process_command(app: &mut App, input: String) -> Option<AppCommand> {
    if input.trim().is_empty() {
        return None;
    }

    match process_input(app, &input) {
        CommandResult::Continue => {
            app.ui.input.clear();
            None
        }
        CommandResult::Spawn(command) => {
            app.ui.input.clear();
            Some(command)
        }
        CommandResult::ProcessAsMessage(message) => {
            let command = turns::submit_message(app, message);
            if command.is_some() {
                app.ui.input.clear();
            }
            command
        }
    }
}
