use super::*;
use crate::core::message::Role;
use crate::core::state::Screen;
use crate::utils::test_utils::create_test_app;

fn chatting_app() -> App {
    let mut app = create_test_app();
    app.state.onboarding_complete = true;
    app.state.model_loaded = true;
    app.state.current_screen = Screen::Home;
    app
}

#[test]
fn plain_text_is_processed_as_message() {
    let mut app = chatting_app();
    match process_input(&mut app, "Hallo") {
        CommandResult::ProcessAsMessage(message) => assert_eq!(message, "Hallo"),
        _ => panic!("expected message"),
    }
}

#[test]
fn unknown_command_is_sent_as_message() {
    let mut app = chatting_app();
    assert!(matches!(
        process_input(&mut app, "/weather today"),
        CommandResult::ProcessAsMessage(_)
    ));
}

#[test]
fn clear_command_empties_log_and_sets_status() {
    let mut app = chatting_app();
    app.conversation().append(Role::User, "Hallo");
    app.conversation().append(Role::Assistant, "Hallo!");

    let result = process_input(&mut app, "/clear");

    assert!(matches!(result, CommandResult::Continue));
    assert!(app.state.messages.is_empty());
    assert_eq!(
        app.ui.status.as_ref().map(|note| note.text.as_str()),
        Some("Alle Chats gelöscht")
    );
}

#[test]
fn clear_cache_command_spawns_purge() {
    let mut app = chatting_app();
    match process_input(&mut app, "/clear-cache") {
        CommandResult::Spawn(AppCommand::PurgeCaches { request }) => {
            assert_eq!(request.model, "test-model");
        }
        _ => panic!("expected purge command"),
    }
}

#[test]
fn reset_command_returns_to_onboarding() {
    let mut app = chatting_app();
    app.conversation().append(Role::User, "Hallo");

    assert!(matches!(
        process_input(&mut app, "/RESET"),
        CommandResult::Continue
    ));
    assert_eq!(app.state.current_screen, Screen::Onboarding);
    assert!(!app.state.onboarding_complete);
    assert!(app.state.messages.is_empty());
}

#[test]
fn help_command_toggles_overlay() {
    let mut app = chatting_app();
    process_input(&mut app, "/help");
    assert!(app.ui.help_visible);
    process_input(&mut app, "/help");
    assert!(!app.ui.help_visible);
}

#[test]
fn quit_command_requests_exit() {
    let mut app = chatting_app();
    process_input(&mut app, "/quit");
    assert!(app.ui.exit_requested);
}

#[test]
fn trailing_words_after_a_command_are_ignored() {
    let mut app = chatting_app();
    process_input(&mut app, "/quit  jetzt sofort");
    assert!(app.ui.exit_requested);
}

#[test]
fn matching_commands_filters_by_prefix() {
    let names: Vec<&str> = matching_commands("cl").map(|command| command.name).collect();
    assert_eq!(names, vec!["clear", "clear-cache"]);
    assert_eq!(matching_commands("x").count(), 0);
}
