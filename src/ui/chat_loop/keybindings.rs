//! Key handling for each screen.
//!
//! Keys resolve to [`AppAction`]s against a read-only view of the app; the
//! event loop applies them like any other action.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::commands::matching_commands;
use crate::core::app::{App, AppAction};
use crate::core::state::Screen;

const PAGE_LINES: u16 = 10;

pub fn map_key(app: &App, key: KeyEvent) -> Vec<AppAction> {
    if key.kind == KeyEventKind::Release {
        return Vec::new();
    }
    if is_ctrl(&key, 'c') {
        return vec![AppAction::Quit];
    }

    match app.state.current_screen {
        Screen::Onboarding => onboarding_keys(key),
        Screen::ModelLoader => loader_keys(app, key),
        Screen::Home => chat_keys(app, key),
    }
}

/// Bracketed paste only lands in the chat input.
pub fn map_paste(app: &App, text: String) -> Vec<AppAction> {
    if app.state.current_screen != Screen::Home {
        return Vec::new();
    }
    let text = text.replace(['\r', '\n'], " ");
    vec![AppAction::InsertIntoInput { text }]
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

fn onboarding_keys(key: KeyEvent) -> Vec<AppAction> {
    match key.code {
        KeyCode::Enter => vec![AppAction::ConfirmOnboarding],
        KeyCode::Esc | KeyCode::Char('q') => vec![AppAction::Quit],
        _ => Vec::new(),
    }
}

fn loader_keys(app: &App, key: KeyEvent) -> Vec<AppAction> {
    if app.ui.cancel_confirm_pending {
        return match key.code {
            KeyCode::Char('j' | 'J' | 'y' | 'Y') | KeyCode::Enter => {
                vec![AppAction::RequestCancelLoading]
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => vec![AppAction::DismissCancelLoading],
            _ => Vec::new(),
        };
    }

    match key.code {
        KeyCode::Esc if app.session.provision.is_loading() => {
            vec![AppAction::RequestCancelLoading]
        }
        KeyCode::Enter if app.session.provision.can_begin() => vec![AppAction::RetryLoading],
        _ => Vec::new(),
    }
}

fn chat_keys(app: &App, key: KeyEvent) -> Vec<AppAction> {
    if is_ctrl(&key, 'l') {
        return vec![AppAction::ClearAllChats];
    }
    if is_ctrl(&key, 'u') {
        return vec![AppAction::ClearInput];
    }

    match key.code {
        KeyCode::Esc if app.ui.help_visible => vec![AppAction::ToggleHelp],
        KeyCode::Esc if app.ui.status.is_some() => vec![AppAction::ClearStatus],
        KeyCode::F(1) => vec![AppAction::ToggleHelp],
        KeyCode::Enter => vec![AppAction::ProcessCommand {
            input: app.ui.input.clone(),
        }],
        KeyCode::Backspace => vec![AppAction::InputBackspace],
        KeyCode::Tab => complete_command(&app.ui.input)
            .map(|text| vec![AppAction::InsertIntoInput { text }])
            .unwrap_or_default(),
        KeyCode::Up => vec![AppAction::ScrollUp { lines: 1 }],
        KeyCode::Down => vec![AppAction::ScrollDown { lines: 1 }],
        KeyCode::PageUp => vec![AppAction::ScrollUp { lines: PAGE_LINES }],
        KeyCode::PageDown => vec![AppAction::ScrollDown { lines: PAGE_LINES }],
        KeyCode::End => vec![AppAction::ScrollDown { lines: u16::MAX }],
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            vec![AppAction::InsertIntoInput {
                text: c.to_string(),
            }]
        }
        _ => Vec::new(),
    }
}

/// Remaining characters of the only slash command starting with `input`.
fn complete_command(input: &str) -> Option<String> {
    let prefix = input.strip_prefix('/')?;
    if prefix.contains(char::is_whitespace) {
        return None;
    }
    let mut matches = matching_commands(prefix);
    let command = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(command.name[prefix.len()..].to_string())
}
