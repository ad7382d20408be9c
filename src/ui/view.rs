//! Pure projection of controller state into what the screen shows.
//!
//! Nothing here touches the application state; the renderer only ever sees
//! a [`View`].

use chrono::Local;

use crate::commands::all_commands;
use crate::core::app::{LoadStage, StateSnapshot, StatusNote, UiState};
use crate::core::message::{Message, Role};
use crate::core::state::Screen;

use super::icons::IconSet;

pub const APP_TITLE: &str = "NeoAI";

const LOADER_TITLE: &str = "Lade Modell...";
const STATUS_INITIATE: &str = "Initialisiere...";
const STATUS_DOWNLOAD: &str = "Lade herunter...";
const STATUS_READY: &str = "Fertig!";
const DETAIL_READY: &str = "Modell bereit";
const STATUS_FAILED: &str = "Fehler!";
const STATUS_CANCELLED: &str = "Abgebrochen";
const DETAIL_CANCELLED: &str = "Download abgebrochen";
const DONE_PREFIX: &str = "✓ ";
const CANCEL_PROMPT: &str = "Download abbrechen? (j/n)";

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Onboarding(OnboardingView),
    Loader(LoaderView),
    Chat(ChatView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingView {
    pub heading: &'static str,
    pub paragraphs: Vec<&'static str>,
    pub hint: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderView {
    pub title: &'static str,
    pub model_id: String,
    pub status: String,
    pub detail: String,
    pub percent: u8,
    pub cancel_prompt: Option<&'static str>,
    pub hint: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub role: Role,
    pub author: String,
    pub content: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeView {
    pub heading: String,
    pub text: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub model_status: String,
    pub model_busy: bool,
    pub model_id: String,
    pub messages: Vec<MessageView>,
    pub welcome: Option<WelcomeView>,
    pub typing_indicator: bool,
    pub input: String,
    pub can_send: bool,
    pub status: Option<StatusNote>,
    pub help: Option<Vec<(String, &'static str)>>,
    pub scroll_offset: u16,
}

pub fn project(snapshot: &StateSnapshot, ui: &UiState, icons: Option<&IconSet>) -> View {
    match snapshot.state.current_screen {
        Screen::Onboarding => View::Onboarding(project_onboarding()),
        Screen::ModelLoader => View::Loader(project_loader(snapshot, ui)),
        Screen::Home => View::Chat(project_chat(snapshot, ui, icons)),
    }
}

fn project_onboarding() -> OnboardingView {
    OnboardingView {
        heading: "Willkommen bei NeoAI",
        paragraphs: vec![
            "NeoAI ist dein persönlicher KI-Assistent, der vollständig auf deinem Rechner läuft.",
            "Beim ersten Start wird ein kompaktes Sprachmodell heruntergeladen. Danach bleibt alles lokal: Deine Unterhaltungen verlassen dieses Gerät nicht.",
            "Der Download kann je nach Verbindung einige Minuten dauern.",
        ],
        hint: "Enter: Los geht's  •  Ctrl+C: Beenden",
    }
}

fn project_loader(snapshot: &StateSnapshot, ui: &UiState) -> LoaderView {
    let progress = &snapshot.progress;
    let resource_detail = progress.resource.as_ref().map(|resource| {
        if resource.done {
            format!("{DONE_PREFIX}{}", resource.name)
        } else {
            resource.name.clone()
        }
    });

    let (status, detail) = match &progress.stage {
        LoadStage::Starting => (
            LOADER_TITLE.to_string(),
            resource_detail.unwrap_or_else(|| STATUS_INITIATE.to_string()),
        ),
        LoadStage::Initiating => (
            STATUS_INITIATE.to_string(),
            resource_detail.unwrap_or_default(),
        ),
        LoadStage::Downloading => (
            STATUS_DOWNLOAD.to_string(),
            resource_detail.unwrap_or_default(),
        ),
        LoadStage::Ready => (STATUS_READY.to_string(), DETAIL_READY.to_string()),
        LoadStage::Failed(message) => (STATUS_FAILED.to_string(), message.clone()),
        LoadStage::Cancelled => (
            STATUS_CANCELLED.to_string(),
            DETAIL_CANCELLED.to_string(),
        ),
    };

    let loading = snapshot.state.model_loading;
    let cancel_prompt = (loading && ui.cancel_confirm_pending).then_some(CANCEL_PROMPT);
    let hint = if loading {
        "Esc: Abbrechen"
    } else if matches!(progress.stage, LoadStage::Ready) {
        ""
    } else {
        "Enter: Erneut versuchen  •  Ctrl+C: Beenden"
    };

    LoaderView {
        title: LOADER_TITLE,
        model_id: snapshot.model_id.clone(),
        status,
        detail,
        percent: progress.percent.min(100),
        cancel_prompt,
        hint,
    }
}

fn project_chat(snapshot: &StateSnapshot, ui: &UiState, icons: Option<&IconSet>) -> ChatView {
    let generating = snapshot.state.is_generating;
    let model_status = match icons {
        Some(icons) if generating => format!("{} {}", icons.status_busy, snapshot.model_status),
        Some(icons) => format!("{} {}", icons.status_idle, snapshot.model_status),
        None => snapshot.model_status.to_string(),
    };

    let messages: Vec<MessageView> = snapshot
        .messages()
        .iter()
        .filter(|message| message.role != Role::System)
        .map(|message| project_message(message, icons))
        .collect();

    let welcome = messages.is_empty().then(|| WelcomeView {
        heading: match icons {
            Some(icons) => format!("{} Hallo! Wie kann ich dir helfen?", icons.welcome),
            None => "Hallo! Wie kann ich dir helfen?".to_string(),
        },
        text: "Stell mir eine Frage oder bitte mich um Hilfe bei einer Aufgabe.",
    });

    let help = ui.help_visible.then(help_entries);

    ChatView {
        model_status,
        model_busy: generating,
        model_id: snapshot.model_id.clone(),
        messages,
        welcome,
        typing_indicator: generating,
        input: ui.input.clone(),
        can_send: can_send(&ui.input, generating),
        status: ui.status.clone(),
        help,
        scroll_offset: ui.scroll_offset,
    }
}

fn project_message(message: &Message, icons: Option<&IconSet>) -> MessageView {
    let label = if message.role.is_user() {
        "Du"
    } else {
        APP_TITLE
    };
    let author = match icons {
        Some(icons) if message.role.is_user() => format!("{} {label}", icons.user),
        Some(icons) => format!("{} {label}", icons.assistant),
        None => label.to_string(),
    };
    MessageView {
        role: message.role,
        author,
        content: message.content.clone(),
        time: message
            .timestamp
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string(),
    }
}

/// Sending is offered only for non-blank input while no reply is pending.
pub fn can_send(input: &str, generating: bool) -> bool {
    !generating && !input.trim().is_empty()
}

fn help_entries() -> Vec<(String, &'static str)> {
    let mut entries: Vec<(String, &'static str)> = all_commands()
        .iter()
        .map(|command| (format!("/{}", command.name), command.help))
        .collect();
    entries.extend([
        ("Enter".to_string(), "Nachricht senden"),
        ("↑/↓, PgUp/PgDn".to_string(), "Verlauf scrollen"),
        ("Ctrl+L".to_string(), "Alle Chats löschen"),
        ("Ctrl+C".to_string(), "Beenden"),
    ]);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::{apply_action, AppAction, AppCommand};
    use crate::core::provision::ProgressEvent;
    use crate::utils::test_utils::{create_test_app, ScriptedCapability};
    use std::sync::Arc;

    fn loader(view: View) -> LoaderView {
        match view {
            View::Loader(loader) => loader,
            other => panic!("expected loader view, got {other:?}"),
        }
    }

    fn chat(view: View) -> ChatView {
        match view {
            View::Chat(chat) => chat,
            other => panic!("expected chat view, got {other:?}"),
        }
    }

    fn loading_app() -> (crate::core::app::App, u64) {
        let mut app = create_test_app();
        match apply_action(&mut app, AppAction::ConfirmOnboarding) {
            Some(AppCommand::Provision { load_id, .. }) => (app, load_id),
            _ => panic!("expected provision command"),
        }
    }

    fn view_of(app: &crate::core::app::App) -> View {
        project(&app.get_state(), &app.ui, None)
    }

    #[test]
    fn fresh_state_projects_onboarding() {
        let app = create_test_app();
        assert!(matches!(view_of(&app), View::Onboarding(_)));
    }

    #[test]
    fn loader_starts_with_initial_texts() {
        let (app, _) = loading_app();
        let view = loader(view_of(&app));
        assert_eq!(view.status, "Lade Modell...");
        assert_eq!(view.detail, "Initialisiere...");
        assert_eq!(view.percent, 0);
        assert_eq!(view.cancel_prompt, None);
    }

    #[test]
    fn loader_follows_progress_phases() {
        let (mut app, load_id) = loading_app();
        let mut step = |event: ProgressEvent| {
            apply_action(&mut app, AppAction::ProvisionProgress { load_id, event });
        };
        step(ProgressEvent::initiate("model.onnx"));
        step(ProgressEvent::download("model.onnx"));
        step(ProgressEvent::progress(37.4, Some("model.onnx".into())));

        let view = loader(view_of(&app));
        assert_eq!(view.status, "Lade herunter...");
        assert_eq!(view.detail, "model.onnx");
        assert_eq!(view.percent, 37);

        apply_action(
            &mut app,
            AppAction::ProvisionProgress {
                load_id,
                event: ProgressEvent::done("model.onnx"),
            },
        );
        assert_eq!(loader(view_of(&app)).detail, "✓ model.onnx");
    }

    #[test]
    fn loader_reports_ready_failure_and_cancel() {
        let (mut app, load_id) = loading_app();
        apply_action(
            &mut app,
            AppAction::ProvisionReady {
                load_id,
                capability: Arc::new(ScriptedCapability::new()),
            },
        );
        let view = loader(view_of(&app));
        assert_eq!(
            (view.status.as_str(), view.detail.as_str()),
            ("Fertig!", "Modell bereit")
        );
        assert_eq!(view.percent, 100);

        let (mut app, load_id) = loading_app();
        apply_action(
            &mut app,
            AppAction::ProvisionFailed {
                load_id,
                message: "Runtime nicht erreichbar".into(),
            },
        );
        let view = loader(view_of(&app));
        assert_eq!(view.status, "Fehler!");
        assert_eq!(view.detail, "Runtime nicht erreichbar");
        assert!(view.hint.contains("Erneut versuchen"));

        let (mut app, _) = loading_app();
        apply_action(&mut app, AppAction::RequestCancelLoading);
        assert_eq!(
            loader(view_of(&app)).cancel_prompt,
            Some("Download abbrechen? (j/n)")
        );
        apply_action(&mut app, AppAction::RequestCancelLoading);
        assert_eq!(loader(view_of(&app)).status, "Abgebrochen");
    }

    fn chatting_app() -> crate::core::app::App {
        let (mut app, load_id) = loading_app();
        apply_action(
            &mut app,
            AppAction::ProvisionReady {
                load_id,
                capability: Arc::new(ScriptedCapability::new()),
            },
        );
        apply_action(&mut app, AppAction::EnterChat { load_id });
        app
    }

    #[test]
    fn empty_chat_shows_welcome() {
        let app = chatting_app();
        let view = chat(view_of(&app));
        assert!(view.welcome.is_some());
        assert!(view.messages.is_empty());
        assert_eq!(view.model_status, "Bereit");
        assert!(!view.can_send);
    }

    #[test]
    fn typing_indicator_tracks_generation() {
        let mut app = chatting_app();
        apply_action(
            &mut app,
            AppAction::SubmitMessage {
                message: "Hallo".into(),
            },
        );

        let view = chat(view_of(&app));
        assert!(view.typing_indicator);
        assert!(view.welcome.is_none());
        assert_eq!(view.model_status, "Generiert...");
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].author, "Du");
        assert_eq!(view.messages[0].time.len(), 5);
    }

    #[test]
    fn icons_decorate_authors_and_status() {
        let mut app = chatting_app();
        app.conversation().append(Role::Assistant, "Hallo!");
        let icons = IconSet::unicode();
        let view = chat(project(&app.get_state(), &app.ui, Some(&icons)));
        assert_eq!(view.messages[0].author, "◆ NeoAI");
        assert_eq!(view.model_status, "● Bereit");
    }

    #[test]
    fn send_requires_text_and_idle_model() {
        assert!(can_send("Hallo", false));
        assert!(!can_send("   ", false));
        assert!(!can_send("Hallo", true));
    }

    #[test]
    fn help_lists_slash_commands() {
        let mut app = chatting_app();
        app.ui.help_visible = true;
        let help = chat(view_of(&app)).help.expect("help entries");
        assert!(help.iter().any(|(key, _)| key == "/clear-cache"));
    }
}
