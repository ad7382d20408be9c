//! Application state shared by the lifecycle controller and the view.

use serde::{Deserialize, Serialize};

use crate::core::message::Message;

/// The visible screen. The lifecycle controller's states map 1:1 onto it:
/// onboarding, model loading, and chatting on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    Onboarding,
    ModelLoader,
    Home,
}

impl Screen {
    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Onboarding => "onboarding",
            Screen::ModelLoader => "model-loader",
            Screen::Home => "home",
        }
    }
}

impl TryFrom<&str> for Screen {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "onboarding" => Ok(Screen::Onboarding),
            "model-loader" => Ok(Screen::ModelLoader),
            "home" => Ok(Screen::Home),
            _ => Err(format!("unknown screen: {value}")),
        }
    }
}

/// The subset of [`ApplicationState`] that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub onboarding_complete: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationState {
    pub onboarding_complete: bool,
    pub model_loaded: bool,
    pub model_loading: bool,
    pub messages: Vec<Message>,
    pub is_generating: bool,
    pub current_screen: Screen,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self {
            onboarding_complete: false,
            model_loaded: false,
            model_loading: false,
            messages: Vec::new(),
            is_generating: false,
            current_screen: Screen::Onboarding,
        }
    }
}

impl ApplicationState {
    /// Readiness flags always start cleared: the model capability never
    /// outlives the process, so it has to be provisioned again every session.
    pub fn from_persisted(persisted: PersistedState) -> Self {
        Self {
            onboarding_complete: persisted.onboarding_complete,
            messages: persisted.messages,
            ..Self::default()
        }
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            onboarding_complete: self.onboarding_complete,
            messages: self.messages.clone(),
        }
    }

    /// Whether the state may be shown on `screen` without breaking the
    /// readiness invariants.
    pub fn permits(&self, screen: Screen) -> bool {
        match screen {
            Screen::Onboarding => true,
            Screen::ModelLoader => self.onboarding_complete,
            Screen::Home => self.onboarding_complete && self.model_loaded,
        }
    }
}

/// Picks the screen to open at process start.
pub fn startup_screen(onboarding_complete: bool, model_loaded: bool) -> Screen {
    if !onboarding_complete {
        Screen::Onboarding
    } else if !model_loaded {
        Screen::ModelLoader
    } else {
        Screen::Home
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;

    #[test]
    fn startup_routing_covers_every_flag_combination() {
        assert_eq!(startup_screen(false, false), Screen::Onboarding);
        assert_eq!(startup_screen(false, true), Screen::Onboarding);
        assert_eq!(startup_screen(true, false), Screen::ModelLoader);
        assert_eq!(startup_screen(true, true), Screen::Home);
    }

    #[test]
    fn persisted_state_uses_camel_case_keys() {
        let state = PersistedState {
            onboarding_complete: true,
            messages: vec![Message::new(Role::User, "Hallo")],
        };
        let json = serde_json::to_value(&state).expect("serializes");
        assert_eq!(json["onboardingComplete"], true);
        assert_eq!(json["messages"][0]["content"], "Hallo");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: PersistedState = serde_json::from_str("{}").expect("parses");
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn restored_state_never_claims_a_loaded_model() {
        let state = ApplicationState::from_persisted(PersistedState {
            onboarding_complete: true,
            messages: Vec::new(),
        });
        assert!(state.onboarding_complete);
        assert!(!state.model_loaded);
        assert!(!state.model_loading);
        assert!(!state.is_generating);
    }

    #[test]
    fn home_requires_onboarding_and_a_loaded_model() {
        let mut state = ApplicationState::default();
        assert!(state.permits(Screen::Onboarding));
        assert!(!state.permits(Screen::ModelLoader));
        assert!(!state.permits(Screen::Home));

        state.onboarding_complete = true;
        assert!(state.permits(Screen::ModelLoader));
        assert!(!state.permits(Screen::Home));

        state.model_loaded = true;
        assert!(state.permits(Screen::Home));
    }
}
