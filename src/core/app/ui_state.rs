/// Transient notice shown in the chat status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNote {
    pub text: String,
    pub is_error: bool,
}

/// Presentation-only state owned by the controller: nothing here is
/// persisted or part of the application state proper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub input: String,
    pub status: Option<StatusNote>,
    /// Set by the first cancel request while a model is loading; the second
    /// request confirms.
    pub cancel_confirm_pending: bool,
    pub help_visible: bool,
    /// Lines scrolled up from the bottom of the chat log.
    pub scroll_offset: u16,
    pub exit_requested: bool,
}

impl UiState {
    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusNote {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusNote {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }
}
