use std::env;

/// Glyphs used to decorate the chat. When no set is available the view
/// falls back to plain text markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconSet {
    pub user: &'static str,
    pub assistant: &'static str,
    pub status_idle: &'static str,
    pub status_busy: &'static str,
    pub welcome: &'static str,
}

impl IconSet {
    pub fn unicode() -> Self {
        Self {
            user: "●",
            assistant: "◆",
            status_idle: "●",
            status_busy: "◌",
            welcome: "✦",
        }
    }

    /// Unicode glyphs when the locale advertises UTF-8.
    pub fn detect() -> Option<Self> {
        let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .find(|value| !value.is_empty())?;
        is_utf8_locale(&locale).then(Self::unicode)
    }
}

fn is_utf8_locale(locale: &str) -> bool {
    let lower = locale.to_ascii_lowercase();
    lower.contains("utf-8") || lower.contains("utf8")
}
