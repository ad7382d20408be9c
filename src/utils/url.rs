//! Addresses of the local model runtime.

use std::fmt;

/// The runtime calls NeoAI makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Pull,
    Delete,
    Chat,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Pull => "api/pull",
            Endpoint::Delete => "api/delete",
            Endpoint::Chat => "api/chat",
        }
    }
}

/// Root of the runtime's HTTP API, stored without trailing slashes.
///
/// ```
/// use neoai::utils::url::{Endpoint, RuntimeUrl};
///
/// let root = RuntimeUrl::new("http://localhost:11434/");
/// assert_eq!(root.endpoint(Endpoint::Pull), "http://localhost:11434/api/pull");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeUrl {
    root: String,
}

impl RuntimeUrl {
    pub fn new(raw: &str) -> Self {
        Self {
            root: raw.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> String {
        let mut url = String::with_capacity(self.root.len() + 1 + endpoint.path().len());
        url.push_str(&self.root);
        url.push('/');
        url.push_str(endpoint.path());
        url
    }
}

impl fmt::Display for RuntimeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_and_whitespace_are_dropped() {
        let root = RuntimeUrl::new(" http://127.0.0.1:11434// ");
        assert_eq!(root.to_string(), "http://127.0.0.1:11434");
        assert_eq!(root.endpoint(Endpoint::Chat), "http://127.0.0.1:11434/api/chat");
    }

    #[test]
    fn gateway_prefix_is_kept() {
        let root = RuntimeUrl::new("https://gateway.local/ollama/");
        assert_eq!(root.endpoint(Endpoint::Delete), "https://gateway.local/ollama/api/delete");
    }
}
