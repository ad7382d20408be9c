use crate::api::ChatMessage;
use crate::core::message::{Message, Role};
use crate::core::persistence::{persist, StateStore};
use crate::core::state::ApplicationState;

/// Fixed instruction that opens every prompt.
pub const SYSTEM_PROMPT: &str =
    "Du bist NeoAI, ein hilfreicher und freundlicher KI-Assistent. Antworte präzise und auf Deutsch.";

/// Number of prior messages sent along with a new user turn.
pub const CONTEXT_WINDOW: usize = 6;

/// Returns the last `limit` messages in conversation order.
pub fn recent_context(messages: &[Message], limit: usize) -> &[Message] {
    &messages[messages.len().saturating_sub(limit)..]
}

/// System instruction, then the recent window, then the new user text.
pub fn build_prompt(messages: &[Message], user_text: &str) -> Vec<ChatMessage> {
    let window = recent_context(messages, CONTEXT_WINDOW);
    let mut prompt = Vec::with_capacity(window.len() + 2);
    prompt.push(ChatMessage::new(Role::System.as_str(), SYSTEM_PROMPT));
    prompt.extend(window.iter().map(Message::to_chat_message));
    prompt.push(ChatMessage::new(Role::User.as_str(), user_text));
    prompt
}

/// Append-only view over the message log that writes through to the store
/// after every change.
pub struct ConversationStore<'a> {
    state: &'a mut ApplicationState,
    store: &'a dyn StateStore,
}

impl<'a> ConversationStore<'a> {
    pub fn new(state: &'a mut ApplicationState, store: &'a dyn StateStore) -> Self {
        Self { state, store }
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) -> Message {
        let message = Message::new(role, content);
        self.state.messages.push(message.clone());
        persist(self.store, self.state);
        message
    }

    pub fn recent_context(&self, limit: usize) -> &[Message] {
        recent_context(&self.state.messages, limit)
    }

    pub fn build_prompt(&self, user_text: &str) -> Vec<ChatMessage> {
        build_prompt(&self.state.messages, user_text)
    }

    pub fn clear(&mut self) {
        self.state.messages.clear();
        persist(self.store, self.state);
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn len(&self) -> usize {
        self.state.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persistence::MemoryStateStore;

    fn contents(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn recent_context_returns_the_tail_in_order() {
        let store = MemoryStateStore::new();
        let mut state = ApplicationState::default();
        let mut conversation = ConversationStore::new(&mut state, &store);

        for total in 0..10usize {
            let window = conversation.recent_context(CONTEXT_WINDOW);
            assert_eq!(window.len(), total.min(CONTEXT_WINDOW));
            let expected: Vec<String> = (total.saturating_sub(CONTEXT_WINDOW)..total)
                .map(|i| format!("m{i}"))
                .collect();
            assert_eq!(contents(window), expected);

            let role = if total % 2 == 0 { Role::User } else { Role::Assistant };
            conversation.append(role, format!("m{total}"));
        }
    }

    #[test]
    fn append_persists_immediately() {
        let store = MemoryStateStore::new();
        let mut state = ApplicationState::default();
        state.onboarding_complete = true;

        let appended = ConversationStore::new(&mut state, &store).append(Role::User, "Hallo");
        assert!(appended.is_user());

        let saved = store.load().expect("saved");
        assert!(saved.onboarding_complete);
        assert_eq!(saved.messages, vec![appended]);
    }

    #[test]
    fn duplicate_content_is_kept() {
        let store = MemoryStateStore::new();
        let mut state = ApplicationState::default();
        let mut conversation = ConversationStore::new(&mut state, &store);
        conversation.append(Role::User, "ja");
        conversation.append(Role::User, "ja");
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn clear_empties_and_persists() {
        let store = MemoryStateStore::new();
        let mut state = ApplicationState::default();
        let mut conversation = ConversationStore::new(&mut state, &store);
        conversation.append(Role::User, "Hallo");
        conversation.clear();

        assert!(conversation.is_empty());
        assert!(store.load().expect("saved").messages.is_empty());
    }

    #[test]
    fn prompt_is_system_then_window_then_user() {
        let messages: Vec<Message> = (0..8)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                Message::new(role, format!("m{i}"))
            })
            .collect();

        let prompt = build_prompt(&messages, "neu");
        assert_eq!(prompt.len(), 1 + CONTEXT_WINDOW + 1);
        assert_eq!(prompt[0].role, "system");
        assert_eq!(prompt[0].content, SYSTEM_PROMPT);
        let window: Vec<&str> = prompt[1..=CONTEXT_WINDOW]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(window, vec!["m2", "m3", "m4", "m5", "m6", "m7"]);
        assert_eq!(prompt[1].role, "user");
        assert_eq!(prompt[2].role, "assistant");
        let last = prompt.last().expect("user turn");
        assert_eq!(last.role, "user");
        assert_eq!(last.content, "neu");
    }

    #[test]
    fn prompt_for_an_empty_log_has_two_entries() {
        let prompt = build_prompt(&[], "Hallo");
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[1].content, "Hallo");
    }
}
