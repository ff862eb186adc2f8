use crate::provider::{Message, Role};

/// Conversation history for a stateful chat agent.
///
/// Resetting keeps a leading system message.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    messages: Vec<Message>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything except a leading system message.
    pub fn reset(&mut self) {
        let system = self
            .messages
            .first()
            .filter(|m| m.role == Role::System)
            .cloned();
        self.messages.clear();
        self.messages.extend(system);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_order() {
        let mut memory = Memory::new();
        assert!(memory.is_empty());
        memory.add(Message::system("rules"));
        memory.add(Message::user("a"));
        memory.add(Message::assistant("b"));

        let contents: Vec<_> = memory.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["rules", "a", "b"]);
    }

    #[test]
    fn test_reset_keeps_only_system() {
        let mut memory = Memory::new();
        memory.add(Message::system("rules"));
        memory.add(Message::user("hi"));
        memory.reset();
        assert_eq!(memory.messages(), &[Message::system("rules")]);
    }

    #[test]
    fn test_reset_without_system_empties() {
        let mut memory = Memory::new();
        memory.add(Message::user("hi"));
        memory.reset();
        assert!(memory.is_empty());
    }
}
