use super::messages::ChatMessage;

/// Decides when a team run stops.
///
/// `check` is handed only the messages added since the previous call and
/// returns the stop reason once the condition is met.
pub trait TerminationCondition: Send {
    fn check(&mut self, new_messages: &[ChatMessage]) -> Option<String>;

    fn reset(&mut self);

    fn or<T>(self, other: T) -> OrTermination
    where
        Self: Sized + 'static,
        T: TerminationCondition + 'static,
    {
        OrTermination::new(Box::new(self), Box::new(other))
    }
}

/// Stops once the conversation holds `max` messages, the task included.
#[derive(Debug, Clone)]
pub struct MaxMessageTermination {
    max: usize,
    count: usize,
}

impl MaxMessageTermination {
    pub fn new(max: usize) -> Self {
        Self { max, count: 0 }
    }
}

impl TerminationCondition for MaxMessageTermination {
    fn check(&mut self, new_messages: &[ChatMessage]) -> Option<String> {
        self.count += new_messages.len();
        (self.count >= self.max).then(|| {
            format!(
                "Maximum number of messages {} reached, current message count: {}",
                self.max, self.count
            )
        })
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Stops when a message contains `text`, optionally only from given sources.
#[derive(Debug, Clone)]
pub struct TextMentionTermination {
    text: String,
    sources: Option<Vec<String>>,
}

impl TextMentionTermination {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
        }
    }

    pub fn from_sources(mut self, sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }
}

impl TerminationCondition for TextMentionTermination {
    fn check(&mut self, new_messages: &[ChatMessage]) -> Option<String> {
        new_messages
            .iter()
            .filter(|m| {
                self.sources
                    .as_ref()
                    .map_or(true, |sources| sources.iter().any(|s| s == &m.source))
            })
            .any(|m| m.content.contains(&self.text))
            .then(|| format!("Text '{}' mentioned", self.text))
    }

    fn reset(&mut self) {}
}

/// Either condition stops the run. Both see every delta.
pub struct OrTermination {
    left: Box<dyn TerminationCondition>,
    right: Box<dyn TerminationCondition>,
}

impl OrTermination {
    pub fn new(left: Box<dyn TerminationCondition>, right: Box<dyn TerminationCondition>) -> Self {
        Self { left, right }
    }
}

impl TerminationCondition for OrTermination {
    fn check(&mut self, new_messages: &[ChatMessage]) -> Option<String> {
        let left = self.left.check(new_messages);
        let right = self.right.check(new_messages);
        match (left, right) {
            (Some(l), Some(r)) => Some(format!("{}, {}", l, r)),
            (l, r) => l.or(r),
        }
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(source: &str, content: &str) -> ChatMessage {
        ChatMessage::new(source, content)
    }

    #[test]
    fn test_max_messages_counts_cumulatively() {
        let mut cond = MaxMessageTermination::new(3);
        assert_eq!(cond.check(&[msg("user", "task")]), None);
        assert_eq!(cond.check(&[msg("a", "1")]), None);
        assert_eq!(
            cond.check(&[msg("b", "2")]).as_deref(),
            Some("Maximum number of messages 3 reached, current message count: 3")
        );
        cond.reset();
        assert_eq!(cond.check(&[msg("a", "1")]), None);
    }

    #[test]
    fn test_text_mention() {
        let mut cond = TextMentionTermination::new("APPROVE");
        assert_eq!(cond.check(&[msg("a", "looks fine")]), None);
        assert_eq!(
            cond.check(&[msg("a", "APPROVE")]).as_deref(),
            Some("Text 'APPROVE' mentioned")
        );
    }

    #[test]
    fn test_text_mention_source_filter() {
        let mut cond = TextMentionTermination::new("DONE").from_sources(["Reviewer"]);
        assert_eq!(cond.check(&[msg("Writer", "DONE")]), None);
        assert!(cond.check(&[msg("Reviewer", "DONE")]).is_some());
    }

    #[test]
    fn test_or_composition() {
        let mut cond = MaxMessageTermination::new(10).or(TextMentionTermination::new("STOP"));
        assert_eq!(cond.check(&[msg("a", "go")]), None);
        assert_eq!(
            cond.check(&[msg("a", "STOP")]).as_deref(),
            Some("Text 'STOP' mentioned")
        );

        let mut both = MaxMessageTermination::new(1).or(TextMentionTermination::new("x"));
        assert_eq!(
            both.check(&[msg("a", "x")]).as_deref(),
            Some("Maximum number of messages 1 reached, current message count: 1, Text 'x' mentioned")
        );
    }
}
