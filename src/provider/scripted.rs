//! In-process provider that replays canned replies.
//!
//! Used by the test suite in place of a real model endpoint. Every request
//! is recorded so assertions can inspect the exact prompts a component sent.

use super::{GenerateOptions, GenerateResponse, LlmProvider, Message, ProviderError, Result};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// A recorded `generate` call
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub options: Option<GenerateOptions>,
}

#[derive(Clone, Default)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    fallback: Option<String>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Arc::new(Mutex::new(
                replies.into_iter().map(|r| Reply::Text(r.into())).collect(),
            )),
            ..Default::default()
        }
    }

    /// Reply returned once the script is exhausted
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Queue a failing call after the replies already scripted
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Reply::Fail(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_reply(&self) -> Result<String> {
        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(msg)) => Err(ProviderError::RequestFailed(msg)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ProviderError::Other("scripted provider exhausted".to_string())),
        }
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn generate(
        &self,
        messages: Vec<Message>,
        options: Option<GenerateOptions>,
    ) -> Pin<Box<dyn Future<Output = Result<GenerateResponse>> + Send + '_>> {
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(RecordedRequest { messages, options });

            let content = self.next_reply()?;
            Ok(GenerateResponse {
                content,
                usage: None,
                model: self.model().to_string(),
                finish_reason: Some("stop".to_string()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_fallback() {
        let provider = ScriptedProvider::new(["one", "two"]).with_fallback("done");

        let first = provider.generate(vec![Message::user("a")], None).await.unwrap();
        let second = provider.generate(vec![Message::user("b")], None).await.unwrap();
        let third = provider.generate(vec![Message::user("c")], None).await.unwrap();

        assert_eq!(first.content, "one");
        assert_eq!(second.content, "two");
        assert_eq!(third.content, "done");
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.requests()[1].messages[0].content, "b");
    }

    #[tokio::test]
    async fn test_exhausted_without_fallback_errors() {
        let provider = ScriptedProvider::new(Vec::<String>::new());
        assert!(provider.generate(vec![], None).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let provider = ScriptedProvider::new(["ok"]).then_fail("boom");
        assert!(provider.generate(vec![], None).await.is_ok());
        let err = provider.generate(vec![], None).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
