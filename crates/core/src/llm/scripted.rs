use crate::llm::{LlmClient, Provider};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Replays queued replies in order and records every prompt pair it was given.
/// Running out of replies is an upstream failure.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<Value, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Value>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a transport failure.
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.replies).push_back(Err(message.into()));
    }

    pub fn push(&self, reply: Value) {
        lock(&self.replies).push_back(Ok(reply));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider(&self) -> Provider {
        Provider::Scripted
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<Value> {
        lock(&self.calls).push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
        });

        match lock(&self.replies).pop_front() {
            Some(Ok(v)) => Ok(v),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => anyhow::bail!("scripted client has no reply left"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_in_order_and_records_calls() {
        let client = ScriptedClient::new([json!({"a": 1})]);
        client.push_error("boom");

        assert_eq!(client.generate("s1", "u1").await.unwrap(), json!({"a": 1}));
        assert_eq!(client.generate("s2", "u2").await.unwrap_err().to_string(), "boom");
        assert!(client.generate("s3", "u3").await.is_err());

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].user_prompt, "u2");
        assert_eq!(client.remaining(), 0);
    }
}
