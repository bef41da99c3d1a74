pub mod anthropic;
pub mod canned;
pub mod error;
pub mod json;
#[cfg(test)]
pub mod scripted;

use crate::config::Settings;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Canned,
    #[cfg(test)]
    Scripted,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Canned => "canned",
            #[cfg(test)]
            Provider::Scripted => "scripted",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The external reasoning capability: a system/user prompt pair in, a JSON
/// document out. Stages decide whether the document is acceptable.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> anyhow::Result<serde_json::Value>;
}

/// Pick the client named by `DAYBRIEF_LLM_PROVIDER` (see [`Settings`]).
pub fn client_from_settings(settings: &Settings) -> anyhow::Result<Box<dyn LlmClient>> {
    match settings.llm_provider()? {
        Provider::Anthropic => Ok(Box::new(anthropic::AnthropicClient::from_settings(settings)?)),
        Provider::Canned => Ok(Box::new(canned::CannedClient)),
        #[cfg(test)]
        Provider::Scripted => anyhow::bail!("the scripted client cannot be selected from settings"),
    }
}
