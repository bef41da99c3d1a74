use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_REPAIR_ATTEMPTS: u32 = 2;

const TOOL_NAME_EMIT_RESPONSE: &str = "emit_response";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    repair_attempts: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let repair_attempts = std::env::var("ANTHROPIC_REPAIR_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_REPAIR_ATTEMPTS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
            repair_attempts,
        })
    }

    async fn create_message(
        &self,
        req: CreateMessageRequest,
    ) -> anyhow::Result<(Value, CreateMessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("failed to parse Anthropic response JSON: {text}"))?;
        let parsed = serde_json::from_value::<CreateMessageResponse>(raw_json.clone())
            .context("failed to decode Anthropic response into CreateMessageResponse")?;
        Ok((raw_json, parsed))
    }

    fn request(&self, system_prompt: &str, content: String, max_tokens: u32) -> CreateMessageRequest {
        CreateMessageRequest {
            model: self.model.clone(),
            max_tokens,
            system: Some(system_prompt.to_string()),
            messages: vec![Message {
                role: "user",
                content,
            }],
            tools: Some(Self::tools()),
            tool_choice: Some(Self::tool_choice()),
        }
    }

    fn tools() -> Vec<Tool> {
        // Each stage describes its own shape in the system prompt; the tool only
        // forces a single JSON object back.
        let schema = serde_json::json!({
            "type": "object",
            "additionalProperties": true
        });

        vec![Tool {
            name: TOOL_NAME_EMIT_RESPONSE,
            description: "Emit the response as the JSON object described in the system prompt",
            input_schema: schema,
        }]
    }

    fn tool_choice() -> ToolChoice {
        ToolChoice::Tool {
            name: TOOL_NAME_EMIT_RESPONSE,
        }
    }

    fn repair_prompt(user_prompt: &str, previous_output: &str) -> String {
        format!(
            "The reply below could not be read as a JSON object.\n\n\
Reply again with exactly one JSON object shaped as the system prompt describes: \
no prose, no code fences, no comments, no trailing commas.\n\n\
Stage input:\n{user_prompt}\n\n\
Unreadable reply:\n{previous_output}"
        )
    }

    /// Text blocks joined by newlines; tool and thinking blocks are skipped.
    fn response_text(res: &CreateMessageResponse) -> String {
        res.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn response_tool_input(res: &CreateMessageResponse) -> Option<Value> {
        res.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } if name == TOOL_NAME_EMIT_RESPONSE => {
                Some(input.clone())
            }
            _ => None,
        })
    }

    async fn try_parse_with_repairs(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        initial_text: String,
        initial_raw_json: Value,
    ) -> anyhow::Result<Value> {
        let first_err = match json::parse_document(&initial_text) {
            Ok(doc) => return Ok(doc),
            Err(err) => err,
        };

        let mut last_err = first_err;
        let mut last_text = initial_text;
        let mut last_raw_json = initial_raw_json;

        for attempt in 1..=self.repair_attempts {
            let repair_req = self.request(
                system_prompt,
                Self::repair_prompt(user_prompt, &last_text),
                self.max_tokens,
            );

            let (repair_raw_json, repair_res) = self.create_message(repair_req).await?;
            if let Some(input) = Self::response_tool_input(&repair_res) {
                return Ok(input);
            }
            let repair_text = Self::response_text(&repair_res);
            match json::parse_document(&repair_text) {
                Ok(doc) => return Ok(doc),
                Err(err) => {
                    last_err = err;
                    last_text = repair_text;
                    last_raw_json = repair_raw_json;
                    tracing::warn!(attempt, error = %last_err, "reply still unreadable after repair");
                }
            }
        }

        Err(LlmDiagnosticsError {
            provider: Provider::Anthropic,
            stage: "parse_after_repair",
            detail: format!("final_error={last_err}"),
            raw_output: Some(last_text),
            raw_response_json: Some(last_raw_json),
        }
        .into())
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<Value> {
        let (mut raw_json, mut res) = self
            .create_message(self.request(system_prompt, user_prompt.to_string(), self.max_tokens))
            .await?;

        // Truncated replies get one more try with a larger budget.
        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            let bumped = self.max_tokens.saturating_mul(2).max(4096);
            tracing::warn!(
                from = self.max_tokens,
                to = bumped,
                "Anthropic stop_reason=max_tokens; retrying once with higher max_tokens"
            );
            let (rj, r) = self
                .create_message(self.request(system_prompt, user_prompt.to_string(), bumped))
                .await?;
            raw_json = rj;
            res = r;
        }

        if let Some(input) = Self::response_tool_input(&res) {
            return Ok(input);
        }

        // Forced tool choice makes this rare.
        let text = Self::response_text(&res);
        self.try_parse_with_repairs(system_prompt, user_prompt, text, raw_json)
            .await
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: &'static str },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },

    // thinking, redacted_thinking, server tools
    #[serde(other)]
    Other,
}
