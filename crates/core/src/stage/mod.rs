//! validate input -> render prompt -> delegate -> validate output.
//!
//! Every stage is the same four steps; a [`Stage`] impl only supplies its
//! types and instruction text. No step retries: the first failure ends the
//! call and is handed back to the caller.

pub mod observation;
pub mod recommendation;
pub mod review;

use crate::domain::contract::{self, Validate};
use crate::error::{PipelineError, SchemaKind, SchemaValidationError, UpstreamResponseError};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::LlmClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Prepended to every stage's instructions.
pub const SHARED_SYSTEM_CONTEXT: &str = "\
You support the owner of a small business in deciding what to do next, based on
the business's daily metrics.

You do not replace the owner's judgment. You reduce their workload by surfacing
clear, actionable points together with how confident you are, what could go
wrong, and which data each point comes from.

Always:
- Work only from the validated, structured input you are given
- Stay within what the data shows
- Prefer simple, practical steps over abstract advice
- Say so when you are uncertain
- Keep every recommendation traceable to the observations behind it";

pub trait Stage {
    /// Short name used in logs and errors.
    const NAME: &'static str;
    /// First line of the instructions; identifies the stage to the model.
    const ROLE_LINE: &'static str;
    const INSTRUCTIONS: &'static str;

    type Input: Serialize + DeserializeOwned + Validate + Send + Sync;
    type Output: DeserializeOwned + Validate + Send;

    fn instructions() -> String {
        format!("{}\n\n{}", Self::ROLE_LINE, Self::INSTRUCTIONS.trim())
    }
}

/// Either an already typed record or a raw document to be converted.
#[derive(Debug, Clone)]
pub enum StageInput<T> {
    Typed(T),
    Untyped(Value),
}

impl<T> From<T> for StageInput<T> {
    fn from(value: T) -> Self {
        StageInput::Typed(value)
    }
}

pub struct StageRunner<'a> {
    client: &'a dyn LlmClient,
    system_context: &'a str,
}

impl<'a> StageRunner<'a> {
    pub fn new(client: &'a dyn LlmClient, system_context: &'a str) -> Self {
        Self {
            client,
            system_context,
        }
    }

    pub fn system_prompt<S: Stage>(&self) -> String {
        build_system_prompt(self.system_context, &S::instructions())
    }

    pub async fn execute<S: Stage>(
        &self,
        raw: StageInput<S::Input>,
    ) -> Result<S::Output, PipelineError> {
        let input = validate_input::<S>(raw)?;

        let system_prompt = self.system_prompt::<S>();
        let user_prompt = build_user_prompt(&input)?;
        tracing::debug!(
            stage = S::NAME,
            provider = %self.client.provider(),
            system_len = system_prompt.len(),
            user_len = user_prompt.len(),
            "calling reasoning capability"
        );

        let response = self
            .client
            .generate(&system_prompt, &user_prompt)
            .await
            .map_err(|err| {
                if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
                    tracing::warn!(
                        stage = S::NAME,
                        provider = %diag.provider,
                        raw_output = diag.raw_output.as_deref().unwrap_or(""),
                        "reasoning capability returned unusable output"
                    );
                }
                UpstreamResponseError {
                    stage: S::NAME,
                    detail: format!("{err:#}"),
                }
            })?;

        validate_output::<S>(response)
    }
}

pub fn build_system_prompt(system_context: &str, instructions: &str) -> String {
    format!("{}\n\n{}", system_context.trim(), instructions.trim())
        .trim()
        .to_string()
}

/// Pretty JSON in declaration order; maps are ordered, so equal inputs give
/// byte-identical prompts.
pub fn build_user_prompt<T: Serialize>(input: &T) -> Result<String, SchemaValidationError> {
    serde_json::to_string_pretty(input)
        .map_err(|err| SchemaValidationError::input("", format!("not serializable: {err}")))
}

pub fn validate_input<S: Stage>(raw: StageInput<S::Input>) -> Result<S::Input, SchemaValidationError> {
    match raw {
        StageInput::Typed(input) => {
            contract::check(&input, SchemaKind::Input)?;
            Ok(input)
        }
        StageInput::Untyped(value) => contract::parse(value, SchemaKind::Input),
    }
}

pub fn validate_output<S: Stage>(response: Value) -> Result<S::Output, PipelineError> {
    if !response.is_object() {
        return Err(UpstreamResponseError {
            stage: S::NAME,
            detail: format!("response must be a JSON object (got {})", json_type(&response)),
        }
        .into());
    }
    Ok(contract::parse(response, SchemaKind::Output)?)
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
