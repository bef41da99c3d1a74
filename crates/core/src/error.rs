use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of a stage rejected the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Input,
    Output,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Input => f.write_str("input"),
            SchemaKind::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} schema validation failed at `{field_path}`: {rule}")]
pub struct SchemaValidationError {
    pub kind: SchemaKind,
    /// Dotted/indexed path, e.g. `observations[2].text`. `.` is the document root.
    pub field_path: String,
    pub rule: String,
}

impl SchemaValidationError {
    pub fn new(kind: SchemaKind, field_path: impl Into<String>, rule: impl Into<String>) -> Self {
        let field_path = field_path.into();
        Self {
            kind,
            field_path: if field_path.is_empty() {
                ".".to_string()
            } else {
                field_path
            },
            rule: rule.into(),
        }
    }

    pub fn input(field_path: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::new(SchemaKind::Input, field_path, rule)
    }

    pub fn output(field_path: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::new(SchemaKind::Output, field_path, rule)
    }
}

#[derive(Debug, Clone, Error)]
#[error("upstream response rejected (stage={stage}): {detail}")]
pub struct UpstreamResponseError {
    pub stage: &'static str,
    pub detail: String,
}

#[derive(Debug, Error)]
#[error("persistence failed (operation={operation}, path={})", path.display())]
pub struct PersistenceError {
    pub operation: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: anyhow::Error,
}

impl PersistenceError {
    pub fn new(operation: &'static str, path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            operation,
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Everything that can abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamResponseError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_path_renders_as_root() {
        let err = SchemaValidationError::output("", "expected an object");
        assert_eq!(err.field_path, ".");
        assert_eq!(
            err.to_string(),
            "output schema validation failed at `.`: expected an object"
        );
    }

    #[test]
    fn pipeline_error_is_transparent() {
        let err: PipelineError = UpstreamResponseError {
            stage: "review",
            detail: "response must be a JSON object".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "upstream response rejected (stage=review): response must be a JSON object"
        );
    }
}
