use crate::error::{SchemaKind, SchemaValidationError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A domain rule broken somewhere inside a document. The schema side
/// (input/output) is attached by whoever is doing the parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field_path: String,
    pub rule: String,
}

impl Violation {
    pub fn new(field_path: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            rule: rule.into(),
        }
    }

    pub fn into_error(self, kind: SchemaKind) -> SchemaValidationError {
        SchemaValidationError::new(kind, self.field_path, self.rule)
    }
}

/// Rules that serde alone cannot express (ranges, uniqueness, non-empty text).
///
/// `path` is the location of `self` in the enclosing document; the root is `""`.
pub trait Validate {
    fn validate(&self, path: &str) -> Result<(), Violation>;
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        match self {
            Some(inner) => inner.validate(path),
            None => Ok(()),
        }
    }
}

/// Convert an untyped JSON document into `T`, then check its domain rules.
pub fn parse<T>(value: Value, kind: SchemaKind) -> Result<T, SchemaValidationError>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        SchemaValidationError::new(kind, path, err.into_inner().to_string())
    })?;
    check(&parsed, kind)?;
    Ok(parsed)
}

/// Domain-rule check for an already typed value.
pub fn check<T: Validate>(value: &T, kind: SchemaKind) -> Result<(), SchemaValidationError> {
    value.validate("").map_err(|v| v.into_error(kind))
}

pub(crate) fn field(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

pub(crate) fn index(path: &str, idx: usize) -> String {
    format!("{path}[{idx}]")
}

pub(crate) fn non_empty(text: &str, path: String) -> Result<(), Violation> {
    if text.trim().is_empty() {
        return Err(Violation::new(path, "must be non-empty"));
    }
    Ok(())
}

pub(crate) fn non_negative(n: f64, path: String) -> Result<(), Violation> {
    if !n.is_finite() {
        return Err(Violation::new(path, format!("must be a finite number (got {n})")));
    }
    if n < 0.0 {
        return Err(Violation::new(path, format!("must be non-negative (got {n})")));
    }
    Ok(())
}

/// `null` and a missing key both mean "use the default".
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
