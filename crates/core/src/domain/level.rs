use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-step qualitative scale shared by signal strength, confidence and
/// uncertainty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[default]
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_lowercase_and_capitalized() {
        assert_eq!(serde_json::from_value::<Level>(json!("high")).unwrap(), Level::High);
        assert_eq!(serde_json::from_value::<Level>(json!("Low")).unwrap(), Level::Low);
        assert_eq!(serde_json::from_value::<Level>(json!("MEDIUM")).unwrap(), Level::Medium);
    }

    #[test]
    fn rejects_values_outside_scale() {
        assert!(serde_json::from_value::<Level>(json!("very high")).is_err());
        assert!(serde_json::from_value::<Level>(json!(3)).is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_value(Level::High).unwrap(), json!("high"));
    }
}
