use crate::domain::contract::{Validate, Violation};
use crate::domain::level::Level;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerActionReview {
    /// Verbatim action text from the recommendation stage; the merge joins on it.
    pub action: String,
    pub confidence: Level,
    pub assumptions: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerOutput {
    pub reviews: Vec<ReviewerActionReview>,
}

// Action text is not checked here: a review that matches no action, blank
// included, still becomes a brief item with an empty rationale.
impl Validate for ReviewerOutput {
    fn validate(&self, _path: &str) -> Result<(), Violation> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::parse;
    use crate::error::SchemaKind;
    use serde_json::json;

    #[test]
    fn parses_reviews() {
        let r: ReviewerOutput = parse(
            json!({"reviews": [{
                "action": "A", "confidence": "high", "assumptions": "demand holds", "notes": "N"
            }]}),
            SchemaKind::Output,
        )
        .unwrap();
        assert_eq!(r.reviews[0].confidence, Level::High);
    }

    #[test]
    fn blank_action_is_accepted() {
        let r: ReviewerOutput = parse(
            json!({"reviews": [{
                "action": "", "confidence": "low", "assumptions": "", "notes": "unclear proposal"
            }]}),
            SchemaKind::Output,
        )
        .unwrap();
        assert_eq!(r.reviews[0].action, "");
    }

    #[test]
    fn confidence_outside_scale_is_rejected() {
        let err = parse::<ReviewerOutput>(
            json!({"reviews": [{
                "action": "A", "confidence": "certain", "assumptions": "", "notes": ""
            }]}),
            SchemaKind::Output,
        )
        .unwrap_err();
        assert_eq!(err.kind, SchemaKind::Output);
        assert_eq!(err.field_path, "reviews[0].confidence");
    }

    #[test]
    fn notes_are_required() {
        let err = parse::<ReviewerOutput>(
            json!({"reviews": [{"action": "A", "confidence": "low", "assumptions": ""}]}),
            SchemaKind::Output,
        )
        .unwrap_err();
        assert!(err.rule.contains("missing field `notes`"));
    }
}
