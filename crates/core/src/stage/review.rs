use crate::domain::contract::{field, Validate, Violation};
use crate::domain::{DecisionAction, FullSnapshot, ReviewerOutput};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub decision_action: DecisionAction,
    pub full_snapshot: FullSnapshot,
}

impl Validate for ReviewInput {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        self.decision_action
            .validate(&field(path, "decision_action"))?;
        self.full_snapshot.validate(&field(path, "full_snapshot"))?;
        Ok(())
    }
}

/// Attaches confidence, assumptions and caveats to each proposed action.
pub struct ReviewStage;

impl Stage for ReviewStage {
    const NAME: &'static str = "review";
    const ROLE_LINE: &'static str = "You are the Reviewer Agent.";
    const INSTRUCTIONS: &'static str = r#"
Review the actions proposed for the business and assess, for each one:
- how confident we can be in it
- the key assumption it rests on
- the risks or caveats the owner should know about

Rules:
- Do not add new actions.
- Do not reword actions: copy each "action" string exactly as given.
- Focus on uncertainty, assumptions, and where human judgment is needed.
- Be conservative when the data signals are weak or ambiguous.

Input:
- The proposed actions ("decision_action")
- The full business context, including metrics and observations ("full_snapshot")

Output:
Return a JSON object with exactly this structure:

{
  "reviews": [
    {
      "action": "<original action text, verbatim>",
      "confidence": "high | medium | low",
      "assumptions": "<key assumption behind this recommendation>",
      "notes": "<caveats or reasons for caution>"
    }
  ]
}

Guidelines:
- Confidence reflects how strong the data is, not how plausible the action sounds.
- If an action could have negative side effects, name them explicitly.
"#;

    type Input = ReviewInput;
    type Output = ReviewerOutput;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Level;
    use crate::llm::scripted::ScriptedClient;
    use crate::stage::{StageInput, StageRunner, SHARED_SYSTEM_CONTEXT};
    use serde_json::json;

    fn raw_input(action: &str) -> serde_json::Value {
        json!({
            "decision_action": {"actions": [{
                "action": action, "rationale": "R1", "priority": 1, "source_observation_ids": [1]
            }]},
            "full_snapshot": {
                "business_config": {
                    "name": "Demo", "hours": "08:00-20:00", "staffing": 5,
                    "capacity": 50, "operating_days": ["Mon"]
                },
                "industry_profile": {"industry_type": "bar", "tone": "friendly", "assumptions": {}},
                "metrics": {"date": "2024-01-01", "sales": 100, "traffic": 50, "inventory": {}},
                "signals": null
            }
        })
    }

    #[test]
    fn instructions_forbid_rewording() {
        assert!(ReviewStage::instructions().contains("Do not reword actions"));
    }

    #[tokio::test]
    async fn passes_reviews_through() {
        let client = ScriptedClient::new([json!({"reviews": [{
            "action": "A", "confidence": "medium", "assumptions": "steady demand", "notes": "N"
        }]})]);
        let runner = StageRunner::new(&client, SHARED_SYSTEM_CONTEXT);

        let out = runner
            .execute::<ReviewStage>(StageInput::Untyped(raw_input("A")))
            .await
            .unwrap();
        assert_eq!(out.reviews.len(), 1);
        assert_eq!(out.reviews[0].confidence, Level::Medium);
    }

    #[tokio::test]
    async fn blank_action_in_input_is_rejected() {
        let client = ScriptedClient::default();
        let runner = StageRunner::new(&client, SHARED_SYSTEM_CONTEXT);

        let err = runner
            .execute::<ReviewStage>(StageInput::Untyped(raw_input("  ")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("decision_action.actions[0].action"), "{err}");
    }
}
