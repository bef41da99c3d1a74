use crate::domain::contract::{field, Validate, Violation};
use crate::domain::{DecisionAction, FullSnapshot, Signals};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub signals: Signals,
    pub full_snapshot: FullSnapshot,
}

impl Validate for RecommendationInput {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        self.signals.validate(&field(path, "signals"))?;
        self.full_snapshot.validate(&field(path, "full_snapshot"))?;
        Ok(())
    }
}

/// Turns observations into at most three prioritized actions.
pub struct RecommendationStage;

impl Stage for RecommendationStage {
    const NAME: &'static str = "recommendation";
    const ROLE_LINE: &'static str = "You are the Decision Agent.";
    const INSTRUCTIONS: &'static str = r#"
Turn the analyst's observations into a short list of prioritized, concrete
actions for the owner. Recommendations are made once a day.

Rules:
- Propose at most 3 actions.
- Every action must cite at least one observation by its observation_id.
- Actions must be specific and doable within days, not months.
- No vague advice ("optimize", "improve", "consider").
- When uncertainty is high, prefer actions that are easy to undo.

Input:
- The analyst observations ("signals")
- The full business context: configuration, industry profile, today's metrics ("full_snapshot")

Output:
Return a JSON object with exactly this structure:

{
  "actions": [
    {
      "action": "<clear, concrete action>",
      "rationale": "<why this follows from the observations>",
      "priority": 1,
      "source_observation_ids": [1, 3],
      "uncertainty": "low | medium | high"
    }
  ]
}

Guidelines:
- Priority 1 means highest impact or urgency.
- If nothing is worth doing today, return an empty "actions" list.
"#;

    type Input = RecommendationInput;
    type Output = DecisionAction;
}
