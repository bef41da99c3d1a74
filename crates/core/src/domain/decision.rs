use crate::domain::contract::{field, index, non_empty, Validate, Violation};
use crate::domain::level::Level;
use serde::{Deserialize, Serialize};

/// The recommendation stage is instructed to stay at or under this many actions.
pub const MAX_ACTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionActionItem {
    pub action: String,
    pub rationale: String,
    /// 1 = highest impact/urgency.
    pub priority: u32,
    /// Must name observations from the same run's signals. Checked by the
    /// pipeline, not here.
    pub source_observation_ids: Vec<u32>,
    #[serde(default)]
    pub uncertainty: Option<Level>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionAction {
    pub actions: Vec<DecisionActionItem>,
}

impl DecisionAction {
    /// First action whose text matches exactly (case-sensitive).
    pub fn find(&self, action: &str) -> Option<&DecisionActionItem> {
        self.actions.iter().find(|a| a.action == action)
    }
}

impl Validate for DecisionAction {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        let list = field(path, "actions");
        for (i, item) in self.actions.iter().enumerate() {
            let at = index(&list, i);
            non_empty(&item.action, field(&at, "action"))?;
            if item.priority < 1 {
                return Err(Violation::new(field(&at, "priority"), "must be >= 1"));
            }
        }
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
    fn empty_action_list_is_valid() {
        let d: DecisionAction = parse(json!({"actions": []}), SchemaKind::Output).unwrap();
        assert!(d.actions.is_empty());
    }

    #[test]
    fn uncertainty_is_optional() {
        let d: DecisionAction = parse(
            json!({"actions": [{
                "action": "Bake 10 fewer baguettes on Monday",
                "rationale": "Leftovers grew three days in a row",
                "priority": 1,
                "source_observation_ids": [2]
            }]}),
            SchemaKind::Output,
        )
        .unwrap();
        assert_eq!(d.actions[0].uncertainty, None);
        assert_eq!(d.find("Bake 10 fewer baguettes on Monday").map(|a| a.priority), Some(1));
        assert!(d.find("bake 10 fewer baguettes on monday").is_none());
    }

    #[test]
    fn zero_priority_is_rejected() {
        let err = parse::<DecisionAction>(
            json!({"actions": [{
                "action": "a", "rationale": "r", "priority": 0, "source_observation_ids": []
            }]}),
            SchemaKind::Output,
        )
        .unwrap_err();
        assert_eq!(err.field_path, "actions[0].priority");
    }

    #[test]
    fn find_returns_first_match() {
        let item = |rationale: &str| DecisionActionItem {
            action: "A".to_string(),
            rationale: rationale.to_string(),
            priority: 1,
            source_observation_ids: vec![1],
            uncertainty: None,
        };
        let d = DecisionAction {
            actions: vec![item("first"), item("second")],
        };
        assert_eq!(d.find("A").map(|a| a.rationale.as_str()), Some("first"));
    }
}
