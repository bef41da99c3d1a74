use crate::domain::contract::{field, index, non_empty, Validate, Violation};
use crate::domain::level::Level;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The observation stage is instructed to stay at or under this many findings.
pub const MAX_OBSERVATIONS: usize = 5;

/// One atomic finding about the day's numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystObservation {
    pub observation_id: u32,
    pub text: String,
    #[serde(default)]
    pub metric: Option<String>,
    /// Day-over-day change, absolute or percent as the analyst reports it.
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default, deserialize_with = "crate::domain::contract::null_as_default")]
    pub signal_strength: Level,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub observations: Vec<AnalystObservation>,
}

impl Signals {
    pub fn ids(&self) -> BTreeSet<u32> {
        self.observations.iter().map(|o| o.observation_id).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl Validate for Signals {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        let list = field(path, "observations");
        let mut seen = BTreeSet::new();
        for (i, obs) in self.observations.iter().enumerate() {
            let at = index(&list, i);
            non_empty(&obs.text, field(&at, "text"))?;
            if let Some(change) = obs.change {
                if !change.is_finite() {
                    return Err(Violation::new(field(&at, "change"), "must be a finite number"));
                }
            }
            if !seen.insert(obs.observation_id) {
                return Err(Violation::new(
                    field(&at, "observation_id"),
                    format!("duplicate observation_id {}", obs.observation_id),
                ));
            }
        }
        Ok(())
    }
}
