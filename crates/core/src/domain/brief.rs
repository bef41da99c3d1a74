use crate::domain::level::Level;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDecisionBriefItem {
    pub action: String,
    /// Empty when the review named an action the recommendation stage never proposed.
    pub rationale: String,
    pub confidence: Level,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Terminal artifact of one run. Written once per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDecisionBrief {
    pub date: NaiveDate,
    pub items: Vec<DailyDecisionBriefItem>,
}
