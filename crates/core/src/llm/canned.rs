//! Offline client that answers every stage with a fixed, schema-conforming
//! document. Lets the whole pipeline run without network access.

use crate::llm::{LlmClient, Provider};
use crate::stage::{observation::ObservationStage, recommendation::RecommendationStage, review::ReviewStage, Stage};
use serde_json::{json, Value};

pub const CANNED_ACTION: &str = "Monitor current operations";

#[derive(Debug, Clone, Copy, Default)]
pub struct CannedClient;

impl CannedClient {
    fn respond(system_prompt: &str) -> Value {
        if system_prompt.contains(ObservationStage::ROLE_LINE) {
            json!({
                "observations": [{
                    "observation_id": 1,
                    "text": "Daily sales performance appears normal for current business operations",
                    "metric": "sales",
                    "change": 0.0,
                    "signal_strength": "medium"
                }]
            })
        } else if system_prompt.contains(RecommendationStage::ROLE_LINE) {
            json!({
                "actions": [{
                    "action": CANNED_ACTION,
                    "rationale": "Current metrics show stable performance",
                    "priority": 1,
                    "source_observation_ids": [1],
                    "uncertainty": "low"
                }]
            })
        } else if system_prompt.contains(ReviewStage::ROLE_LINE) {
            json!({
                "reviews": [{
                    "action": CANNED_ACTION,
                    "confidence": "high",
                    "assumptions": "Business metrics will continue at current levels",
                    "notes": "No immediate action required based on current data"
                }]
            })
        } else {
            json!({})
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for CannedClient {
    fn provider(&self) -> Provider {
        Provider::Canned
    }

    async fn generate(&self, system_prompt: &str, _user_prompt: &str) -> anyhow::Result<Value> {
        Ok(Self::respond(system_prompt))
    }
}
