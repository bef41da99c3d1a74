use crate::domain::contract::{field, Validate, Violation};
use crate::domain::{HistoricalMetrics, Metrics, Signals};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationInput {
    pub metrics: Metrics,
    pub historical_metrics: HistoricalMetrics,
}

impl Validate for ObservationInput {
    fn validate(&self, path: &str) -> Result<(), Violation> {
        self.metrics.validate(&field(path, "metrics"))?;
        self.historical_metrics
            .validate(&field(path, "historical_metrics"))?;
        Ok(())
    }
}

/// Turns metrics into neutral observations.
pub struct ObservationStage;

impl Stage for ObservationStage {
    const NAME: &'static str = "observation";
    const ROLE_LINE: &'static str = "You are the Analyst Agent.";
    const INSTRUCTIONS: &'static str = r#"
Read today's structured business metrics together with the history of earlier
days, and point out the patterns, changes or risks that matter for today.

Rules:
- Do not suggest actions.
- Do not rank or prioritize observations.
- Describe only what is happening, strictly from the input data.
- Do not speculate beyond the data.
- Write plainly, for an owner without a technical background.

Input:
- Today's validated metrics ("metrics")
- Earlier daily metrics, oldest first ("historical_metrics")

Output:
Return a JSON object with exactly this structure:

{
  "observations": [
    {
      "observation_id": 1,
      "text": "<short observation>",
      "metric": "<metric referenced>",
      "change": <day-over-day change as a number>,
      "signal_strength": "low | medium | high"
    }
  ]
}

Guidelines:
- Include only what differs meaningfully from the usual baseline.
- Keep observations about the day at hand; mention longer trends only when they bear on it.
- Say explicitly when a key metric is stable.
- Return at most 5 observations, numbered from 1.
"#;

    type Input = ObservationInput;
    type Output = Signals;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signals::MAX_OBSERVATIONS;
    use crate::error::PipelineError;
    use crate::llm::scripted::ScriptedClient;
    use crate::stage::{StageRunner, SHARED_SYSTEM_CONTEXT};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn input() -> ObservationInput {
        let today = Metrics {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            sales: 420.0,
            traffic: 61,
            inventory: BTreeMap::from([("sourdough".to_string(), 4.0)]),
            reservations: Some(3),
            other_metrics: None,
            business_config: None,
            industry_profile: None,
        };
        let mut yesterday = today.clone();
        yesterday.date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ObservationInput {
            historical_metrics: HistoricalMetrics::new(vec![yesterday, today.clone()]),
            metrics: today,
        }
    }

    #[test]
    fn instructions_cap_observations() {
        let text = ObservationStage::instructions();
        assert!(text.starts_with(ObservationStage::ROLE_LINE));
        assert!(text.contains(&format!("at most {MAX_OBSERVATIONS} observations")));
    }

    #[tokio::test]
    async fn conforming_response_stays_within_cap() {
        let observations: Vec<_> = (1..=5)
            .map(|id| json!({"observation_id": id, "text": format!("finding {id}")}))
            .collect();
        let client = ScriptedClient::new([json!({ "observations": observations })]);
        let runner = StageRunner::new(&client, SHARED_SYSTEM_CONTEXT);

        let signals = runner.execute::<ObservationStage>(input().into()).await.unwrap();
        assert_eq!(signals.len(), 5);
        assert!(signals.len() <= MAX_OBSERVATIONS);
    }

    #[tokio::test]
    async fn typed_input_with_negative_sales_is_rejected() {
        let client = ScriptedClient::default();
        let runner = StageRunner::new(&client, SHARED_SYSTEM_CONTEXT);
        let mut bad = input();
        bad.metrics.sales = -1.0;

        let err = runner.execute::<ObservationStage>(bad.into()).await.unwrap_err();
        match err {
            PipelineError::Schema(e) => assert_eq!(e.field_path, "metrics.sales"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.calls().is_empty());
    }
}
