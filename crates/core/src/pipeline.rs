//! Preprocess -> Observe -> BuildSnapshot -> Recommend -> Review -> Merge -> Persist.
//!
//! Strictly sequential, no retries. A failure anywhere aborts the run before
//! the brief is written; the history append done by Preprocess stays.

use crate::domain::decision::MAX_ACTIONS;
use crate::domain::signals::MAX_OBSERVATIONS;
use crate::domain::{
    BusinessConfig, DailyDecisionBrief, DailyDecisionBriefItem, DecisionAction, FullSnapshot,
    IndustryProfile, Metrics, ReviewerOutput, Signals,
};
use crate::error::PipelineError;
use crate::llm::LlmClient;
use crate::preprocess::validate_and_process_metrics;
use crate::stage::observation::{ObservationInput, ObservationStage};
use crate::stage::recommendation::{RecommendationInput, RecommendationStage};
use crate::stage::review::{ReviewInput, ReviewStage};
use crate::stage::{StageRunner, SHARED_SYSTEM_CONTEXT};
use crate::storage::Persistence;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Business context used when today's metrics do not embed their own.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextDefaults {
    pub business_config: BusinessConfig,
    pub industry_profile: IndustryProfile,
}

impl Default for ContextDefaults {
    fn default() -> Self {
        Self {
            business_config: BusinessConfig {
                name: "Demo Business".to_string(),
                hours: "08:00-20:00".to_string(),
                staffing: 5,
                capacity: 50,
                operating_days: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                preferences: BTreeMap::new(),
            },
            industry_profile: IndustryProfile {
                industry_type: "bakery".to_string(),
                tone: "supportive".to_string(),
                assumptions: BTreeMap::new(),
                signal_priorities: Vec::new(),
            },
        }
    }
}

pub fn build_snapshot(metrics: &Metrics, signals: &Signals, defaults: &ContextDefaults) -> FullSnapshot {
    FullSnapshot {
        business_config: metrics
            .business_config
            .clone()
            .unwrap_or_else(|| defaults.business_config.clone()),
        industry_profile: metrics
            .industry_profile
            .clone()
            .unwrap_or_else(|| defaults.industry_profile.clone()),
        metrics: metrics.clone(),
        signals: Some(signals.clone()),
    }
}

/// One brief item per review, in review order. The rationale comes from the
/// first action with exactly the same text, or is empty.
pub fn merge_brief(date: NaiveDate, decision: &DecisionAction, reviews: &ReviewerOutput) -> DailyDecisionBrief {
    let items = reviews
        .reviews
        .iter()
        .map(|review| DailyDecisionBriefItem {
            action: review.action.clone(),
            rationale: decision
                .find(&review.action)
                .map(|a| a.rationale.clone())
                .unwrap_or_default(),
            confidence: review.confidence,
            notes: Some(review.notes.clone()),
        })
        .collect();

    DailyDecisionBrief { date, items }
}

/// `(action index, observation id)` for every cited id the signals do not contain.
pub fn dangling_observation_refs(signals: &Signals, decision: &DecisionAction) -> Vec<(usize, u32)> {
    let known = signals.ids();
    decision
        .actions
        .iter()
        .enumerate()
        .flat_map(|(i, action)| {
            action
                .source_observation_ids
                .iter()
                .filter(|id| !known.contains(id))
                .map(move |id| (i, *id))
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Review action texts with no proposed action of the same text.
    pub unmatched_reviews: Vec<String>,
    /// Proposed action texts nobody reviewed.
    pub unreviewed_actions: Vec<String>,
}

pub fn join_report(decision: &DecisionAction, reviews: &ReviewerOutput) -> JoinReport {
    JoinReport {
        unmatched_reviews: reviews
            .reviews
            .iter()
            .filter(|r| decision.find(&r.action).is_none())
            .map(|r| r.action.clone())
            .collect(),
        unreviewed_actions: decision
            .actions
            .iter()
            .filter(|a| !reviews.reviews.iter().any(|r| r.action == a.action))
            .map(|a| a.action.clone())
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub brief: DailyDecisionBrief,
    pub history_len: usize,
    pub observations: usize,
    pub actions: usize,
    pub joins: JoinReport,
}

pub struct Pipeline<'a, P: ?Sized> {
    store: &'a P,
    client: &'a dyn LlmClient,
    system_context: &'a str,
    defaults: ContextDefaults,
}

impl<'a, P: Persistence + ?Sized> Pipeline<'a, P> {
    pub fn new(store: &'a P, client: &'a dyn LlmClient) -> Self {
        Self {
            store,
            client,
            system_context: SHARED_SYSTEM_CONTEXT,
            defaults: ContextDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: ContextDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_system_context(mut self, system_context: &'a str) -> Self {
        self.system_context = system_context;
        self
    }

    /// Run every stage for `as_of_date` and persist the brief under that date.
    pub async fn run(&self, as_of_date: NaiveDate) -> Result<RunReport, PipelineError> {
        let (metrics, historical_metrics) = validate_and_process_metrics(self.store)?;
        let history_len = historical_metrics.len();
        let runner = StageRunner::new(self.client, self.system_context);

        let signals = runner
            .execute::<ObservationStage>(
                ObservationInput {
                    metrics: metrics.clone(),
                    historical_metrics,
                }
                .into(),
            )
            .await?;
        if signals.len() > MAX_OBSERVATIONS {
            tracing::warn!(
                observations = signals.len(),
                max = MAX_OBSERVATIONS,
                "observation stage exceeded its observation cap"
            );
        }
        tracing::info!(observations = signals.len(), "observation stage done");

        let full_snapshot = build_snapshot(&metrics, &signals, &self.defaults);

        let decision = runner
            .execute::<RecommendationStage>(
                RecommendationInput {
                    signals: signals.clone(),
                    full_snapshot: full_snapshot.clone(),
                }
                .into(),
            )
            .await?;
        if decision.actions.len() > MAX_ACTIONS {
            tracing::warn!(
                actions = decision.actions.len(),
                max = MAX_ACTIONS,
                "recommendation stage exceeded its action cap"
            );
        }
        for (action_idx, observation_id) in dangling_observation_refs(&signals, &decision) {
            tracing::warn!(
                action_idx,
                observation_id,
                "action cites an observation that does not exist"
            );
        }
        for (idx, action) in decision.actions.iter().enumerate() {
            if action.source_observation_ids.is_empty() {
                tracing::warn!(action_idx = idx, "action cites no observation");
            }
        }
        tracing::info!(actions = decision.actions.len(), "recommendation stage done");

        let reviews = runner
            .execute::<ReviewStage>(
                ReviewInput {
                    decision_action: decision.clone(),
                    full_snapshot,
                }
                .into(),
            )
            .await?;
        let joins = join_report(&decision, &reviews);
        for action in &joins.unmatched_reviews {
            tracing::warn!(%action, "review does not match any proposed action; rationale left empty");
        }
        for action in &joins.unreviewed_actions {
            tracing::warn!(%action, "proposed action was not reviewed; it will not appear in the brief");
        }
        tracing::info!(reviews = reviews.reviews.len(), "review stage done");

        let brief = merge_brief(as_of_date, &decision, &reviews);
        self.store.save_brief(&brief)?;
        tracing::info!(date = %brief.date, items = brief.items.len(), "daily decision brief persisted");

        Ok(RunReport {
            brief,
            history_len,
            observations: signals.len(),
            actions: decision.actions.len(),
            joins,
        })
    }
}
