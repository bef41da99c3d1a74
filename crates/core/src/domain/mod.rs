pub mod brief;
pub mod context;
pub mod contract;
pub mod decision;
pub mod level;
pub mod metrics;
pub mod review;
pub mod signals;

pub use brief::{DailyDecisionBrief, DailyDecisionBriefItem};
pub use context::{BusinessConfig, FullSnapshot, IndustryProfile};
pub use decision::{DecisionAction, DecisionActionItem};
pub use level::Level;
pub use metrics::{HistoricalMetrics, Metrics};
pub use review::{ReviewerActionReview, ReviewerOutput};
pub use signals::{AnalystObservation, Signals};
