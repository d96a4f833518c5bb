pub mod commentary; // Ball / over-summary / innings-break timeline
pub mod config; // Rules and win-probability tuning
pub mod eligibility; // Over progress, no consecutive overs
pub mod lifecycle; // Scheduled -> Live -> Completed, derived phase
pub mod recorder; // Delivery validation, coordinates, strike rotation
pub mod scorecard; // Batting and bowling aggregates
pub mod session;
pub mod win_probability;

#[cfg(test)]
mod contract_tests; // Replay invariants and reference scenarios

pub use commentary::{project_timeline, Timeline, TimelineEntry};
pub use config::{EngineConfig, RulesConfig, WinProbabilityConfig};
pub use eligibility::{eligible_bowlers, over_progress, previous_over_bowler, OverProgress};
pub use lifecycle::{
    Declaration, InningsClosure, InningsState, Lifecycle, LifecycleUpdate, MatchResult,
    MatchState, MatchStatus, Phase, ResultKind,
};
pub use recorder::{next_selection, record_delivery, DeliveryInput, Recorded, Selection};
pub use scorecard::{project_scorecard, BattingLine, BattingStatus, BowlingLine, Scorecard};
pub use session::{MatchSession, MatchSummary, TeamScore};
pub use win_probability::{estimate, Side, WinProbability, WinProbabilityView};
