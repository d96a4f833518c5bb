//! # cricket_core - Deterministic Ball-by-Ball Cricket Scoring Engine
//!
//! Records deliveries for a limited-overs fixture and derives everything else
//! from the delivery log: live scores, phase and target, innings closure,
//! scorecards, commentary and a chase win-probability estimate.
//!
//! ## Features
//! - Append-only delivery log, state recomputed by a pure replay
//! - Extras, strike rotation and bowler eligibility validated on every ball
//! - SHA-256 fingerprinted snapshot cache that never overrides the log
//! - JSON API in the flat wire shape used by scoring clients

// Selection validation takes the log, both rosters and all three ids
#![allow(clippy::too_many_arguments)]
// Doc formatting lints - purely cosmetic, fix incrementally
#![allow(clippy::doc_lazy_continuation)]
// Large enum variants - boxing would require API changes
#![allow(clippy::large_enum_variant)]

pub mod api;
pub mod engine;
pub mod error;
pub mod models;
pub mod replay;

// Re-export main API functions
pub use api::{
    commentary_json, engine_config_from_env, lifecycle_update_json, record_delivery_json,
    scorecard_json, snapshot_json, win_probability_json, DeliveryRequest, MatchSnapshot,
};
pub use error::{Result, ScoringError};

// Re-export the session and derived views
pub use engine::{
    DeliveryInput, EngineConfig, Lifecycle, MatchResult, MatchSession, MatchState, MatchStatus,
    MatchSummary, Phase, Scorecard, Selection, Timeline, TimelineEntry,
};
pub use models::{BallOutcome, Delivery, Dismissal, MatchConfig, Player, Team, Toss};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlayerRole, TossDecision};
    use serde_json::json;

    fn session() -> MatchSession {
        let squad = |p: &str| {
            (1..=11)
                .map(|i| Player::new(format!("{p}{i}"), format!("{p}{i}"), PlayerRole::Batsman))
                .collect::<Vec<_>>()
        };
        let config = MatchConfig::new(
            "fx-json",
            Team::new("a", "Alpha", squad("a")),
            Team::new("b", "Beta", squad("b")),
            2,
        );
        let mut session = MatchSession::new(config, EngineConfig::default()).unwrap();
        session.start(Toss::new("b", TossDecision::Bowl)).unwrap();
        session
    }

    #[test]
    fn test_basic_json_flow() {
        let mut session = session();
        let request = json!({
            "innings": 1,
            "strikerId": "a1",
            "nonStrikerId": "a2",
            "bowlerId": "b1",
            "runsOffBat": 6,
            "extraRuns": 0,
            "extraType": "None"
        });
        record_delivery_json(&mut session, &request.to_string()).unwrap();

        let snapshot: serde_json::Value = serde_json::from_str(&snapshot_json(&session).unwrap()).unwrap();
        assert_eq!(snapshot["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(snapshot["summary"]["score1"]["runs"], 6);
        assert_eq!(snapshot["summary"]["score1"]["display"], "6/0 (0.1)");
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut session = session();
        for (striker, runs) in [("a1", 1), ("a2", 4), ("a2", 0)] {
            let non_striker = if striker == "a1" { "a2" } else { "a1" };
            let input = DeliveryInput::new(
                1,
                Selection::new(striker, non_striker, "b1"),
                BallOutcome::Runs { off_bat: runs },
            );
            session.record_delivery(&input).unwrap();
        }

        let replayed = MatchSession::restore(
            session.config().clone(),
            EngineConfig::default(),
            session.lifecycle().clone(),
            session.log().to_vec(),
        )
        .unwrap();
        assert_eq!(snapshot_json(&replayed).unwrap(), snapshot_json(&session).unwrap());
        assert_eq!(commentary_json(&replayed, None).unwrap(), commentary_json(&session, None).unwrap());
    }
}
