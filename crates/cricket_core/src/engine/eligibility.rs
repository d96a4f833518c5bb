//! Over progress and bowler eligibility, both read straight off the log.

use crate::error::Result;
use crate::models::{Delivery, MatchConfig, Player, Toss, BALLS_PER_OVER};

/// Where an innings stands inside its current (highest) over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverProgress<'a> {
    pub over_number: u32,
    /// Non-wide, non-no-ball deliveries in the over.
    pub legal_balls: u32,
    /// Every delivery in the over, legal or not.
    pub deliveries: u32,
    /// Bowler of the latest delivery in the over.
    pub bowler: Option<&'a str>,
}

impl OverProgress<'_> {
    pub fn is_complete(&self) -> bool {
        self.legal_balls >= BALLS_PER_OVER
    }
}

pub fn over_progress(log: &[Delivery], innings: u8) -> OverProgress<'_> {
    let current = log
        .iter()
        .filter(|d| d.innings == innings)
        .map(|d| d.over_number)
        .max();

    let Some(over_number) = current else {
        return OverProgress { over_number: 0, legal_balls: 0, deliveries: 0, bowler: None };
    };

    let mut progress = OverProgress { over_number, legal_balls: 0, deliveries: 0, bowler: None };
    for d in log.iter().filter(|d| d.innings == innings && d.over_number == over_number) {
        progress.deliveries += 1;
        if d.is_legal() {
            progress.legal_balls += 1;
        }
        progress.bowler = Some(d.bowler.as_str());
    }
    progress
}

/// The bowler barred from the next delivery: whoever bowled the current over,
/// once that over has its six legal balls. `None` mid-over.
pub fn previous_over_bowler(log: &[Delivery], innings: u8) -> Option<&str> {
    let progress = over_progress(log, innings);
    if progress.is_complete() {
        progress.bowler
    } else {
        None
    }
}

/// Bowling-side roster minus the bowler of a just-completed over.
pub fn eligible_bowlers<'a>(
    log: &[Delivery],
    config: &'a MatchConfig,
    toss: &Toss,
    innings: u8,
) -> Result<Vec<&'a Player>> {
    let bowling = config.bowling_team(toss, innings)?;
    let excluded = previous_over_bowler(log, innings);
    Ok(bowling
        .players
        .iter()
        .filter(|p| Some(p.id.as_str()) != excluded)
        .collect())
}
