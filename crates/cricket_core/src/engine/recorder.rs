//! Delivery Recorder
//!
//! Validates a scorer's input against the log, assigns over/ball coordinates
//! and works out who is on strike for the next ball. The recorder never
//! mutates the log itself; the caller appends the returned delivery.

use super::config::RulesConfig;
use super::eligibility::{over_progress, previous_over_bowler};
use super::lifecycle::{innings_closure, InningsClosure, Lifecycle, MatchState, Phase};
use crate::error::{Result, ScoringError, SelectionSlot};
use crate::models::{BallOutcome, Delivery, Dismissal, MatchConfig, PlayerId, BALLS_PER_OVER};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// The active striker, non-striker and bowler. A cleared slot is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub striker: Option<PlayerId>,
    pub non_striker: Option<PlayerId>,
    pub bowler: Option<PlayerId>,
}

impl Selection {
    pub fn new(
        striker: impl Into<PlayerId>,
        non_striker: impl Into<PlayerId>,
        bowler: impl Into<PlayerId>,
    ) -> Self {
        Self {
            striker: Some(striker.into()),
            non_striker: Some(non_striker.into()),
            bowler: Some(bowler.into()),
        }
    }

    /// All three ids, or the first missing slot.
    pub fn require(&self) -> Result<(&str, &str, &str)> {
        let striker = self
            .striker
            .as_deref()
            .ok_or(ScoringError::MissingSelection { slot: SelectionSlot::Striker })?;
        let non_striker = self
            .non_striker
            .as_deref()
            .ok_or(ScoringError::MissingSelection { slot: SelectionSlot::NonStriker })?;
        let bowler = self
            .bowler
            .as_deref()
            .ok_or(ScoringError::MissingSelection { slot: SelectionSlot::Bowler })?;
        Ok((striker, non_striker, bowler))
    }

    pub fn is_complete(&self) -> bool {
        self.require().is_ok()
    }
}

/// A validated request to record one ball.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryInput {
    pub innings: u8,
    pub selection: Selection,
    pub outcome: BallOutcome,
    pub dismissal: Option<Dismissal>,
}

impl DeliveryInput {
    pub fn new(innings: u8, selection: Selection, outcome: BallOutcome) -> Self {
        Self { innings, selection, outcome, dismissal: None }
    }

    pub fn with_dismissal(mut self, dismissal: Dismissal) -> Self {
        self.dismissal = Some(dismissal);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub delivery: Delivery,
    /// Who is where for the next ball; a dismissed batsman's slot and, after an
    /// over, the bowler are cleared.
    pub next: Selection,
    pub over_completed: bool,
    pub innings_closed: Option<InningsClosure>,
}

/// Players dismissed so far in `innings`.
pub fn dismissed_players(log: &[Delivery], innings: u8) -> HashSet<&str> {
    log.iter()
        .filter(|d| d.innings == innings)
        .filter_map(|d| d.player_out())
        .collect()
}

/// Validate `input` against the log and produce the delivery to append.
pub fn record_delivery(
    log: &[Delivery],
    config: &MatchConfig,
    rules: &RulesConfig,
    lifecycle: &Lifecycle,
    input: &DeliveryInput,
) -> Result<Recorded> {
    let state = MatchState::derive(config, rules, lifecycle, log)?;
    let innings = match state.phase {
        Phase::Live { innings } => innings,
        Phase::InningsBreak => 2,
        Phase::Scheduled => {
            return Err(ScoringError::MatchNotLive { status: lifecycle.status.to_string() })
        }
        Phase::Completed => {
            return Err(ScoringError::MatchNotLive { status: "completed".into() })
        }
    };
    if input.innings != innings {
        if let Some(requested) = state.innings(input.innings).filter(|i| i.is_closed()) {
            return Err(closed_innings_error(config, requested.number, requested.closure));
        }
        return Err(ScoringError::WrongInnings { expected: innings, found: input.innings });
    }
    let current = state
        .innings(innings)
        .ok_or_else(|| ScoringError::InvalidConfig(format!("innings {innings} is not set up")))?;
    if current.is_closed() {
        return Err(closed_innings_error(config, innings, current.closure));
    }

    let (striker, non_striker, bowler) = input.selection.require()?;
    validate_selection(
        log,
        config,
        &current.batting_team_id,
        &current.bowling_team_id,
        innings,
        striker,
        non_striker,
        bowler,
    )?;

    // Over/ball coordinates
    let progress = over_progress(log, innings);
    let (over_number, ball_number, legal_before) = if progress.is_complete() {
        (progress.over_number + 1, 1, 0)
    } else {
        (progress.over_number, progress.deliveries + 1, progress.legal_balls)
    };
    if over_number >= config.total_overs {
        return Err(ScoringError::OversExhausted { innings, total_overs: config.total_overs });
    }
    if ball_number == 1 && previous_over_bowler(log, innings) == Some(bowler) {
        return Err(ScoringError::BowlerIneligible { bowler: bowler.to_string() });
    }

    if let Some(dismissal) = &input.dismissal {
        dismissal.validate(&input.outcome, striker, non_striker)?;
    }

    let delivery = Delivery {
        innings,
        over_number,
        ball_number,
        striker: striker.to_string(),
        non_striker: non_striker.to_string(),
        bowler: bowler.to_string(),
        outcome: input.outcome,
        dismissal: input.dismissal.clone(),
    };

    let mut score = current.score.clone();
    score.apply(&delivery);
    let innings_closed = innings_closure(
        &score,
        current.max_wickets,
        config.total_balls(),
        state.target.filter(|_| innings == 2),
        false,
    );
    let over_completed = delivery.is_legal() && legal_before + 1 == BALLS_PER_OVER;

    let next = if innings_closed.is_some() {
        Selection::default()
    } else {
        next_selection(&delivery, over_completed)
    };

    debug!(
        innings,
        over = over_number,
        ball = ball_number,
        runs = delivery.total_runs(),
        wicket = delivery.is_wicket(),
        over_completed,
        closed = ?innings_closed,
        "delivery recorded"
    );

    Ok(Recorded { delivery, next, over_completed, innings_closed })
}

fn closed_innings_error(
    config: &MatchConfig,
    innings: u8,
    closure: Option<InningsClosure>,
) -> ScoringError {
    match closure {
        Some(InningsClosure::OversComplete) => {
            ScoringError::OversExhausted { innings, total_overs: config.total_overs }
        }
        _ => ScoringError::InningsComplete { innings },
    }
}

fn validate_selection(
    log: &[Delivery],
    config: &MatchConfig,
    batting_team_id: &str,
    bowling_team_id: &str,
    innings: u8,
    striker: &str,
    non_striker: &str,
    bowler: &str,
) -> Result<()> {
    if striker == non_striker {
        return Err(ScoringError::InvalidSelection(format!(
            "{striker} cannot be both striker and non-striker"
        )));
    }
    let batting = config.team(batting_team_id).ok_or_else(|| {
        ScoringError::InvalidConfig(format!("unknown batting team {batting_team_id}"))
    })?;
    let bowling = config.team(bowling_team_id).ok_or_else(|| {
        ScoringError::InvalidConfig(format!("unknown bowling team {bowling_team_id}"))
    })?;
    for batsman in [striker, non_striker] {
        if !batting.contains(batsman) {
            return Err(ScoringError::InvalidSelection(format!(
                "{batsman} is not in the {} batting roster",
                batting.name
            )));
        }
    }
    if !bowling.contains(bowler) {
        return Err(ScoringError::InvalidSelection(format!(
            "{bowler} is not in the {} bowling roster",
            bowling.name
        )));
    }
    let dismissed = dismissed_players(log, innings);
    for batsman in [striker, non_striker] {
        if dismissed.contains(batsman) {
            return Err(ScoringError::InvalidSelection(format!(
                "{batsman} has already been dismissed this innings"
            )));
        }
    }
    Ok(())
}

/// Strike and bowler for the next ball.
///
/// The run-parity swap and the change of ends at the end of an over compose by
/// XOR, each applied once: a single off the sixth ball keeps the striker on strike.
pub fn next_selection(delivery: &Delivery, over_completed: bool) -> Selection {
    let swap = delivery.outcome.swaps_strike() ^ over_completed;
    let (mut striker, mut non_striker) = if swap {
        (Some(delivery.non_striker.clone()), Some(delivery.striker.clone()))
    } else {
        (Some(delivery.striker.clone()), Some(delivery.non_striker.clone()))
    };
    if let Some(out) = delivery.player_out() {
        if striker.as_deref() == Some(out) {
            striker = None;
        }
        if non_striker.as_deref() == Some(out) {
            non_striker = None;
        }
    }
    let bowler = if over_completed { None } else { Some(delivery.bowler.clone()) };
    Selection { striker, non_striker, bowler }
}
