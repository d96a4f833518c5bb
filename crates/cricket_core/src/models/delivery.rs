//! Delivery event model
//!
//! A delivery is immutable once appended to the log. The outcome and the
//! dismissal are closed sum types so that only legal combinations can be
//! constructed; the flat wire shape (`runsOffBat`, `extraRuns`, `extraType`,
//! `isWicket`, ...) is produced through the accessors.

use super::PlayerId;
use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};

/// Legal deliveries per over.
pub const BALLS_PER_OVER: u32 = 6;

/// Fixed penalty run for a no ball.
pub const NO_BALL_PENALTY: u32 = 1;

/// Minimum extra runs recorded for a wide (the wide itself).
pub const WIDE_PENALTY: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
pub enum ExtraType {
    #[default]
    None,
    Wide,
    NoBall,
    Bye,
    LegBye,
}

impl ExtraType {
    /// Wides and no balls are re-bowled and do not count toward the over.
    pub fn is_legal(&self) -> bool {
        !matches!(self, ExtraType::Wide | ExtraType::NoBall)
    }

    /// Byes and leg byes are not charged to the bowler.
    pub fn charged_to_bowler(&self) -> bool {
        !matches!(self, ExtraType::Bye | ExtraType::LegBye)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
pub enum WicketType {
    Bowled,
    Caught,
    #[serde(rename = "LBW")]
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
}

impl WicketType {
    /// Run outs are not credited to the bowler.
    pub fn credited_to_bowler(&self) -> bool {
        !matches!(self, WicketType::RunOut)
    }

    /// Only a run out can dismiss the non-striker.
    pub fn can_dismiss_non_striker(&self) -> bool {
        matches!(self, WicketType::RunOut)
    }

    pub fn allowed_on(&self, extra: ExtraType) -> bool {
        match extra {
            ExtraType::None => true,
            ExtraType::Wide => {
                matches!(self, WicketType::Stumped | WicketType::RunOut | WicketType::HitWicket)
            }
            ExtraType::NoBall | ExtraType::Bye | ExtraType::LegBye => {
                matches!(self, WicketType::RunOut)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WicketType::Bowled => "bowled",
            WicketType::Caught => "caught",
            WicketType::Lbw => "lbw",
            WicketType::RunOut => "run out",
            WicketType::Stumped => "stumped",
            WicketType::HitWicket => "hit wicket",
        }
    }
}

/// What happened off the ball, in runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BallOutcome {
    /// Legal delivery; runs struck by the batsman (0 for a dot ball).
    Runs { off_bat: u32 },
    /// `runs` includes the wide itself, so it is always >= 1.
    Wide { runs: u32 },
    /// Extra fixed at the penalty; `off_bat` are runs struck.
    NoBall { off_bat: u32 },
    Bye { runs: u32 },
    LegBye { runs: u32 },
}

impl BallOutcome {
    pub fn dot() -> Self {
        BallOutcome::Runs { off_bat: 0 }
    }

    /// Build an outcome from the flat wire fields, rejecting combinations that
    /// cannot occur.
    pub fn from_parts(extra_type: ExtraType, runs_off_bat: u32, extra_runs: u32) -> Result<Self> {
        match extra_type {
            ExtraType::None => {
                if extra_runs != 0 {
                    return Err(ScoringError::InvalidDelivery(format!(
                        "extra runs ({extra_runs}) recorded without an extra type"
                    )));
                }
                Ok(BallOutcome::Runs { off_bat: runs_off_bat })
            }
            ExtraType::Wide => {
                if runs_off_bat != 0 {
                    return Err(ScoringError::InvalidDelivery(
                        "a wide cannot carry runs off the bat".into(),
                    ));
                }
                if extra_runs < WIDE_PENALTY {
                    return Err(ScoringError::InvalidDelivery(
                        "a wide must record at least the 1-run penalty".into(),
                    ));
                }
                Ok(BallOutcome::Wide { runs: extra_runs })
            }
            ExtraType::NoBall => {
                if extra_runs != NO_BALL_PENALTY {
                    return Err(ScoringError::InvalidDelivery(format!(
                        "a no ball carries exactly {NO_BALL_PENALTY} extra run, got {extra_runs}"
                    )));
                }
                Ok(BallOutcome::NoBall { off_bat: runs_off_bat })
            }
            ExtraType::Bye | ExtraType::LegBye => {
                if runs_off_bat != 0 {
                    return Err(ScoringError::InvalidDelivery(
                        "byes and leg byes cannot carry runs off the bat".into(),
                    ));
                }
                Ok(if extra_type == ExtraType::Bye {
                    BallOutcome::Bye { runs: extra_runs }
                } else {
                    BallOutcome::LegBye { runs: extra_runs }
                })
            }
        }
    }

    pub fn extra_type(&self) -> ExtraType {
        match self {
            BallOutcome::Runs { .. } => ExtraType::None,
            BallOutcome::Wide { .. } => ExtraType::Wide,
            BallOutcome::NoBall { .. } => ExtraType::NoBall,
            BallOutcome::Bye { .. } => ExtraType::Bye,
            BallOutcome::LegBye { .. } => ExtraType::LegBye,
        }
    }

    pub fn runs_off_bat(&self) -> u32 {
        match *self {
            BallOutcome::Runs { off_bat } | BallOutcome::NoBall { off_bat } => off_bat,
            _ => 0,
        }
    }

    pub fn extra_runs(&self) -> u32 {
        match *self {
            BallOutcome::Runs { .. } => 0,
            BallOutcome::NoBall { .. } => NO_BALL_PENALTY,
            BallOutcome::Wide { runs } | BallOutcome::Bye { runs } | BallOutcome::LegBye { runs } => {
                runs
            }
        }
    }

    pub fn total_runs(&self) -> u32 {
        self.runs_off_bat() + self.extra_runs()
    }

    pub fn is_legal(&self) -> bool {
        self.extra_type().is_legal()
    }

    /// Runs the batsmen physically ran (or were awarded) while the ball was live.
    /// An odd count means they finished at opposite ends.
    pub fn runs_crossed(&self) -> u32 {
        match *self {
            BallOutcome::Runs { off_bat } | BallOutcome::NoBall { off_bat } => off_bat,
            BallOutcome::Wide { runs } => runs.saturating_sub(WIDE_PENALTY),
            BallOutcome::Bye { runs } | BallOutcome::LegBye { runs } => runs,
        }
    }

    pub fn swaps_strike(&self) -> bool {
        self.runs_crossed() % 2 == 1
    }

    /// Runs charged against the bowler's figures.
    pub fn bowler_runs(&self) -> u32 {
        if self.extra_type().charged_to_bowler() {
            self.total_runs()
        } else {
            self.runs_off_bat()
        }
    }

    /// Deliveries that count as a ball faced by the striker (everything but a wide).
    pub fn counts_as_faced(&self) -> bool {
        !matches!(self, BallOutcome::Wide { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismissal {
    pub kind: WicketType,
    pub player_out: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielder: Option<PlayerId>,
}

impl Dismissal {
    pub fn new(kind: WicketType, player_out: impl Into<PlayerId>) -> Self {
        Self { kind, player_out: player_out.into(), fielder: None }
    }

    pub fn with_fielder(mut self, fielder: impl Into<PlayerId>) -> Self {
        self.fielder = Some(fielder.into());
        self
    }

    /// Check the dismissal against the ball it happened on.
    pub fn validate(&self, outcome: &BallOutcome, striker: &str, non_striker: &str) -> Result<()> {
        if self.player_out.is_empty() {
            return Err(ScoringError::InvalidDismissal("player out is not set".into()));
        }
        if !self.kind.allowed_on(outcome.extra_type()) {
            return Err(ScoringError::InvalidDismissal(format!(
                "{} is not possible off a {:?} delivery",
                self.kind.label(),
                outcome.extra_type()
            )));
        }
        if self.player_out == striker {
            return Ok(());
        }
        if self.player_out == non_striker {
            if self.kind.can_dismiss_non_striker() {
                return Ok(());
            }
            return Err(ScoringError::InvalidDismissal(format!(
                "non-striker {} cannot be out {}",
                self.player_out,
                self.kind.label()
            )));
        }
        Err(ScoringError::InvalidDismissal(format!(
            "player out {} is not at the crease",
            self.player_out
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// 1 or 2
    pub innings: u8,
    /// 0-based
    pub over_number: u32,
    /// 1-based, counts wides and no balls too
    pub ball_number: u32,
    pub striker: PlayerId,
    pub non_striker: PlayerId,
    pub bowler: PlayerId,
    pub outcome: BallOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissal: Option<Dismissal>,
}

impl Delivery {
    pub fn runs_off_bat(&self) -> u32 {
        self.outcome.runs_off_bat()
    }

    pub fn extra_runs(&self) -> u32 {
        self.outcome.extra_runs()
    }

    pub fn extra_type(&self) -> ExtraType {
        self.outcome.extra_type()
    }

    pub fn total_runs(&self) -> u32 {
        self.outcome.total_runs()
    }

    pub fn is_legal(&self) -> bool {
        self.outcome.is_legal()
    }

    pub fn is_wicket(&self) -> bool {
        self.dismissal.is_some()
    }

    pub fn wicket_type(&self) -> Option<WicketType> {
        self.dismissal.as_ref().map(|d| d.kind)
    }

    pub fn player_out(&self) -> Option<&str> {
        self.dismissal.as_ref().map(|d| d.player_out.as_str())
    }

    pub fn fielder(&self) -> Option<&str> {
        self.dismissal.as_ref().and_then(|d| d.fielder.as_deref())
    }

    /// Sort key for the total order within an innings.
    pub fn position(&self) -> (u8, u32, u32) {
        (self.innings, self.over_number, self.ball_number)
    }
}

/// Render a legal-ball count as `overs.balls`, e.g. 27 -> "4.3".
pub fn overs_string(legal_balls: u32) -> String {
    format!("{}.{}", legal_balls / BALLS_PER_OVER, legal_balls % BALLS_PER_OVER)
}
