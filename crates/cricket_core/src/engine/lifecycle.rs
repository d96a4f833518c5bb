//! Match Lifecycle State Machine
//!
//! `Scheduled → Live(1) → [InningsBreak] → Live(2) → Completed`
//!
//! Only the status, the toss, declarations and the final result are persisted
//! in [`Lifecycle`]. Everything else, including the innings break, is derived
//! from the delivery log on every read by [`MatchState::derive`].

use crate::engine::config::RulesConfig;
use crate::error::{Result, ScoringError};
use crate::models::{Delivery, InningsScore, MatchConfig, Toss, TossDecision};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Persisted status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Completed,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::Live => write!(f, "live"),
            MatchStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Derived phase, recomputed from the log on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Scheduled,
    Live { innings: u8 },
    InningsBreak,
    Completed,
}

/// Explicit scorer signals. They truncate play without touching the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Innings { innings: u8 },
    EndMatch,
}

/// Why an innings is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsClosure {
    AllOut,
    OversComplete,
    TargetReached,
    Declared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultKind {
    WonByWickets { margin: u32 },
    WonByRuns { margin: u32 },
    Tie,
    NoResult,
    /// Supplied verbatim by a lifecycle update.
    Declared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub kind: ResultKind,
    pub result_description: String,
    /// `None` for a tie or no result.
    pub winning_team_id: Option<String>,
}

impl MatchResult {
    fn tie() -> Self {
        Self { kind: ResultKind::Tie, result_description: "Match Tied".into(), winning_team_id: None }
    }

    fn no_result() -> Self {
        Self { kind: ResultKind::NoResult, result_description: "No Result".into(), winning_team_id: None }
    }
}

fn plural(count: u32, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Inbound lifecycle-update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleUpdate {
    pub status: MatchStatus,
    #[serde(default)]
    pub toss_winner_id: Option<String>,
    #[serde(default)]
    pub toss_decision: Option<TossDecision>,
    #[serde(default)]
    pub current_innings: Option<u8>,
    #[serde(default)]
    pub result_description: Option<String>,
    #[serde(default)]
    pub winning_team_id: Option<String>,
}

/// Persisted lifecycle record for one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Lifecycle {
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toss: Option<Toss>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<Declaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn innings_declared(&self, innings: u8) -> bool {
        self.declarations
            .iter()
            .any(|d| matches!(d, Declaration::Innings { innings: i } if *i == innings))
    }

    pub fn match_ended(&self) -> bool {
        self.declarations.contains(&Declaration::EndMatch)
    }

    /// Toss input: `Scheduled → Live`.
    pub fn start(&mut self, config: &MatchConfig, toss: Toss) -> Result<()> {
        match self.status {
            MatchStatus::Scheduled => {}
            MatchStatus::Live if self.toss.as_ref() == Some(&toss) => return Ok(()),
            other => {
                return Err(ScoringError::InvalidTransition(format!(
                    "cannot record a toss while the match is {other}"
                )))
            }
        }
        config.validate_toss(&toss)?;
        info!(fixture = %config.fixture_id, winner = %toss.winner_id, decision = ?toss.decision, "match live");
        self.toss = Some(toss);
        self.status = MatchStatus::Live;
        Ok(())
    }

    /// Close the active innings early.
    pub fn declare_innings(
        &mut self,
        config: &MatchConfig,
        rules: &RulesConfig,
        log: &[Delivery],
        innings: u8,
    ) -> Result<()> {
        let state = MatchState::derive(config, rules, self, log)?;
        match state.phase {
            Phase::Live { innings: active } if active == innings => {}
            Phase::InningsBreak if innings == 2 => {}
            phase => {
                return Err(ScoringError::InvalidTransition(format!(
                    "cannot declare innings {innings} during {phase:?}"
                )))
            }
        }
        info!(fixture = %config.fixture_id, innings, "innings declared");
        self.declarations.push(Declaration::Innings { innings });
        self.complete_if_finished(config, rules, log)?;
        Ok(())
    }

    /// Terminate the match at any point and synthesise the result.
    pub fn end_match(
        &mut self,
        config: &MatchConfig,
        rules: &RulesConfig,
        log: &[Delivery],
    ) -> Result<MatchResult> {
        if self.status == MatchStatus::Completed {
            return Err(ScoringError::InvalidTransition("match is already completed".into()));
        }
        if !self.match_ended() {
            self.declarations.push(Declaration::EndMatch);
        }
        let result = if self.toss.is_some() {
            MatchState::derive(config, rules, self, log)?
                .result
                .unwrap_or_else(MatchResult::no_result)
        } else {
            MatchResult::no_result()
        };
        self.finish(config, result.clone());
        Ok(result)
    }

    /// Persist the result once the log satisfies a match-end condition.
    pub fn complete_if_finished(
        &mut self,
        config: &MatchConfig,
        rules: &RulesConfig,
        log: &[Delivery],
    ) -> Result<Option<MatchResult>> {
        if self.status != MatchStatus::Live {
            return Ok(None);
        }
        let state = MatchState::derive(config, rules, self, log)?;
        match state.result {
            Some(result) => {
                self.finish(config, result.clone());
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    fn finish(&mut self, config: &MatchConfig, result: MatchResult) {
        info!(
            fixture = %config.fixture_id,
            result = %result.result_description,
            winner = ?result.winning_team_id,
            "match completed"
        );
        self.result = Some(result);
        self.status = MatchStatus::Completed;
    }

    /// Apply an inbound lifecycle-update request as a validated transition.
    pub fn apply_update(
        &mut self,
        config: &MatchConfig,
        rules: &RulesConfig,
        log: &[Delivery],
        update: &LifecycleUpdate,
    ) -> Result<()> {
        let toss = match (&update.toss_winner_id, update.toss_decision) {
            (Some(winner), Some(decision)) => Some(Toss::new(winner.clone(), decision)),
            (None, None) => None,
            _ => {
                return Err(ScoringError::InvalidTransition(
                    "toss winner and toss decision must be supplied together".into(),
                ))
            }
        };
        debug!(fixture = %config.fixture_id, status = %update.status, "lifecycle update");

        match update.status {
            MatchStatus::Scheduled => {
                if self.status != MatchStatus::Scheduled {
                    return Err(ScoringError::InvalidTransition(format!(
                        "cannot return to scheduled from {}",
                        self.status
                    )));
                }
                if toss.is_some() {
                    return Err(ScoringError::InvalidTransition(
                        "a toss moves the match to live".into(),
                    ));
                }
                Ok(())
            }
            MatchStatus::Live => {
                let toss = toss.or_else(|| self.toss.clone()).ok_or_else(|| {
                    ScoringError::InvalidTransition("a match goes live only after the toss".into())
                })?;
                self.start(config, toss)?;
                if let Some(innings) = update.current_innings {
                    self.move_to_innings(config, rules, log, innings)?;
                }
                Ok(())
            }
            MatchStatus::Completed => {
                if let Some(toss) = toss {
                    if self.status == MatchStatus::Scheduled {
                        self.start(config, toss)?;
                    }
                }
                match &update.result_description {
                    Some(description) => {
                        if self.status == MatchStatus::Completed {
                            return Err(ScoringError::InvalidTransition(
                                "match is already completed".into(),
                            ));
                        }
                        if let Some(winner) = &update.winning_team_id {
                            if config.team(winner).is_none() {
                                return Err(ScoringError::InvalidTransition(format!(
                                    "winning team {winner} is not playing this fixture"
                                )));
                            }
                        }
                        if !self.match_ended() {
                            self.declarations.push(Declaration::EndMatch);
                        }
                        let result = MatchResult {
                            kind: ResultKind::Declared,
                            result_description: description.clone(),
                            winning_team_id: update.winning_team_id.clone(),
                        };
                        self.finish(config, result);
                        Ok(())
                    }
                    None => self.end_match(config, rules, log).map(|_| ()),
                }
            }
        }
    }

    fn move_to_innings(
        &mut self,
        config: &MatchConfig,
        rules: &RulesConfig,
        log: &[Delivery],
        innings: u8,
    ) -> Result<()> {
        let state = MatchState::derive(config, rules, self, log)?;
        match (innings, state.phase) {
            (1, Phase::Live { innings: 1 }) => Ok(()),
            (2, Phase::Live { innings: 2 }) | (2, Phase::InningsBreak) => Ok(()),
            // Moving on while innings 1 is open closes it
            (2, Phase::Live { innings: 1 }) => self.declare_innings(config, rules, log, 1),
            (other, phase) => Err(ScoringError::InvalidTransition(format!(
                "cannot move to innings {other} during {phase:?}"
            ))),
        }
    }
}

/// Derived state of one innings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsState {
    pub number: u8,
    pub batting_team_id: String,
    pub bowling_team_id: String,
    pub score: InningsScore,
    pub max_wickets: u32,
    pub started: bool,
    pub closure: Option<InningsClosure>,
}

impl InningsState {
    pub fn is_closed(&self) -> bool {
        self.closure.is_some()
    }
}

/// Decide whether an innings is over given its running score.
pub fn innings_closure(
    score: &InningsScore,
    max_wickets: u32,
    total_balls: u32,
    target: Option<u32>,
    declared: bool,
) -> Option<InningsClosure> {
    if target.is_some_and(|t| score.runs >= t) {
        Some(InningsClosure::TargetReached)
    } else if score.wickets >= max_wickets {
        Some(InningsClosure::AllOut)
    } else if score.legal_balls >= total_balls {
        Some(InningsClosure::OversComplete)
    } else if declared {
        Some(InningsClosure::Declared)
    } else {
        None
    }
}

/// Full derived state of a match: phase, both innings, target and result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub phase: Phase,
    /// Empty until the toss fixes the batting order.
    pub innings: Vec<InningsState>,
    pub target: Option<u32>,
    pub result: Option<MatchResult>,
}

impl MatchState {
    pub fn derive(
        config: &MatchConfig,
        rules: &RulesConfig,
        lifecycle: &Lifecycle,
        log: &[Delivery],
    ) -> Result<Self> {
        let Some(toss) = lifecycle.toss.as_ref() else {
            let phase = if lifecycle.status == MatchStatus::Completed {
                Phase::Completed
            } else {
                Phase::Scheduled
            };
            return Ok(Self { phase, innings: Vec::new(), target: None, result: lifecycle.result.clone() });
        };

        let ended = lifecycle.match_ended();
        let total_balls = config.total_balls();

        let mut first = Self::innings_state(config, rules, toss, log, 1)?;
        first.closure = innings_closure(
            &first.score,
            first.max_wickets,
            total_balls,
            None,
            lifecycle.innings_declared(1) || ended,
        );
        let target = first.closure.map(|_| first.score.runs + 1);

        let mut second = Self::innings_state(config, rules, toss, log, 2)?;
        if first.is_closed() {
            second.closure = innings_closure(
                &second.score,
                second.max_wickets,
                total_balls,
                target,
                lifecycle.innings_declared(2) || ended,
            );
        }

        let result = match &lifecycle.result {
            Some(result) => Some(result.clone()),
            None if second.is_closed() => {
                Some(Self::synthesize_result(config, rules, &first, &second)?)
            }
            None => None,
        };

        let phase = if lifecycle.status == MatchStatus::Scheduled {
            Phase::Scheduled
        } else if lifecycle.status == MatchStatus::Completed || result.is_some() {
            Phase::Completed
        } else if !first.is_closed() {
            Phase::Live { innings: 1 }
        } else if !second.started {
            Phase::InningsBreak
        } else {
            Phase::Live { innings: 2 }
        };

        Ok(Self { phase, innings: vec![first, second], target, result })
    }

    fn innings_state(
        config: &MatchConfig,
        rules: &RulesConfig,
        toss: &Toss,
        log: &[Delivery],
        number: u8,
    ) -> Result<InningsState> {
        let batting = config.batting_team(toss, number)?;
        let bowling = config.bowling_team(toss, number)?;
        Ok(InningsState {
            number,
            batting_team_id: batting.id.clone(),
            bowling_team_id: bowling.id.clone(),
            score: InningsScore::from_log(log, number),
            max_wickets: config.max_wickets(batting, rules.players_per_team),
            started: log.iter().any(|d| d.innings == number),
            closure: None,
        })
    }

    fn synthesize_result(
        config: &MatchConfig,
        rules: &RulesConfig,
        first: &InningsState,
        second: &InningsState,
    ) -> Result<MatchResult> {
        if !second.started {
            return Ok(MatchResult::no_result());
        }
        let team_name = |id: &str| -> Result<String> {
            config
                .team(id)
                .map(|t| t.name.clone())
                .ok_or_else(|| ScoringError::InvalidConfig(format!("unknown team {id}")))
        };
        let target = first.score.runs + 1;
        let chased = second.score.runs;

        if chased >= target {
            let margin = rules.wicket_margin_base.saturating_sub(second.score.wickets);
            Ok(MatchResult {
                kind: ResultKind::WonByWickets { margin },
                result_description: format!(
                    "{} won by {}",
                    team_name(&second.batting_team_id)?,
                    plural(margin, "wicket")
                ),
                winning_team_id: Some(second.batting_team_id.clone()),
            })
        } else if chased == first.score.runs {
            Ok(MatchResult::tie())
        } else {
            let margin = target - 1 - chased;
            Ok(MatchResult {
                kind: ResultKind::WonByRuns { margin },
                result_description: format!(
                    "{} won by {}",
                    team_name(&first.batting_team_id)?,
                    plural(margin, "run")
                ),
                winning_team_id: Some(first.batting_team_id.clone()),
            })
        }
    }

    pub fn innings(&self, number: u8) -> Option<&InningsState> {
        self.innings.iter().find(|i| i.number == number)
    }

    /// The innings a new delivery would belong to.
    pub fn active_innings(&self) -> Option<u8> {
        match self.phase {
            Phase::Live { innings } => Some(innings),
            Phase::InningsBreak => Some(2),
            Phase::Scheduled | Phase::Completed => None,
        }
    }
}
