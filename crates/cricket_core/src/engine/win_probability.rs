//! Win-Probability Estimator
//!
//! Stateless heuristic on `(runs needed, balls remaining, wickets in hand)`.
//! Band edges and adjustments come from [`WinProbabilityConfig`].

use crate::engine::config::WinProbabilityConfig;
use crate::engine::lifecycle::{MatchState, Phase};
use crate::models::{MatchConfig, BALLS_PER_OVER};
use serde::{Deserialize, Serialize};

/// Required run rate reported when no balls remain.
pub const NO_BALLS_REMAINING_RRR: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Chasing,
    Defending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinProbability {
    pub favored: Side,
    /// 1..=99, or exactly 100 once the chase is decided
    pub percent: u32,
}

/// Runs needed per six balls.
pub fn required_run_rate(runs_needed: u32, balls_remaining: u32) -> f64 {
    if balls_remaining == 0 {
        return NO_BALLS_REMAINING_RRR;
    }
    runs_needed as f64 / (balls_remaining as f64 / BALLS_PER_OVER as f64)
}

pub fn estimate(
    runs_needed: u32,
    balls_remaining: u32,
    wickets_in_hand: u32,
    cfg: &WinProbabilityConfig,
) -> WinProbability {
    if runs_needed == 0 {
        return WinProbability { favored: Side::Chasing, percent: 100 };
    }
    if balls_remaining == 0 || wickets_in_hand == 0 {
        return WinProbability { favored: Side::Defending, percent: 100 };
    }

    let rrr = required_run_rate(runs_needed, balls_remaining);
    let mut p = cfg.neutral;

    if rrr <= cfg.comfortable_rrr {
        p += cfg.comfortable_bonus;
    } else if rrr <= cfg.steady_rrr {
        p += cfg.steady_bonus;
    } else if rrr > cfg.steep_rrr {
        p -= cfg.steep_penalty;
    } else if rrr > cfg.stretched_rrr {
        p -= cfg.stretched_penalty;
    }

    if wickets_in_hand >= cfg.deep_batting_wickets {
        p += cfg.deep_batting_bonus;
    } else if wickets_in_hand <= cfg.collapse_wickets {
        p -= cfg.collapse_penalty;
    }

    if balls_remaining < cfg.final_balls && runs_needed > cfg.final_runs {
        p -= cfg.final_penalty;
    }

    let p = p.clamp(cfg.floor, cfg.ceiling);
    if p >= 50 {
        WinProbability { favored: Side::Chasing, percent: p as u32 }
    } else {
        WinProbability { favored: Side::Defending, percent: (100 - p) as u32 }
    }
}

/// Outbound `{favoredTeamName, percent}` tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinProbabilityView {
    pub favored_team_name: String,
    pub percent: u32,
}

/// Estimate for the current chase. `None` outside a live second innings.
pub fn win_probability_view(
    config: &MatchConfig,
    state: &MatchState,
    cfg: &WinProbabilityConfig,
) -> Option<WinProbabilityView> {
    if state.phase != (Phase::Live { innings: 2 }) {
        return None;
    }
    let target = state.target?;
    let chase = state.innings(2)?;

    let runs_needed = target.saturating_sub(chase.score.runs);
    let balls_remaining = config.total_balls().saturating_sub(chase.score.legal_balls);
    let wickets_in_hand = chase.max_wickets.saturating_sub(chase.score.wickets);
    let estimate = estimate(runs_needed, balls_remaining, wickets_in_hand, cfg);

    let team_id = match estimate.favored {
        Side::Chasing => &chase.batting_team_id,
        Side::Defending => &chase.bowling_team_id,
    };
    let favored_team_name = config.team(team_id)?.name.clone();
    Some(WinProbabilityView { favored_team_name, percent: estimate.percent })
}
