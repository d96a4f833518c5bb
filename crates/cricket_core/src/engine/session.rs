//! Match session
//!
//! Owns one fixture's configuration, lifecycle record and delivery log and
//! routes every write through the recorder and lifecycle rules. Reads are pure
//! projections of the log; the optional [`ReplayCache`] only short-circuits
//! re-derivation when its fingerprint still matches.

use crate::engine::commentary::{project_timeline, Timeline};
use crate::engine::config::EngineConfig;
use crate::engine::eligibility::{eligible_bowlers, over_progress};
use crate::engine::lifecycle::{Lifecycle, LifecycleUpdate, MatchResult, MatchState, Phase};
use crate::engine::recorder::{self, next_selection, DeliveryInput, Recorded, Selection};
use crate::engine::scorecard::{project_scorecard, Scorecard};
use crate::engine::win_probability::{win_probability_view, WinProbabilityView};
use crate::error::{Result, ScoringError};
use crate::models::{Delivery, MatchConfig, Player, Team, Toss};
use crate::replay::{validate_log, validate_progression, ReplayCache};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One side's line on the scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamScore {
    pub team_id: String,
    pub team_name: String,
    /// Innings this side batted in, once it has been fixed by the toss
    pub innings: Option<u8>,
    pub runs: u32,
    pub wickets: u32,
    pub overs: String,
    /// `"160/6 (20.0)"`, or `None` before the side has batted
    pub display: Option<String>,
}

/// `score1` is the first listed team of the fixture, `score2` the second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub score1: TeamScore,
    pub score2: TeamScore,
}

#[derive(Debug, Clone)]
pub struct MatchSession {
    config: MatchConfig,
    engine: EngineConfig,
    lifecycle: Lifecycle,
    log: Vec<Delivery>,
    cache: Option<ReplayCache>,
}

impl MatchSession {
    /// A scheduled fixture with an empty log.
    pub fn new(config: MatchConfig, engine: EngineConfig) -> Result<Self> {
        config.validate()?;
        engine.validate()?;
        Ok(Self { config, engine, lifecycle: Lifecycle::new(), log: Vec::new(), cache: None })
    }

    /// Rebuild a session from persisted lifecycle signals and a stored log.
    pub fn restore(
        config: MatchConfig,
        engine: EngineConfig,
        lifecycle: Lifecycle,
        log: Vec<Delivery>,
    ) -> Result<Self> {
        config.validate()?;
        engine.validate()?;
        validate_log(&log, &config)?;
        validate_progression(&log, &config, &engine.rules, &lifecycle)?;

        let mut session = Self { config, engine, lifecycle, log, cache: None };
        session.refresh_cache()?;
        info!(
            fixture = %session.config.fixture_id,
            deliveries = session.log.len(),
            status = %session.lifecycle.status,
            "session restored"
        );
        Ok(session)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn log(&self) -> &[Delivery] {
        &self.log
    }

    pub fn cache(&self) -> Option<&ReplayCache> {
        self.cache.as_ref()
    }

    /// Adopt a previously persisted cache after checking it against a replay.
    ///
    /// A stale cache is ignored. A cache that disagrees with the replay is
    /// dropped and reported as `InconsistentReplay`; the session itself stays usable.
    pub fn attach_cache(&mut self, cache: ReplayCache) -> Result<()> {
        if !cache.is_fresh(&self.lifecycle, &self.log)? {
            debug!(fixture = %self.config.fixture_id, "ignoring stale replay cache");
            return Ok(());
        }
        let replayed = self.derive()?;
        if let Err(e) = cache.verify(&replayed) {
            warn!(fixture = %self.config.fixture_id, error = %e, "replay cache dropped");
            self.cache = None;
            return Err(e);
        }
        self.cache = Some(cache);
        Ok(())
    }

    // ========== Writes ==========

    pub fn start(&mut self, toss: Toss) -> Result<()> {
        self.lifecycle.start(&self.config, toss)?;
        self.refresh_cache()
    }

    pub fn apply_update(&mut self, update: &LifecycleUpdate) -> Result<()> {
        self.lifecycle.apply_update(&self.config, &self.engine.rules, &self.log, update)?;
        self.refresh_cache()
    }

    /// Validate and append one delivery. Nothing is appended on error.
    pub fn record_delivery(&mut self, input: &DeliveryInput) -> Result<Recorded> {
        let recorded = recorder::record_delivery(
            &self.log,
            &self.config,
            &self.engine.rules,
            &self.lifecycle,
            input,
        )
        .map_err(|e| {
            debug!(fixture = %self.config.fixture_id, error = %e, "delivery rejected");
            e
        })?;

        self.log.push(recorded.delivery.clone());
        if let Some(closure) = recorded.innings_closed {
            info!(
                fixture = %self.config.fixture_id,
                innings = recorded.delivery.innings,
                ?closure,
                "innings closed"
            );
        }
        self.lifecycle.complete_if_finished(&self.config, &self.engine.rules, &self.log)?;
        self.refresh_cache()?;
        Ok(recorded)
    }

    pub fn declare_innings(&mut self, innings: u8) -> Result<()> {
        self.lifecycle.declare_innings(&self.config, &self.engine.rules, &self.log, innings)?;
        self.refresh_cache()
    }

    pub fn end_match(&mut self) -> Result<MatchResult> {
        let result = self.lifecycle.end_match(&self.config, &self.engine.rules, &self.log)?;
        self.refresh_cache()?;
        Ok(result)
    }

    fn refresh_cache(&mut self) -> Result<()> {
        let state = self.derive()?;
        self.cache = Some(ReplayCache::capture(&self.lifecycle, &self.log, state)?);
        Ok(())
    }

    // ========== Reads ==========

    fn derive(&self) -> Result<MatchState> {
        MatchState::derive(&self.config, &self.engine.rules, &self.lifecycle, &self.log)
    }

    pub fn state(&self) -> Result<MatchState> {
        if let Some(cache) = &self.cache {
            if cache.is_fresh(&self.lifecycle, &self.log)? {
                return Ok(cache.state.clone());
            }
        }
        self.derive()
    }

    pub fn phase(&self) -> Result<Phase> {
        Ok(self.state()?.phase)
    }

    pub fn summary(&self) -> Result<MatchSummary> {
        let state = self.state()?;
        Ok(MatchSummary {
            score1: team_score(&self.config.team_a, &state),
            score2: team_score(&self.config.team_b, &state),
        })
    }

    pub fn scorecard(&self, innings: u8) -> Result<Scorecard> {
        let toss = self.toss()?;
        project_scorecard(&self.log, innings, &self.config, toss)
    }

    pub fn commentary(&self) -> Result<Timeline> {
        project_timeline(&self.config, &self.engine.rules, &self.lifecycle, &self.log)
    }

    pub fn win_probability(&self) -> Result<Option<WinProbabilityView>> {
        let state = self.state()?;
        Ok(win_probability_view(&self.config, &state, &self.engine.win_probability))
    }

    /// Bowlers allowed to take the next ball of the active innings.
    pub fn eligible_bowlers(&self) -> Result<Vec<&Player>> {
        let toss = self.toss()?;
        let innings = self.active_innings()?;
        eligible_bowlers(&self.log, &self.config, toss, innings)
    }

    /// Where the batsmen and bowler stand for the next ball, as left by the
    /// last delivery. Empty at the start of an innings and once play is over.
    pub fn suggested_selection(&self) -> Result<Selection> {
        let state = self.state()?;
        let Some(innings) = state.active_innings() else {
            return Ok(Selection::default());
        };
        let Some(last) = self.log.iter().rev().find(|d| d.innings == innings) else {
            return Ok(Selection::default());
        };
        let over_completed = over_progress(&self.log, innings).is_complete();
        Ok(next_selection(last, over_completed))
    }

    fn toss(&self) -> Result<&Toss> {
        self.lifecycle.toss.as_ref().ok_or_else(|| ScoringError::MatchNotLive {
            status: self.lifecycle.status.to_string(),
        })
    }

    fn active_innings(&self) -> Result<u8> {
        self.state()?.active_innings().ok_or_else(|| ScoringError::MatchNotLive {
            status: self.lifecycle.status.to_string(),
        })
    }
}

fn team_score(team: &Team, state: &MatchState) -> TeamScore {
    let innings = state.innings.iter().find(|i| i.batting_team_id == team.id);
    let batted = innings.filter(|i| i.started || i.is_closed());
    TeamScore {
        team_id: team.id.clone(),
        team_name: team.name.clone(),
        innings: innings.map(|i| i.number),
        runs: innings.map_or(0, |i| i.score.runs),
        wickets: innings.map_or(0, |i| i.score.wickets),
        overs: innings.map_or_else(|| "0.0".to_string(), |i| i.score.overs()),
        display: batted.map(|i| i.score.display()),
    }
}
