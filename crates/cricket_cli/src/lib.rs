//! Match files and plain-text rendering for the `scorebook` binary.
//!
//! A match file is JSON: the fixture configuration, the persisted lifecycle
//! (optional; a configured toss starts the match when it is absent) and the
//! deliveries in the flat wire shape.

use anyhow::{Context, Result};
use cricket_core::api::DeliveryView;
use cricket_core::engine::{EngineConfig, InningsClosure, Lifecycle, MatchSession, Scorecard, Timeline, TimelineEntry};
use cricket_core::models::{Delivery, MatchConfig};
use cricket_core::replay::validate_log;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFile {
    pub config: MatchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
    #[serde(default)]
    pub deliveries: Vec<DeliveryView>,
}

impl MatchFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read match file {}", path.display()))?;
        let file: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse match file {}", path.display()))?;
        debug!(fixture = %file.config.fixture_id, deliveries = file.deliveries.len(), "match file loaded");
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write match file {}", path.display()))
    }

    /// Lifecycle from the file, or one started from the configured toss.
    pub fn lifecycle(&self) -> Result<Lifecycle> {
        if let Some(lifecycle) = &self.lifecycle {
            return Ok(lifecycle.clone());
        }
        let mut lifecycle = Lifecycle::new();
        if let Some(toss) = &self.config.toss {
            lifecycle
                .start(&self.config, toss.clone())
                .context("Configured toss cannot start the match")?;
        }
        Ok(lifecycle)
    }

    pub fn log(&self) -> Result<Vec<Delivery>> {
        self.deliveries
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, view)| {
                Delivery::try_from(view).with_context(|| format!("Delivery #{index} is malformed"))
            })
            .collect()
    }

    /// Check the log on its own, without replaying the lifecycle.
    pub fn validate(&self) -> Result<usize> {
        let log = self.log()?;
        self.config.validate().context("Invalid fixture configuration")?;
        validate_log(&log, &self.config).context("Invalid delivery log")?;
        Ok(log.len())
    }

    pub fn into_session(self, engine: EngineConfig) -> Result<MatchSession> {
        let lifecycle = self.lifecycle()?;
        let log = self.log()?;
        let fixture = self.config.fixture_id.clone();
        let session = MatchSession::restore(self.config, engine, lifecycle, log)
            .with_context(|| format!("Failed to replay fixture {fixture}"))?;
        info!(fixture = %fixture, deliveries = session.log().len(), "match replayed");
        Ok(session)
    }
}

fn closure_label(closure: InningsClosure) -> &'static str {
    match closure {
        InningsClosure::AllOut => "all out",
        InningsClosure::OversComplete => "overs complete",
        InningsClosure::TargetReached => "target reached",
        InningsClosure::Declared => "declared",
    }
}

pub fn render_summary(session: &MatchSession) -> Result<String> {
    let config = session.config();
    let summary = session.summary()?;
    let state = session.state()?;

    let mut out = String::new();
    writeln!(
        out,
        "{}: {} v {} ({} overs)",
        config.fixture_id, config.team_a.name, config.team_b.name, config.total_overs
    )?;
    for score in [&summary.score1, &summary.score2] {
        let display = score.display.as_deref().unwrap_or("yet to bat");
        writeln!(out, "  {:<20} {}", score.team_name, display)?;
    }
    if let Some(target) = state.target {
        writeln!(out, "Target: {target}")?;
    }
    match &state.result {
        Some(result) => writeln!(out, "{}", result.result_description)?,
        None => writeln!(out, "Status: {}", session.lifecycle().status)?,
    }
    if let Some(view) = session.win_probability()? {
        writeln!(out, "Win probability: {} {}%", view.favored_team_name, view.percent)?;
    }
    Ok(out)
}

pub fn render_scorecard(session: &MatchSession, card: &Scorecard) -> Result<String> {
    let config = session.config();
    let team = config
        .team(&card.batting_team_id)
        .map(|t| t.name.as_str())
        .unwrap_or(card.batting_team_id.as_str());

    let mut out = String::new();
    writeln!(out, "Innings {}: {} {}", card.innings, team, card.score.display())?;
    writeln!(out, "{:<18} {:<28} {:>4} {:>4} {:>3} {:>3} {:>7}", "Batter", "", "R", "B", "4s", "6s", "SR")?;
    for line in &card.batting {
        writeln!(
            out,
            "{:<18} {:<28} {:>4} {:>4} {:>3} {:>3} {:>7.2}",
            line.name,
            line.status.text(),
            line.runs,
            line.balls_faced,
            line.fours,
            line.sixes,
            line.strike_rate
        )?;
    }
    let extras = &card.extras;
    writeln!(
        out,
        "Extras {} (w {}, nb {}, b {}, lb {})",
        extras.total(),
        extras.wides,
        extras.no_balls,
        extras.byes,
        extras.leg_byes
    )?;
    writeln!(out, "Total {}", card.score.display())?;

    if !card.fall_of_wickets.is_empty() {
        let falls: Vec<String> = card
            .fall_of_wickets
            .iter()
            .map(|f| format!("{}-{} ({}, {})", f.wicket, f.runs, config.player_name(&f.player_out), f.overs))
            .collect();
        writeln!(out, "Fall of wickets: {}", falls.join(", "))?;
    }

    writeln!(out, "{:<18} {:>5} {:>3} {:>4} {:>3} {:>6}", "Bowler", "O", "M", "R", "W", "Econ")?;
    for line in &card.bowling {
        writeln!(
            out,
            "{:<18} {:>5} {:>3} {:>4} {:>3} {:>6.2}",
            line.name, line.overs, line.maidens, line.runs_conceded, line.wickets, line.economy
        )?;
    }
    Ok(out)
}

/// Most recent entry first, at most `limit` entries.
pub fn render_commentary(timeline: &Timeline, limit: Option<usize>) -> Result<String> {
    let mut out = String::new();
    for entry in timeline.latest_first().take(limit.unwrap_or(usize::MAX)) {
        match entry {
            TimelineEntry::Ball { label, text, .. } => writeln!(out, "{label:>5}  {text}")?,
            TimelineEntry::OverSummary {
                over,
                runs_in_over,
                score,
                bowler,
                current_run_rate,
                required_run_rate,
                ..
            } => {
                write!(
                    out,
                    "-- End of over {over}: {runs_in_over} runs, {} | {} {}-{}-{}-{} | CRR {current_run_rate:.2}",
                    score.display(),
                    bowler.name,
                    bowler.overs,
                    bowler.maidens,
                    bowler.runs_conceded,
                    bowler.wickets
                )?;
                match required_run_rate {
                    Some(rrr) => writeln!(out, " RRR {rrr:.2}")?,
                    None => writeln!(out)?,
                }
            }
            TimelineEntry::InningsBreak { batting_team_name, score, closure, target, .. } => {
                write!(
                    out,
                    "== {batting_team_name} {} ({})",
                    score.display(),
                    closure_label(*closure)
                )?;
                match target {
                    Some(target) => writeln!(out, ", target {target}")?,
                    None => writeln!(out)?,
                }
            }
            TimelineEntry::MatchResult { description, .. } => writeln!(out, "== {description}")?,
        }
    }
    Ok(out)
}
