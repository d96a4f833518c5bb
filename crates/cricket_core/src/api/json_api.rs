use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::lifecycle::{InningsClosure, LifecycleUpdate, MatchResult, MatchStatus, Phase};
use crate::engine::recorder::{DeliveryInput, Selection};
use crate::engine::session::{MatchSession, MatchSummary};
use crate::error::{Result, ScoringError};
use crate::models::{BallOutcome, Delivery, Dismissal, ExtraType, Toss, WicketType};

/// Inbound delivery in the flat wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    pub innings: u8,
    #[serde(default)]
    pub striker_id: Option<String>,
    #[serde(default)]
    pub non_striker_id: Option<String>,
    #[serde(default)]
    pub bowler_id: Option<String>,
    #[serde(default)]
    pub runs_off_bat: u32,
    #[serde(default)]
    pub extra_runs: u32,
    #[serde(default)]
    pub extra_type: ExtraType,
    #[serde(default)]
    pub is_wicket: bool,
    #[serde(default)]
    pub wicket_type: Option<WicketType>,
    #[serde(default)]
    pub player_out_id: Option<String>,
    #[serde(default)]
    pub fielder_id: Option<String>,
}

impl TryFrom<DeliveryRequest> for DeliveryInput {
    type Error = ScoringError;

    fn try_from(req: DeliveryRequest) -> Result<Self> {
        let outcome = BallOutcome::from_parts(req.extra_type, req.runs_off_bat, req.extra_runs)?;
        let dismissal = if req.is_wicket {
            let kind = req
                .wicket_type
                .ok_or_else(|| ScoringError::InvalidDismissal("wicket type is missing".into()))?;
            let player_out = req
                .player_out_id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ScoringError::InvalidDismissal("player out is missing".into()))?;
            Some(Dismissal { kind, player_out, fielder: req.fielder_id })
        } else {
            if req.wicket_type.is_some() || req.player_out_id.is_some() || req.fielder_id.is_some() {
                return Err(ScoringError::InvalidDelivery(
                    "wicket details supplied without isWicket".into(),
                ));
            }
            None
        };
        let selection = Selection {
            striker: req.striker_id.filter(|id| !id.is_empty()),
            non_striker: req.non_striker_id.filter(|id| !id.is_empty()),
            bowler: req.bowler_id.filter(|id| !id.is_empty()),
        };
        Ok(DeliveryInput { innings: req.innings, selection, outcome, dismissal })
    }
}

/// Outbound delivery in the flat wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryView {
    pub innings: u8,
    pub over_number: u32,
    pub ball_number: u32,
    pub striker_id: String,
    pub non_striker_id: String,
    pub bowler_id: String,
    pub runs_off_bat: u32,
    pub extra_runs: u32,
    pub extra_type: ExtraType,
    pub is_wicket: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wicket_type: Option<WicketType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_out_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fielder_id: Option<String>,
}

impl From<&Delivery> for DeliveryView {
    fn from(d: &Delivery) -> Self {
        Self {
            innings: d.innings,
            over_number: d.over_number,
            ball_number: d.ball_number,
            striker_id: d.striker.clone(),
            non_striker_id: d.non_striker.clone(),
            bowler_id: d.bowler.clone(),
            runs_off_bat: d.runs_off_bat(),
            extra_runs: d.extra_runs(),
            extra_type: d.extra_type(),
            is_wicket: d.is_wicket(),
            wicket_type: d.wicket_type(),
            player_out_id: d.player_out().map(str::to_string),
            fielder_id: d.fielder().map(str::to_string),
        }
    }
}

impl TryFrom<DeliveryView> for Delivery {
    type Error = ScoringError;

    fn try_from(view: DeliveryView) -> Result<Self> {
        let outcome = BallOutcome::from_parts(view.extra_type, view.runs_off_bat, view.extra_runs)?;
        let dismissal = match (view.is_wicket, view.wicket_type, view.player_out_id) {
            (true, Some(kind), Some(player_out)) => {
                Some(Dismissal { kind, player_out, fielder: view.fielder_id })
            }
            (false, None, None) => None,
            _ => {
                return Err(ScoringError::InvalidDismissal(format!(
                    "delivery {}.{} has incomplete wicket details",
                    view.over_number, view.ball_number
                )))
            }
        };
        Ok(Delivery {
            innings: view.innings,
            over_number: view.over_number,
            ball_number: view.ball_number,
            striker: view.striker_id,
            non_striker: view.non_striker_id,
            bowler: view.bowler_id,
            outcome,
            dismissal,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureView {
    pub fixture_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub team_a: TeamRef,
    pub team_b: TeamRef,
    pub total_overs: u32,
    pub status: MatchStatus,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toss: Option<Toss>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_team_id: Option<String>,
}

/// Everything a scoreboard needs to render the current match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub schema_version: u8,
    pub fixture: FixtureView,
    pub summary: MatchSummary,
    pub deliveries: Vec<DeliveryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub delivery: DeliveryView,
    pub next: Selection,
    pub over_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub innings_closed: Option<InningsClosure>,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
}

pub fn fixture_view(session: &MatchSession) -> Result<FixtureView> {
    let config = session.config();
    let state = session.state()?;
    let result = state.result.as_ref();
    Ok(FixtureView {
        fixture_id: config.fixture_id.clone(),
        venue: config.venue.clone(),
        scheduled_at: config.scheduled_at,
        team_a: TeamRef { id: config.team_a.id.clone(), name: config.team_a.name.clone() },
        team_b: TeamRef { id: config.team_b.id.clone(), name: config.team_b.name.clone() },
        total_overs: config.total_overs,
        status: session.lifecycle().status,
        phase: state.phase,
        toss: session.lifecycle().toss.clone(),
        target: state.target,
        result_description: result.map(|r| r.result_description.clone()),
        winning_team_id: result.and_then(|r| r.winning_team_id.clone()),
    })
}

pub fn snapshot(session: &MatchSession) -> Result<MatchSnapshot> {
    Ok(MatchSnapshot {
        schema_version: crate::SCHEMA_VERSION,
        fixture: fixture_view(session)?,
        summary: session.summary()?,
        deliveries: session.log().iter().map(DeliveryView::from).collect(),
    })
}

/// Parse a `DeliveryRequest`, record it and return a `RecordResponse`.
pub fn record_delivery_json(session: &mut MatchSession, request_json: &str) -> Result<String> {
    let request: DeliveryRequest = serde_json::from_str(request_json)
        .map_err(|e| ScoringError::InvalidDelivery(format!("Invalid JSON request: {e}")))?;
    let input = DeliveryInput::try_from(request)?;
    let recorded = session.record_delivery(&input)?;
    let state = session.state()?;

    let response = RecordResponse {
        delivery: DeliveryView::from(&recorded.delivery),
        next: recorded.next,
        over_completed: recorded.over_completed,
        innings_closed: recorded.innings_closed,
        phase: state.phase,
        result: state.result,
    };
    Ok(serde_json::to_string(&response)?)
}

/// Apply a `LifecycleUpdate` and return the updated fixture view.
pub fn lifecycle_update_json(session: &mut MatchSession, update_json: &str) -> Result<String> {
    let update: LifecycleUpdate = serde_json::from_str(update_json)
        .map_err(|e| ScoringError::InvalidTransition(format!("Invalid JSON request: {e}")))?;
    session.apply_update(&update)?;
    Ok(serde_json::to_string(&fixture_view(session)?)?)
}

pub fn snapshot_json(session: &MatchSession) -> Result<String> {
    Ok(serde_json::to_string(&snapshot(session)?)?)
}

pub fn scorecard_json(session: &MatchSession, innings: u8) -> Result<String> {
    Ok(serde_json::to_string(&session.scorecard(innings)?)?)
}

/// Timeline entries in display order, most recent first, at most `limit` of them.
pub fn commentary_json(session: &MatchSession, limit: Option<usize>) -> Result<String> {
    let timeline = session.commentary()?;
    let entries: Vec<_> = timeline.latest_first().take(limit.unwrap_or(usize::MAX)).collect();
    Ok(serde_json::to_string(&entries)?)
}

/// `{favoredTeamName, percent}`, or `null` outside a live chase.
pub fn win_probability_json(session: &MatchSession) -> Result<String> {
    Ok(serde_json::to_string(&session.win_probability()?)?)
}
