//! Commentary/Timeline Projector
//!
//! Replays the log oldest-first into ball, over-summary, innings-break and
//! result entries. Display order is most recent first, see
//! [`Timeline::latest_first`].

use crate::engine::config::RulesConfig;
use crate::engine::lifecycle::{InningsClosure, Lifecycle, MatchState};
use crate::engine::scorecard::dismissal_text;
use crate::engine::win_probability::required_run_rate;
use crate::error::Result;
use crate::models::{
    overs_string, BallOutcome, Delivery, InningsScore, MatchConfig, BALLS_PER_OVER,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatsmanSnapshot {
    pub player_id: String,
    pub name: String,
    pub runs: u32,
    pub balls_faced: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BowlerFigures {
    pub player_id: String,
    pub name: String,
    pub overs: String,
    pub maidens: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEntry {
    #[serde(rename_all = "camelCase")]
    Ball {
        innings: u8,
        over_number: u32,
        ball_number: u32,
        /// `over.ball`, e.g. `"3.4"`
        label: String,
        text: String,
        runs: u32,
        is_wicket: bool,
        score: InningsScore,
    },
    #[serde(rename_all = "camelCase")]
    OverSummary {
        innings: u8,
        /// 1-based count of completed overs
        over: u32,
        runs_in_over: u32,
        score: InningsScore,
        batsmen: Vec<BatsmanSnapshot>,
        bowler: BowlerFigures,
        current_run_rate: f64,
        required_run_rate: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    InningsBreak {
        innings: u8,
        batting_team_name: String,
        score: InningsScore,
        closure: InningsClosure,
        /// Runs the chasing side needs; only after innings 1
        target: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    MatchResult {
        description: String,
        winning_team_id: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Display order.
    pub fn latest_first(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
struct BowlerTally {
    legal_balls: u32,
    runs: u32,
    wickets: u32,
    maidens: u32,
}

/// Text for one delivery, e.g. `"Evans to Ahmed, FOUR"`.
pub fn ball_text(config: &MatchConfig, delivery: &Delivery) -> String {
    let runs = |n: u32, one: &str, many: &str| {
        if n == 1 {
            format!("1 {one}")
        } else {
            format!("{n} {many}")
        }
    };
    let what = match delivery.outcome {
        BallOutcome::Runs { off_bat: 0 } => "no run".to_string(),
        BallOutcome::Runs { off_bat: 4 } => "FOUR".to_string(),
        BallOutcome::Runs { off_bat: 6 } => "SIX".to_string(),
        BallOutcome::Runs { off_bat } => runs(off_bat, "run", "runs"),
        BallOutcome::Wide { runs: 1 } => "wide".to_string(),
        BallOutcome::Wide { runs: n } => runs(n, "wide", "wides"),
        BallOutcome::NoBall { off_bat: 0 } => "no ball".to_string(),
        BallOutcome::NoBall { off_bat } => format!("no ball, {}", runs(off_bat, "run", "runs")),
        BallOutcome::Bye { runs: n } => runs(n, "bye", "byes"),
        BallOutcome::LegBye { runs: n } => runs(n, "leg bye", "leg byes"),
    };
    let mut text = format!(
        "{} to {}, {what}",
        config.player_name(&delivery.bowler),
        config.player_name(&delivery.striker)
    );
    if let (Some(out), Some(how)) = (delivery.player_out(), dismissal_text(config, delivery)) {
        text.push_str(&format!(", OUT! {} {how}", config.player_name(out)));
    }
    text
}

/// Project the whole match into a timeline. Empty before the toss.
pub fn project_timeline(
    config: &MatchConfig,
    rules: &RulesConfig,
    lifecycle: &Lifecycle,
    log: &[Delivery],
) -> Result<Timeline> {
    let state = MatchState::derive(config, rules, lifecycle, log)?;
    let mut timeline = Timeline::default();
    if state.innings.is_empty() {
        return Ok(timeline);
    }

    for innings in &state.innings {
        if !innings.started {
            continue;
        }
        let deliveries: Vec<&Delivery> = log.iter().filter(|d| d.innings == innings.number).collect();
        let target = if innings.number == 2 { state.target } else { None };

        let mut score = InningsScore::default();
        let mut batting: HashMap<&str, (u32, u32)> = HashMap::new();
        let mut bowling: HashMap<&str, BowlerTally> = HashMap::new();
        let mut over_runs = 0u32;
        let mut over_bowler_runs = 0u32;
        let mut legal_in_over = 0u32;

        for (idx, d) in deliveries.iter().enumerate() {
            score.apply(d);
            over_runs += d.total_runs();
            over_bowler_runs += d.outcome.bowler_runs();

            let bat = batting.entry(d.striker.as_str()).or_default();
            bat.0 += d.runs_off_bat();
            if d.outcome.counts_as_faced() {
                bat.1 += 1;
            }
            let bowl = bowling.entry(d.bowler.as_str()).or_default();
            bowl.runs += d.outcome.bowler_runs();
            if d.is_legal() {
                bowl.legal_balls += 1;
                legal_in_over += 1;
            }
            if d.dismissal.as_ref().is_some_and(|x| x.kind.credited_to_bowler()) {
                bowl.wickets += 1;
            }

            timeline.entries.push(TimelineEntry::Ball {
                innings: innings.number,
                over_number: d.over_number,
                ball_number: d.ball_number,
                label: format!("{}.{}", d.over_number, d.ball_number),
                text: ball_text(config, d),
                runs: d.total_runs(),
                is_wicket: d.is_wicket(),
                score: score.clone(),
            });

            let last = idx + 1 == deliveries.len();
            let bowled_out_here = last && innings.closure == Some(InningsClosure::AllOut);
            if legal_in_over == BALLS_PER_OVER {
                if over_bowler_runs == 0 {
                    bowl.maidens += 1;
                }
                let figures = BowlerFigures {
                    player_id: d.bowler.clone(),
                    name: config.player_name(&d.bowler).to_string(),
                    overs: overs_string(bowl.legal_balls),
                    maidens: bowl.maidens,
                    runs_conceded: bowl.runs,
                    wickets: bowl.wickets,
                };
                if !bowled_out_here {
                    let batsmen = [d.striker.as_str(), d.non_striker.as_str()]
                        .into_iter()
                        .filter(|id| d.player_out() != Some(*id))
                        .map(|id| {
                            let (runs, balls_faced) = batting.get(id).copied().unwrap_or_default();
                            BatsmanSnapshot {
                                player_id: id.to_string(),
                                name: config.player_name(id).to_string(),
                                runs,
                                balls_faced,
                            }
                        })
                        .collect();
                    let required = target.map(|t| {
                        required_run_rate(
                            t.saturating_sub(score.runs),
                            config.total_balls().saturating_sub(score.legal_balls),
                        )
                    });
                    timeline.entries.push(TimelineEntry::OverSummary {
                        innings: innings.number,
                        over: d.over_number + 1,
                        runs_in_over: over_runs,
                        score: score.clone(),
                        batsmen,
                        bowler: figures,
                        current_run_rate: score.run_rate(),
                        required_run_rate: required,
                    });
                }
                over_runs = 0;
                over_bowler_runs = 0;
                legal_in_over = 0;
            }
        }

        if let Some(closure) = innings.closure {
            let batting_team_name = config
                .team(&innings.batting_team_id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| innings.batting_team_id.clone());
            timeline.entries.push(TimelineEntry::InningsBreak {
                innings: innings.number,
                batting_team_name,
                score: innings.score.clone(),
                closure,
                target: if innings.number == 1 { state.target } else { None },
            });
        }
    }

    if let Some(result) = &state.result {
        timeline.entries.push(TimelineEntry::MatchResult {
            description: result.result_description.clone(),
            winning_team_id: result.winning_team_id.clone(),
        });
    }
    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recorder::{record_delivery, DeliveryInput, Selection};
    use crate::models::{Dismissal, Player, PlayerRole, Team, Toss, TossDecision, WicketType};

    fn config(overs: u32, batters: usize) -> MatchConfig {
        let squad = |p: &str, n: usize| {
            (1..=n)
                .map(|i| Player::new(format!("{p}{i}"), format!("{}{i}", p.to_uppercase()), PlayerRole::AllRounder))
                .collect::<Vec<_>>()
        };
        MatchConfig::new("fx", Team::new("h", "Home", squad("h", batters)), Team::new("a", "Away", squad("a", 4)), overs)
    }

    struct Match {
        cfg: MatchConfig,
        rules: RulesConfig,
        lifecycle: Lifecycle,
        log: Vec<Delivery>,
    }

    impl Match {
        fn new(cfg: MatchConfig) -> Self {
            let mut lifecycle = Lifecycle::new();
            lifecycle.start(&cfg, Toss::new("h", TossDecision::Bat)).unwrap();
            Self { cfg, rules: RulesConfig::default(), lifecycle, log: Vec::new() }
        }

        fn bowl(&mut self, innings: u8, s: &str, n: &str, b: &str, outcome: BallOutcome, out: Option<Dismissal>) {
            let mut input = DeliveryInput::new(innings, Selection::new(s, n, b), outcome);
            if let Some(d) = out {
                input = input.with_dismissal(d);
            }
            let recorded = record_delivery(&self.log, &self.cfg, &self.rules, &self.lifecycle, &input).unwrap();
            self.log.push(recorded.delivery);
            self.lifecycle.complete_if_finished(&self.cfg, &self.rules, &self.log).unwrap();
        }

        fn timeline(&self) -> Timeline {
            project_timeline(&self.cfg, &self.rules, &self.lifecycle, &self.log).unwrap()
        }
    }

    fn kinds(timeline: &Timeline) -> Vec<&'static str> {
        timeline
            .entries
            .iter()
            .map(|e| match e {
                TimelineEntry::Ball { .. } => "ball",
                TimelineEntry::OverSummary { .. } => "over",
                TimelineEntry::InningsBreak { .. } => "break",
                TimelineEntry::MatchResult { .. } => "result",
            })
            .collect()
    }

    #[test]
    fn test_over_summary_and_innings_break() {
        let mut m = Match::new(config(1, 4));
        m.bowl(1, "h1", "h2", "a1", BallOutcome::Runs { off_bat: 4 }, None);
        m.bowl(1, "h1", "h2", "a1", BallOutcome::Wide { runs: 1 }, None);
        for _ in 0..5 {
            m.bowl(1, "h1", "h2", "a1", BallOutcome::dot(), None);
        }
        let timeline = m.timeline();
        assert_eq!(kinds(&timeline), vec!["ball"; 7].into_iter().chain(["over", "break"]).collect::<Vec<_>>());

        match &timeline.entries[7] {
            TimelineEntry::OverSummary { over, runs_in_over, bowler, batsmen, required_run_rate, .. } => {
                assert_eq!(*over, 1);
                assert_eq!(*runs_in_over, 5);
                assert_eq!(bowler.overs, "1.0");
                assert_eq!(bowler.runs_conceded, 5);
                assert_eq!(batsmen.len(), 2);
                assert_eq!(batsmen[0].runs, 4);
                assert_eq!(*required_run_rate, None);
            }
            other => panic!("expected over summary, got {other:?}"),
        }
        match &timeline.entries[8] {
            TimelineEntry::InningsBreak { innings, target, closure, .. } => {
                assert_eq!(*innings, 1);
                assert_eq!(*target, Some(6));
                assert_eq!(*closure, InningsClosure::OversComplete);
            }
            other => panic!("expected innings break, got {other:?}"),
        }
    }

    #[test]
    fn test_bowled_out_suppresses_over_summary() {
        // three batters: two wickets end the innings
        let mut m = Match::new(config(2, 3));
        for _ in 0..4 {
            m.bowl(1, "h1", "h2", "a1", BallOutcome::dot(), None);
        }
        m.bowl(1, "h1", "h2", "a1", BallOutcome::dot(), Some(Dismissal::new(WicketType::Bowled, "h1")));
        m.bowl(1, "h3", "h2", "a1", BallOutcome::dot(), Some(Dismissal::new(WicketType::Lbw, "h3")));

        let timeline = m.timeline();
        let kinds = kinds(&timeline);
        assert!(!kinds.contains(&"over"));
        assert_eq!(kinds.last(), Some(&"break"));
        assert_eq!(timeline.latest_first().count(), 7);
    }

    #[test]
    fn test_result_closes_timeline() {
        let mut m = Match::new(config(1, 4));
        for _ in 0..6 {
            m.bowl(1, "h1", "h2", "a1", BallOutcome::dot(), None);
        }
        m.bowl(2, "a1", "a2", "h1", BallOutcome::Runs { off_bat: 1 }, None);

        let timeline = m.timeline();
        assert!(matches!(
            timeline.latest_first().next(),
            Some(TimelineEntry::MatchResult { description, winning_team_id: Some(w) })
                if description == "Away won by 10 wickets" && w == "a"
        ));
        // innings 2 break sits just before the result and carries no target
        assert!(matches!(
            timeline.latest_first().nth(1),
            Some(TimelineEntry::InningsBreak { innings: 2, target: None, .. })
        ));
    }

    #[test]
    fn test_ball_text() {
        let cfg = config(1, 4);
        let mut d = Delivery {
            innings: 1,
            over_number: 0,
            ball_number: 1,
            striker: "h1".into(),
            non_striker: "h2".into(),
            bowler: "a2".into(),
            outcome: BallOutcome::NoBall { off_bat: 1 },
            dismissal: None,
        };
        assert_eq!(ball_text(&cfg, &d), "A2 to H1, no ball, 1 run");

        d.outcome = BallOutcome::dot();
        d.dismissal = Some(Dismissal::new(WicketType::Caught, "h1").with_fielder("a3"));
        assert_eq!(ball_text(&cfg, &d), "A2 to H1, no run, OUT! H1 c A3 b A2");
    }

    #[test]
    fn test_empty_before_toss() {
        let cfg = config(1, 4);
        let timeline = project_timeline(&cfg, &RulesConfig::default(), &Lifecycle::new(), &[]).unwrap();
        assert!(timeline.is_empty());
    }
}
