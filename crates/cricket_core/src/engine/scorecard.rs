//! Aggregation Engine
//!
//! A single pure fold over one innings of the log producing batting and
//! bowling figures. Projecting the same log twice always yields the same card.

use crate::error::{Result, ScoringError};
use crate::models::{
    overs_string, Delivery, ExtraType, Extras, FallOfWicket, InningsScore, MatchConfig, PlayerId,
    Team, Toss, WicketType, BALLS_PER_OVER,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum BattingStatus {
    DidNotBat,
    NotOut,
    Out(String),
}

impl BattingStatus {
    pub fn text(&self) -> &str {
        match self {
            BattingStatus::DidNotBat => "did not bat",
            BattingStatus::NotOut => "not out",
            BattingStatus::Out(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattingLine {
    pub player_id: PlayerId,
    pub name: String,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: f64,
    pub status: BattingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BowlingLine {
    pub player_id: PlayerId,
    pub name: String,
    pub legal_balls: u32,
    pub overs: String,
    pub maidens: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
    pub wides: u32,
    pub no_balls: u32,
    pub economy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub innings: u8,
    pub batting_team_id: String,
    pub bowling_team_id: String,
    pub score: InningsScore,
    pub overs: String,
    pub extras: Extras,
    pub batting: Vec<BattingLine>,
    pub bowling: Vec<BowlingLine>,
    pub fall_of_wickets: Vec<FallOfWicket>,
}

impl Scorecard {
    pub fn batting_line(&self, player_id: &str) -> Option<&BattingLine> {
        self.batting.iter().find(|b| b.player_id == player_id)
    }

    pub fn bowling_line(&self, player_id: &str) -> Option<&BowlingLine> {
        self.bowling.iter().find(|b| b.player_id == player_id)
    }
}

#[derive(Debug, Default, Clone)]
struct BatTally {
    runs: u32,
    balls: u32,
    fours: u32,
    sixes: u32,
    dismissal: Option<String>,
    /// Order of first appearance at the crease
    appeared_at: Option<usize>,
}

#[derive(Debug, Default, Clone)]
struct BowlTally {
    legal_balls: u32,
    runs: u32,
    wickets: u32,
    wides: u32,
    no_balls: u32,
    maidens: u32,
    first_ball_at: usize,
}

/// Scorecard text for a dismissal, e.g. `"c Smith b Jones"`.
pub fn dismissal_text(config: &MatchConfig, delivery: &Delivery) -> Option<String> {
    let dismissal = delivery.dismissal.as_ref()?;
    let bowler = config.player_name(&delivery.bowler);
    let fielder = dismissal.fielder.as_deref().map(|f| config.player_name(f));
    let text = match dismissal.kind {
        WicketType::Bowled => format!("b {bowler}"),
        WicketType::Caught => match dismissal.fielder.as_deref() {
            Some(f) if f == delivery.bowler => format!("c & b {bowler}"),
            Some(_) => format!("c {} b {bowler}", fielder.unwrap_or_default()),
            None => format!("caught b {bowler}"),
        },
        WicketType::Lbw => format!("lbw b {bowler}"),
        WicketType::RunOut => match fielder {
            Some(f) => format!("run out ({f})"),
            None => "run out".to_string(),
        },
        WicketType::Stumped => match fielder {
            Some(f) => format!("st {f} b {bowler}"),
            None => format!("stumped b {bowler}"),
        },
        WicketType::HitWicket => format!("hit wicket b {bowler}"),
    };
    Some(text)
}

/// Project one innings of the log into a scorecard. O(events).
pub fn project_scorecard(
    log: &[Delivery],
    innings: u8,
    config: &MatchConfig,
    toss: &Toss,
) -> Result<Scorecard> {
    if !(1..=2).contains(&innings) {
        return Err(ScoringError::InvalidConfig(format!("no innings {innings}")));
    }
    let batting_team = config.batting_team(toss, innings)?;
    let bowling_team = config.bowling_team(toss, innings)?;

    let mut score = InningsScore::default();
    let mut extras = Extras::default();
    let mut fall_of_wickets = Vec::new();
    let mut bat: HashMap<&str, BatTally> = HashMap::new();
    let mut bowl: HashMap<&str, BowlTally> = HashMap::new();
    let mut appearances = 0usize;
    // (bowler, over) -> runs conceded and legal balls, for maidens
    let mut overs: HashMap<(u32, &str), (u32, u32)> = HashMap::new();

    for (idx, d) in log.iter().filter(|d| d.innings == innings).enumerate() {
        score.apply(d);
        extras.apply(d);

        for id in [d.striker.as_str(), d.non_striker.as_str()] {
            let tally = bat.entry(id).or_default();
            if tally.appeared_at.is_none() {
                tally.appeared_at = Some(appearances);
                appearances += 1;
            }
        }

        let striker = bat.entry(d.striker.as_str()).or_default();
        striker.runs += d.runs_off_bat();
        if d.outcome.counts_as_faced() {
            striker.balls += 1;
        }
        match d.runs_off_bat() {
            4 => striker.fours += 1,
            6 => striker.sixes += 1,
            _ => {}
        }

        let bowler = bowl
            .entry(d.bowler.as_str())
            .or_insert_with(|| BowlTally { first_ball_at: idx, ..Default::default() });
        bowler.runs += d.outcome.bowler_runs();
        if d.is_legal() {
            bowler.legal_balls += 1;
        }
        match d.extra_type() {
            ExtraType::Wide => bowler.wides += 1,
            ExtraType::NoBall => bowler.no_balls += 1,
            _ => {}
        }
        let over = overs.entry((d.over_number, d.bowler.as_str())).or_default();
        over.0 += d.outcome.bowler_runs();
        if d.is_legal() {
            over.1 += 1;
        }

        if let Some(dismissal) = &d.dismissal {
            if dismissal.kind.credited_to_bowler() {
                bowler.wickets += 1;
            }
            let text = dismissal_text(config, d);
            bat.entry(dismissal.player_out.as_str()).or_default().dismissal = text;
            fall_of_wickets.push(FallOfWicket {
                wicket: score.wickets,
                runs: score.runs,
                overs: score.overs(),
                player_out: dismissal.player_out.clone(),
            });
        }
    }

    for ((_, bowler), (runs, legal)) in &overs {
        if *legal == BALLS_PER_OVER && *runs == 0 {
            if let Some(tally) = bowl.get_mut(bowler) {
                tally.maidens += 1;
            }
        }
    }

    let batting = batting_lines(config, batting_team, &bat);
    let mut bowling: Vec<(usize, BowlingLine)> = bowl
        .iter()
        .map(|(id, t)| (t.first_ball_at, bowling_line(config, id, t)))
        .collect();
    bowling.sort_by_key(|(first, _)| *first);

    Ok(Scorecard {
        innings,
        batting_team_id: batting_team.id.clone(),
        bowling_team_id: bowling_team.id.clone(),
        overs: score.overs(),
        score,
        extras,
        batting,
        bowling: bowling.into_iter().map(|(_, line)| line).collect(),
        fall_of_wickets,
    })
}

fn batting_lines(config: &MatchConfig, team: &Team, bat: &HashMap<&str, BatTally>) -> Vec<BattingLine> {
    let mut lines: Vec<(usize, BattingLine)> = team
        .players
        .iter()
        .enumerate()
        .map(|(roster_idx, player)| {
            let tally = bat.get(player.id.as_str()).cloned().unwrap_or_default();
            let status = match (&tally.dismissal, tally.balls) {
                (Some(text), _) => BattingStatus::Out(text.clone()),
                (None, 0) => BattingStatus::DidNotBat,
                (None, _) => BattingStatus::NotOut,
            };
            let strike_rate = if tally.balls == 0 {
                0.0
            } else {
                tally.runs as f64 / tally.balls as f64 * 100.0
            };
            // Batsmen who appeared come first in appearance order, the rest in roster order
            let order = tally.appeared_at.unwrap_or(usize::MAX / 2 + roster_idx);
            (
                order,
                BattingLine {
                    player_id: player.id.clone(),
                    name: config.player_name(&player.id).to_string(),
                    runs: tally.runs,
                    balls_faced: tally.balls,
                    fours: tally.fours,
                    sixes: tally.sixes,
                    strike_rate,
                    status,
                },
            )
        })
        .collect();
    lines.sort_by_key(|(order, _)| *order);
    lines.into_iter().map(|(_, line)| line).collect()
}

fn bowling_line(config: &MatchConfig, id: &str, t: &BowlTally) -> BowlingLine {
    let economy = if t.legal_balls == 0 {
        t.runs as f64
    } else {
        t.runs as f64 / t.legal_balls as f64 * BALLS_PER_OVER as f64
    };
    BowlingLine {
        player_id: id.to_string(),
        name: config.player_name(id).to_string(),
        legal_balls: t.legal_balls,
        overs: overs_string(t.legal_balls),
        maidens: t.maidens,
        runs_conceded: t.runs,
        wickets: t.wickets,
        wides: t.wides,
        no_balls: t.no_balls,
        economy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BallOutcome, Dismissal, Player, PlayerRole, TossDecision};

    fn config() -> MatchConfig {
        let squad = |p: &str, names: [&str; 4]| {
            names
                .iter()
                .enumerate()
                .map(|(i, n)| Player::new(format!("{p}{}", i + 1), *n, PlayerRole::AllRounder))
                .collect::<Vec<_>>()
        };
        MatchConfig::new(
            "fx",
            Team::new("h", "Home", squad("h", ["Ahmed", "Brown", "Chen", "Dias"])),
            Team::new("a", "Away", squad("a", ["Evans", "Fynn", "Gupta", "Hale"])),
            10,
        )
    }

    fn toss() -> Toss {
        Toss::new("h", TossDecision::Bat)
    }

    struct Builder {
        log: Vec<Delivery>,
    }

    impl Builder {
        fn ball(&mut self, over: u32, s: &str, n: &str, b: &str, outcome: BallOutcome) -> &mut Self {
            let ball_number = self.log.iter().filter(|d| d.over_number == over).count() as u32 + 1;
            self.log.push(Delivery {
                innings: 1,
                over_number: over,
                ball_number,
                striker: s.into(),
                non_striker: n.into(),
                bowler: b.into(),
                outcome,
                dismissal: None,
            });
            self
        }

        fn out(&mut self, dismissal: Dismissal) -> &mut Self {
            if let Some(last) = self.log.last_mut() {
                last.dismissal = Some(dismissal);
            }
            self
        }
    }

    #[test]
    fn test_no_ball_scenario() {
        let mut b = Builder { log: vec![] };
        b.ball(0, "h1", "h2", "a1", BallOutcome::NoBall { off_bat: 4 });
        let card = project_scorecard(&b.log, 1, &config(), &toss()).unwrap();

        assert_eq!(card.score.runs, 5);
        assert_eq!(card.score.legal_balls, 0);
        let ahmed = card.batting_line("h1").unwrap();
        assert_eq!((ahmed.runs, ahmed.balls_faced, ahmed.fours), (4, 1, 1));
        let evans = card.bowling_line("a1").unwrap();
        assert_eq!(evans.runs_conceded, 5);
        assert_eq!(evans.legal_balls, 0);
        assert_eq!(evans.no_balls, 1);
        // No legal balls: economy falls back to raw runs
        assert_eq!(evans.economy, 5.0);
    }

    #[test]
    fn test_figures_and_dismissal_texts() {
        let mut b = Builder { log: vec![] };
        b.ball(0, "h1", "h2", "a1", BallOutcome::Runs { off_bat: 6 })
            .ball(0, "h1", "h2", "a1", BallOutcome::Wide { runs: 1 })
            .ball(0, "h1", "h2", "a1", BallOutcome::Bye { runs: 2 })
            .ball(0, "h1", "h2", "a1", BallOutcome::dot())
            .out(Dismissal::new(WicketType::Caught, "h1").with_fielder("a3"))
            .ball(0, "h3", "h2", "a1", BallOutcome::Runs { off_bat: 1 })
            .ball(0, "h2", "h3", "a1", BallOutcome::dot())
            .out(Dismissal::new(WicketType::Caught, "h2").with_fielder("a1"))
            .ball(0, "h4", "h3", "a1", BallOutcome::Runs { off_bat: 1 })
            .out(Dismissal::new(WicketType::RunOut, "h4").with_fielder("a2"));

        let card = project_scorecard(&b.log, 1, &config(), &toss()).unwrap();
        assert_eq!(card.score.runs, 6 + 1 + 2 + 1 + 1);
        assert_eq!(card.score.wickets, 3);
        assert_eq!(card.overs, "1.0");
        assert_eq!(card.extras.total(), 3);

        let texts: Vec<_> = card.batting.iter().map(|l| (l.player_id.as_str(), l.status.text())).collect();
        assert_eq!(
            texts,
            vec![
                ("h1", "c Gupta b Evans"),
                ("h2", "c & b Evans"),
                ("h3", "not out"),
                ("h4", "run out (Fynn)"),
            ]
        );

        let evans = card.bowling_line("a1").unwrap();
        assert_eq!(evans.legal_balls, 6);
        assert_eq!(evans.overs, "1.0");
        // byes are not charged, the run out is not credited
        assert_eq!(evans.runs_conceded, 6 + 1 + 1 + 1);
        assert_eq!(evans.wickets, 2);
        assert_eq!(evans.economy, 9.0);

        assert_eq!(card.fall_of_wickets.len(), 3);
        assert_eq!(card.fall_of_wickets[0].runs, 9);
        assert_eq!(card.fall_of_wickets[0].overs, "0.3");
    }

    #[test]
    fn test_did_not_bat_and_order() {
        let mut b = Builder { log: vec![] };
        b.ball(0, "h3", "h1", "a2", BallOutcome::Runs { off_bat: 2 });
        let card = project_scorecard(&b.log, 1, &config(), &toss()).unwrap();
        let order: Vec<_> = card.batting.iter().map(|l| l.player_id.as_str()).collect();
        assert_eq!(order, vec!["h3", "h1", "h2", "h4"]);
        assert_eq!(card.batting[0].status, BattingStatus::NotOut);
        assert_eq!(card.batting[0].strike_rate, 200.0);
        // Never faced a ball and not out
        assert_eq!(card.batting[1].status, BattingStatus::DidNotBat);
        assert_eq!(card.batting[3].status, BattingStatus::DidNotBat);
    }

    #[test]
    fn test_maiden_over() {
        let mut b = Builder { log: vec![] };
        for _ in 0..6 {
            b.ball(0, "h1", "h2", "a4", BallOutcome::LegBye { runs: 1 });
        }
        let card = project_scorecard(&b.log, 1, &config(), &toss()).unwrap();
        let hale = card.bowling_line("a4").unwrap();
        assert_eq!(hale.maidens, 1);
        assert_eq!(hale.runs_conceded, 0);
        assert_eq!(card.score.runs, 6);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let mut b = Builder { log: vec![] };
        b.ball(0, "h1", "h2", "a1", BallOutcome::Runs { off_bat: 3 })
            .ball(0, "h2", "h1", "a1", BallOutcome::Wide { runs: 2 })
            .ball(0, "h1", "h2", "a1", BallOutcome::dot())
            .out(Dismissal::new(WicketType::Lbw, "h1"));
        let first = project_scorecard(&b.log, 1, &config(), &toss()).unwrap();
        let second = project_scorecard(&b.log, 1, &config(), &toss()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.batting_line("h1").unwrap().status.text(), "lbw b Evans");
    }

    #[test]
    fn test_rejects_unknown_innings() {
        assert!(project_scorecard(&[], 3, &config(), &toss()).is_err());
    }
}
