//! Engine Contract Tests
//!
//! Replay invariants checked over random scoring sessions, plus the reference
//! match scenarios:
//! 1. Idempotent replay
//! 2. Six legal balls per over, no consecutive overs
//! 3. Run conservation
//! 4. Strike rotation
//! 5. Chase / defend / tie results

use super::config::EngineConfig;
use super::lifecycle::Phase;
use super::recorder::{DeliveryInput, Recorded, Selection};
use super::session::MatchSession;
use crate::error::Result;
use crate::models::{
    BallOutcome, Dismissal, ExtraType, MatchConfig, Player, PlayerRole, Team, Toss, TossDecision,
    WicketType,
};
use crate::replay::{validate_log, validate_progression};
use proptest::prelude::*;

fn config(overs: u32) -> MatchConfig {
    let squad = |p: &str| {
        (1..=11)
            .map(|i| Player::new(format!("{p}{i}"), format!("{}{i}", p.to_uppercase()), PlayerRole::AllRounder))
            .collect::<Vec<_>>()
    };
    MatchConfig::new("fx", Team::new("n", "North", squad("n")), Team::new("s", "South", squad("s")), overs)
}

#[derive(Debug, Clone, Copy)]
enum Wicket {
    None,
    Bowled,
    Caught,
    RunOutNonStriker,
}

/// Plays the role of the scorer: keeps the selection returned by the engine,
/// sends in the next batsman and rotates five bowlers.
struct Scorer {
    session: MatchSession,
    selection: Selection,
    innings: u8,
    next_batsman: usize,
    overs_started: usize,
}

impl Scorer {
    fn new(overs: u32) -> Self {
        let mut session = MatchSession::new(config(overs), EngineConfig::default()).unwrap();
        session.start(Toss::new("n", TossDecision::Bat)).unwrap();
        Self { session, selection: Selection::default(), innings: 1, next_batsman: 0, overs_started: 0 }
    }

    fn is_over(&self) -> bool {
        self.session.phase().unwrap() == Phase::Completed
    }

    fn fill_selection(&mut self) {
        let state = self.session.state().unwrap();
        let innings = state.active_innings().unwrap();
        if innings != self.innings {
            self.innings = innings;
            self.selection = Selection::default();
            self.next_batsman = 0;
            self.overs_started = 0;
        }
        let current = state.innings(innings).unwrap();
        let batting = self.session.config().team(&current.batting_team_id).unwrap().clone();
        let bowling = self.session.config().team(&current.bowling_team_id).unwrap().clone();

        for slot in [&mut self.selection.striker, &mut self.selection.non_striker] {
            if slot.is_none() {
                *slot = Some(batting.players[self.next_batsman].id.clone());
                self.next_batsman += 1;
            }
        }
        if self.selection.bowler.is_none() {
            self.selection.bowler = Some(bowling.players[self.overs_started % 5].id.clone());
            self.overs_started += 1;
        }
    }

    fn ball(&mut self, outcome: BallOutcome, wicket: Wicket) -> Result<Recorded> {
        self.fill_selection();
        let (striker, non_striker, bowler) = self.selection.require()?;
        let dismissal = match wicket {
            Wicket::None => None,
            Wicket::Bowled => Some(Dismissal::new(WicketType::Bowled, striker)),
            Wicket::Caught => Some(Dismissal::new(WicketType::Caught, striker).with_fielder(bowler)),
            Wicket::RunOutNonStriker => Some(Dismissal::new(WicketType::RunOut, non_striker)),
        };
        let mut input = DeliveryInput::new(self.innings, self.selection.clone(), outcome);
        if let Some(d) = dismissal {
            input = input.with_dismissal(d);
        }
        let recorded = self.session.record_delivery(&input)?;
        self.selection = recorded.next.clone();
        Ok(recorded)
    }

    /// `legal_balls` deliveries adding up to `runs`, with a bowled dot at each
    /// index in `wickets` and singles before twos.
    fn play_innings(&mut self, legal_balls: usize, runs: usize, wickets: &[usize]) {
        let scoring = legal_balls - wickets.len();
        let twos = runs - scoring;
        let mut scored = 0;
        for i in 0..legal_balls {
            if wickets.contains(&i) {
                self.ball(BallOutcome::dot(), Wicket::Bowled).unwrap();
                continue;
            }
            let off_bat = if scored < scoring - twos { 1 } else { 2 };
            scored += 1;
            self.ball(BallOutcome::Runs { off_bat }, Wicket::None).unwrap();
        }
    }
}

fn outcome_strategy() -> impl Strategy<Value = (BallOutcome, Wicket)> {
    (0u8..20, 0u32..7).prop_map(|(kind, r)| match kind {
        0 => (BallOutcome::dot(), Wicket::Bowled),
        1..=9 => (BallOutcome::Runs { off_bat: r }, Wicket::None),
        10 | 11 => (BallOutcome::Wide { runs: r % 5 + 1 }, Wicket::None),
        12 | 13 => (BallOutcome::NoBall { off_bat: r }, Wicket::None),
        14 | 15 => (BallOutcome::Bye { runs: r % 4 + 1 }, Wicket::None),
        16 | 17 => (BallOutcome::LegBye { runs: r % 4 + 1 }, Wicket::None),
        18 => (BallOutcome::Runs { off_bat: r % 3 }, Wicket::RunOutNonStriker),
        _ => (BallOutcome::dot(), Wicket::Caught),
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_replay_invariants(balls in prop::collection::vec(outcome_strategy(), 1..160)) {
        let mut scorer = Scorer::new(5);

        for (outcome, wicket) in balls {
            if scorer.is_over() {
                break;
            }
            let recorded = scorer.ball(outcome, wicket).unwrap();
            let d = &recorded.delivery;

            // Strike rotation: run parity XOR change of ends
            if recorded.innings_closed.is_none() && !d.is_wicket() {
                let swap = d.outcome.swaps_strike() ^ recorded.over_completed;
                let expected = if swap { &d.non_striker } else { &d.striker };
                prop_assert_eq!(recorded.next.striker.as_ref(), Some(expected));
            }
            if recorded.over_completed {
                prop_assert_eq!(recorded.next.bowler.as_ref(), None);
            }
        }

        let session = &scorer.session;
        let log = session.log();

        // Quota, ordering and no consecutive overs
        prop_assert!(validate_log(log, session.config()).is_ok());
        prop_assert!(validate_progression(log, session.config(), &session.engine_config().rules, session.lifecycle()).is_ok());

        let state = session.state().unwrap();
        for innings in state.innings.iter().filter(|i| i.started) {
            let deliveries = log.iter().filter(|d| d.innings == innings.number);
            let conserved: u32 = deliveries.map(|d| d.runs_off_bat() + d.extra_runs()).sum();
            prop_assert_eq!(innings.score.runs, conserved);
            prop_assert!(innings.score.legal_balls <= session.config().total_balls());
            prop_assert!(innings.score.wickets <= innings.max_wickets);

            let card = session.scorecard(innings.number).unwrap();
            let batting: u32 = card.batting.iter().map(|b| b.runs).sum();
            prop_assert_eq!(batting + card.extras.total(), innings.score.runs);
            prop_assert_eq!(card.clone(), session.scorecard(innings.number).unwrap());
        }

        // Idempotent replay from the bare log
        let restored = MatchSession::restore(
            session.config().clone(),
            EngineConfig::default(),
            session.lifecycle().clone(),
            log.to_vec(),
        )
        .unwrap();
        prop_assert_eq!(restored.state().unwrap(), state);
        prop_assert_eq!(restored.commentary().unwrap(), session.commentary().unwrap());
    }
}

#[test]
fn test_scenario_chase_won_by_wickets() {
    let mut scorer = Scorer::new(20);
    scorer.play_innings(120, 160, &[9, 29, 49, 69, 89, 109]);

    let state = scorer.session.state().unwrap();
    assert_eq!(state.innings(1).unwrap().score.display(), "160/6 (20.0)");
    assert_eq!(state.target, Some(161));
    assert_eq!(state.phase, Phase::InningsBreak);

    scorer.play_innings(117, 161, &[20, 40, 60, 80]);
    let state = scorer.session.state().unwrap();
    assert_eq!(state.innings(2).unwrap().score.display(), "161/4 (19.3)");
    let result = state.result.unwrap();
    assert_eq!(result.result_description, "South won by 6 wickets");
    assert_eq!(result.winning_team_id.as_deref(), Some("s"));
    assert_eq!(scorer.session.lifecycle().result.as_ref(), Some(&result));
}

#[test]
fn test_scenario_defended_by_runs() {
    let mut scorer = Scorer::new(20);
    scorer.play_innings(120, 160, &[9, 29, 49, 69, 89, 109]);

    let wickets: Vec<usize> = (1..=10).map(|k| k * 11 - 1).collect();
    scorer.play_innings(110, 140, &wickets);

    let state = scorer.session.state().unwrap();
    assert_eq!(state.innings(2).unwrap().score.display(), "140/10 (18.2)");
    let result = state.result.unwrap();
    assert_eq!(result.result_description, "North won by 20 runs");
    assert_eq!(result.winning_team_id.as_deref(), Some("n"));
}

#[test]
fn test_scenario_tie() {
    let mut scorer = Scorer::new(20);
    scorer.play_innings(120, 160, &[9, 29, 49, 69, 89, 109]);
    scorer.play_innings(120, 160, &[5, 25, 45, 65, 85]);

    let state = scorer.session.state().unwrap();
    assert_eq!(state.innings(2).unwrap().score.display(), "160/5 (20.0)");
    let result = state.result.unwrap();
    assert_eq!(result.result_description, "Match Tied");
    assert_eq!(result.winning_team_id, None);
}

#[test]
fn test_scenario_wide_with_extra_runs() {
    let mut scorer = Scorer::new(20);
    scorer.ball(BallOutcome::Runs { off_bat: 2 }, Wicket::None).unwrap();

    let outcome = BallOutcome::from_parts(ExtraType::Wide, 0, 3).unwrap();
    let recorded = scorer.ball(outcome, Wicket::None).unwrap();
    assert_eq!(recorded.delivery.runs_off_bat(), 0);
    assert_eq!(recorded.delivery.ball_number, 2);

    let score = scorer.session.state().unwrap().innings(1).unwrap().score.clone();
    assert_eq!(score.runs, 5);
    assert_eq!(score.legal_balls, 1);
    // wide plus two run: the batsmen finish where they started
    assert_eq!(recorded.next.striker.as_deref(), Some("n1"));

    let card = scorer.session.scorecard(1).unwrap();
    assert_eq!(card.batting_line("n1").unwrap().balls_faced, 1);
    assert_eq!(card.extras.wides, 3);
}

#[test]
fn test_scenario_no_ball_boundary() {
    let mut scorer = Scorer::new(20);
    let outcome = BallOutcome::from_parts(ExtraType::NoBall, 4, 1).unwrap();
    scorer.ball(outcome, Wicket::None).unwrap();

    let score = scorer.session.state().unwrap().innings(1).unwrap().score.clone();
    assert_eq!(score.runs, 5);
    assert_eq!(score.legal_balls, 0);

    let card = scorer.session.scorecard(1).unwrap();
    assert_eq!(card.batting_line("n1").unwrap().runs, 4);
    let bowler = card.bowling_line("s1").unwrap();
    assert_eq!(bowler.runs_conceded, 5);
    assert_eq!(bowler.legal_balls, 0);
}
