use super::delivery::{overs_string, Delivery, ExtraType, BALLS_PER_OVER};
use super::PlayerId;
use serde::{Deserialize, Serialize};

/// Running score for one innings. Always derived from the log, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsScore {
    pub runs: u32,
    pub wickets: u32,
    pub legal_balls: u32,
}

impl InningsScore {
    /// Fold every delivery of `innings` out of the log.
    pub fn from_log(log: &[Delivery], innings: u8) -> Self {
        log.iter()
            .filter(|d| d.innings == innings)
            .fold(Self::default(), |mut score, d| {
                score.apply(d);
                score
            })
    }

    pub fn apply(&mut self, delivery: &Delivery) {
        self.runs += delivery.total_runs();
        if delivery.is_wicket() {
            self.wickets += 1;
        }
        if delivery.is_legal() {
            self.legal_balls += 1;
        }
    }

    pub fn overs(&self) -> String {
        overs_string(self.legal_balls)
    }

    /// Runs per six legal balls; 0.0 before the first legal ball.
    pub fn run_rate(&self) -> f64 {
        if self.legal_balls == 0 {
            0.0
        } else {
            self.runs as f64 * BALLS_PER_OVER as f64 / self.legal_balls as f64
        }
    }

    /// `"runs/wickets (overs)"`, e.g. `"160/6 (20.0)"`.
    pub fn display(&self) -> String {
        format!("{}/{} ({})", self.runs, self.wickets, self.overs())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extras {
    pub wides: u32,
    pub no_balls: u32,
    pub byes: u32,
    pub leg_byes: u32,
}

impl Extras {
    pub fn apply(&mut self, delivery: &Delivery) {
        let runs = delivery.extra_runs();
        match delivery.extra_type() {
            ExtraType::None => {}
            ExtraType::Wide => self.wides += runs,
            ExtraType::NoBall => self.no_balls += runs,
            ExtraType::Bye => self.byes += runs,
            ExtraType::LegBye => self.leg_byes += runs,
        }
    }

    pub fn total(&self) -> u32 {
        self.wides + self.no_balls + self.byes + self.leg_byes
    }
}

/// Score at the moment a wicket fell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallOfWicket {
    pub wicket: u32,
    pub runs: u32,
    pub overs: String,
    pub player_out: PlayerId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BallOutcome;

    fn ball(innings: u8, outcome: BallOutcome) -> Delivery {
        Delivery {
            innings,
            over_number: 0,
            ball_number: 1,
            striker: "s".into(),
            non_striker: "n".into(),
            bowler: "b".into(),
            outcome,
            dismissal: None,
        }
    }

    #[test]
    fn test_score_from_log() {
        let log = vec![
            ball(1, BallOutcome::Runs { off_bat: 4 }),
            ball(1, BallOutcome::Wide { runs: 1 }),
            ball(1, BallOutcome::NoBall { off_bat: 2 }),
            ball(1, BallOutcome::LegBye { runs: 1 }),
            ball(2, BallOutcome::Runs { off_bat: 6 }),
        ];
        let score = InningsScore::from_log(&log, 1);
        assert_eq!(score.runs, 4 + 1 + 3 + 1);
        assert_eq!(score.legal_balls, 2);
        assert_eq!(score.overs(), "0.2");
        assert_eq!(score.display(), "9/0 (0.2)");
        assert!((score.run_rate() - 27.0).abs() < 1e-9);

        assert_eq!(InningsScore::from_log(&log, 2).runs, 6);
    }

    #[test]
    fn test_extras_breakdown() {
        let mut extras = Extras::default();
        for outcome in [
            BallOutcome::Wide { runs: 3 },
            BallOutcome::NoBall { off_bat: 4 },
            BallOutcome::Bye { runs: 2 },
            BallOutcome::LegBye { runs: 1 },
            BallOutcome::Runs { off_bat: 1 },
        ] {
            extras.apply(&ball(1, outcome));
        }
        assert_eq!(extras, Extras { wides: 3, no_balls: 1, byes: 2, leg_byes: 1 });
        assert_eq!(extras.total(), 7);
    }

    #[test]
    fn test_empty_score_serializes_compactly() {
        insta::assert_json_snapshot!(InningsScore::default(), @r###"
        {
          "runs": 0,
          "wickets": 0,
          "legalBalls": 0
        }
        "###);
    }
}
