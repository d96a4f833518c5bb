use crate::engine::config::RulesConfig;
use crate::engine::lifecycle::{innings_closure, Lifecycle};
use crate::error::{Result, ScoringError};
use crate::models::{BallOutcome, Delivery, InningsScore, MatchConfig, BALLS_PER_OVER};
use std::collections::HashSet;

fn invalid(index: usize, reason: impl Into<String>) -> ScoringError {
    ScoringError::InvalidLog { index, reason: reason.into() }
}

/// Validates a stored delivery log before it is replayed.
///
/// Checks ordering, the six-legal-ball quota, outcome shapes, rosters, dismissed
/// batsmen and the no-consecutive-overs rule. Live recording enforces the same
/// rules, so a failure here means the log was edited or produced elsewhere.
pub fn validate_log(log: &[Delivery], config: &MatchConfig) -> Result<()> {
    let mut prev: Option<&Delivery> = None;
    let mut legal_in_over = 0u32;
    let mut dismissed: HashSet<&str> = HashSet::new();

    for (i, d) in log.iter().enumerate() {
        if !(1..=2).contains(&d.innings) {
            return Err(invalid(i, format!("innings must be 1 or 2, got {}", d.innings)));
        }
        if d.over_number >= config.total_overs {
            return Err(invalid(
                i,
                format!("over {} is beyond the {}-over limit", d.over_number, config.total_overs),
            ));
        }
        if let Some(p) = prev {
            if d.position() <= p.position() {
                return Err(invalid(
                    i,
                    format!(
                        "innings {} {}.{} recorded after innings {} {}.{}",
                        d.innings, d.over_number, d.ball_number, p.innings, p.over_number, p.ball_number
                    ),
                ));
            }
        }
        validate_shape(i, d)?;
        validate_rosters(i, d, config)?;

        let new_innings = prev.map_or(true, |p| p.innings != d.innings);
        if new_innings {
            if (d.over_number, d.ball_number) != (0, 1) {
                return Err(invalid(
                    i,
                    format!(
                        "innings {} must open at 0.1, found {}.{}",
                        d.innings, d.over_number, d.ball_number
                    ),
                ));
            }
            legal_in_over = 0;
            dismissed.clear();
        } else if let Some(p) = prev {
            if d.over_number == p.over_number {
                if legal_in_over >= BALLS_PER_OVER {
                    return Err(invalid(i, format!("over {} already has six legal balls", d.over_number)));
                }
                if d.ball_number != p.ball_number + 1 {
                    return Err(invalid(
                        i,
                        format!("expected ball {} of over {}", p.ball_number + 1, d.over_number),
                    ));
                }
            } else {
                if d.over_number != p.over_number + 1 || d.ball_number != 1 {
                    return Err(invalid(
                        i,
                        format!("expected {}.1 after {}.{}", p.over_number + 1, p.over_number, p.ball_number),
                    ));
                }
                if legal_in_over < BALLS_PER_OVER {
                    return Err(invalid(
                        i,
                        format!("over {} ended after {legal_in_over} legal balls", p.over_number),
                    ));
                }
                legal_in_over = 0;
                if p.bowler == d.bowler {
                    return Err(invalid(i, format!("{} bowled consecutive overs", d.bowler)));
                }
            }
        }

        for batsman in [&d.striker, &d.non_striker] {
            if dismissed.contains(batsman.as_str()) {
                return Err(invalid(
                    i,
                    format!("{batsman} bats again after being dismissed in innings {}", d.innings),
                ));
            }
        }
        if let Some(out) = d.player_out() {
            dismissed.insert(out);
        }
        if d.is_legal() {
            legal_in_over += 1;
        }
        prev = Some(d);
    }
    Ok(())
}

/// Checks that every delivery falls inside a live innings.
///
/// Each innings takes no balls once it is all out, its overs are bowled or
/// (innings 2) the target is reached. Innings 2 opens only after innings 1
/// has closed, a declaration from the lifecycle included. Every ball must be
/// batted by the side the toss sent in for its innings.
pub fn validate_progression(
    log: &[Delivery],
    config: &MatchConfig,
    rules: &RulesConfig,
    lifecycle: &Lifecycle,
) -> Result<()> {
    if log.is_empty() {
        return Ok(());
    }
    let toss = lifecycle
        .toss
        .as_ref()
        .ok_or_else(|| invalid(0, "deliveries recorded before the toss"))?;
    let first_declared = lifecycle.innings_declared(1) || lifecycle.match_ended();
    let total_balls = config.total_balls();

    let mut scores = [InningsScore::default(), InningsScore::default()];
    let mut target: Option<u32> = None;

    for (i, d) in log.iter().enumerate() {
        if !(1..=2).contains(&d.innings) {
            return Err(invalid(i, format!("innings must be 1 or 2, got {}", d.innings)));
        }
        let batting = config.batting_team(toss, d.innings)?;
        if !batting.contains(&d.striker) {
            return Err(invalid(
                i,
                format!("{} does not bat in innings {} ({} bat)", d.striker, d.innings, batting.name),
            ));
        }

        if d.innings == 2 && target.is_none() {
            let first = &scores[0];
            let first_max = config.max_wickets(config.batting_team(toss, 1)?, rules.players_per_team);
            if innings_closure(first, first_max, total_balls, None, first_declared).is_none() {
                return Err(invalid(
                    i,
                    format!("innings 2 opened while innings 1 is still open at {}", first.display()),
                ));
            }
            target = Some(first.runs + 1);
        }

        let max_wickets = config.max_wickets(batting, rules.players_per_team);
        let score = &mut scores[usize::from(d.innings - 1)];
        let chase = target.filter(|_| d.innings == 2);
        if let Some(closure) = innings_closure(score, max_wickets, total_balls, chase, false) {
            return Err(invalid(
                i,
                format!("innings {} already closed ({closure:?}) at {}", d.innings, score.display()),
            ));
        }
        score.apply(d);
    }
    Ok(())
}

fn validate_shape(i: usize, d: &Delivery) -> Result<()> {
    if d.striker == d.non_striker {
        return Err(invalid(i, format!("{} is both striker and non-striker", d.striker)));
    }
    // Reject shapes that `BallOutcome::from_parts` would not build
    BallOutcome::from_parts(d.extra_type(), d.runs_off_bat(), d.extra_runs())
        .map_err(|e| invalid(i, e.to_string()))?;
    if let Some(dismissal) = &d.dismissal {
        dismissal
            .validate(&d.outcome, &d.striker, &d.non_striker)
            .map_err(|e| invalid(i, e.to_string()))?;
    }
    Ok(())
}

fn validate_rosters(i: usize, d: &Delivery, config: &MatchConfig) -> Result<()> {
    let (batting, bowling) = if config.team_a.contains(&d.striker) {
        (&config.team_a, &config.team_b)
    } else {
        (&config.team_b, &config.team_a)
    };
    if !batting.contains(&d.striker) || !batting.contains(&d.non_striker) {
        return Err(invalid(
            i,
            format!("{} and {} are not in the same roster", d.striker, d.non_striker),
        ));
    }
    if !bowling.contains(&d.bowler) {
        return Err(invalid(i, format!("{} is not in the fielding roster", d.bowler)));
    }
    Ok(())
}
