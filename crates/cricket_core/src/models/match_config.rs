//! Match configuration: rosters, overs limit and toss.

use super::{Player, Team};
use crate::error::{Result, ScoringError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TossDecision {
    Bat,
    Bowl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toss {
    pub winner_id: String,
    pub decision: TossDecision,
}

impl Toss {
    pub fn new(winner_id: impl Into<String>, decision: TossDecision) -> Self {
        Self { winner_id: winner_id.into(), decision }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    pub fixture_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub team_a: Team,
    pub team_b: Team,
    pub total_overs: u32,
    /// Overrides `RulesConfig::players_per_team` for this fixture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players_per_team: Option<u32>,
    /// Known up front for replays; live matches receive it as a lifecycle update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toss: Option<Toss>,
}

impl MatchConfig {
    pub fn new(fixture_id: impl Into<String>, team_a: Team, team_b: Team, total_overs: u32) -> Self {
        Self {
            fixture_id: fixture_id.into(),
            venue: None,
            scheduled_at: None,
            team_a,
            team_b,
            total_overs,
            players_per_team: None,
            toss: None,
        }
    }

    pub fn with_toss(mut self, toss: Toss) -> Self {
        self.toss = Some(toss);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_overs == 0 {
            return Err(ScoringError::InvalidConfig("total overs must be at least 1".into()));
        }
        if self.team_a.id == self.team_b.id {
            return Err(ScoringError::InvalidConfig(format!(
                "both teams share the id {}",
                self.team_a.id
            )));
        }
        for team in [&self.team_a, &self.team_b] {
            if team.roster_size() < 2 {
                return Err(ScoringError::InvalidConfig(format!(
                    "team {} needs at least two players",
                    team.name
                )));
            }
        }
        let mut seen = HashSet::new();
        for player in self.team_a.players.iter().chain(&self.team_b.players) {
            if !seen.insert(player.id.as_str()) {
                return Err(ScoringError::InvalidConfig(format!(
                    "player id {} appears more than once",
                    player.id
                )));
            }
        }
        if let Some(toss) = &self.toss {
            self.validate_toss(toss)?;
        }
        if self.players_per_team == Some(0) {
            return Err(ScoringError::InvalidConfig("players per team must be positive".into()));
        }
        Ok(())
    }

    pub fn validate_toss(&self, toss: &Toss) -> Result<()> {
        if self.team(&toss.winner_id).is_none() {
            return Err(ScoringError::InvalidConfig(format!(
                "toss winner {} is not playing this fixture",
                toss.winner_id
            )));
        }
        Ok(())
    }

    pub fn team(&self, team_id: &str) -> Option<&Team> {
        if self.team_a.id == team_id {
            Some(&self.team_a)
        } else if self.team_b.id == team_id {
            Some(&self.team_b)
        } else {
            None
        }
    }

    pub fn opponent(&self, team_id: &str) -> Option<&Team> {
        if self.team_a.id == team_id {
            Some(&self.team_b)
        } else if self.team_b.id == team_id {
            Some(&self.team_a)
        } else {
            None
        }
    }

    /// The team batting first: the toss winner on `Bat`, the other side on `Bowl`.
    pub fn first_batting_team(&self, toss: &Toss) -> Result<&Team> {
        let winner = self.team(&toss.winner_id).ok_or_else(|| {
            ScoringError::InvalidConfig(format!("unknown toss winner {}", toss.winner_id))
        })?;
        match toss.decision {
            TossDecision::Bat => Ok(winner),
            TossDecision::Bowl => self.opponent(&winner.id).ok_or_else(|| {
                ScoringError::InvalidConfig(format!("no opponent for {}", winner.id))
            }),
        }
    }

    pub fn batting_team(&self, toss: &Toss, innings: u8) -> Result<&Team> {
        let first = self.first_batting_team(toss)?;
        match innings {
            1 => Ok(first),
            2 => self.opponent(&first.id).ok_or_else(|| {
                ScoringError::InvalidConfig(format!("no opponent for {}", first.id))
            }),
            other => Err(ScoringError::InvalidConfig(format!("no innings {other}"))),
        }
    }

    pub fn bowling_team(&self, toss: &Toss, innings: u8) -> Result<&Team> {
        let batting = self.batting_team(toss, innings)?;
        self.opponent(&batting.id)
            .ok_or_else(|| ScoringError::InvalidConfig(format!("no opponent for {}", batting.id)))
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.team_a.player(player_id).or_else(|| self.team_b.player(player_id))
    }

    /// Display name for a player id, falling back to the id itself.
    pub fn player_name<'a>(&'a self, player_id: &'a str) -> &'a str {
        self.player(player_id).map(|p| p.name.as_str()).unwrap_or(player_id)
    }

    /// Wickets that end an innings: `min(roster, players_per_team) - 1`.
    pub fn max_wickets(&self, team: &Team, default_players_per_team: u32) -> u32 {
        let players_per_team = self.players_per_team.unwrap_or(default_players_per_team);
        (team.roster_size() as u32).min(players_per_team).saturating_sub(1)
    }

    pub fn total_balls(&self) -> u32 {
        self.total_overs * super::BALLS_PER_OVER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayerRole;

    fn squad(prefix: &str, size: usize) -> Vec<Player> {
        (0..size)
            .map(|i| Player::new(format!("{prefix}{i}"), format!("{prefix} player {i}"), PlayerRole::AllRounder))
            .collect()
    }

    fn config() -> MatchConfig {
        MatchConfig::new(
            "fx-1",
            Team::new("north", "North", squad("n", 11)),
            Team::new("south", "South", squad("s", 11)),
            20,
        )
    }

    #[test]
    fn test_batting_order_from_toss() {
        let cfg = config();
        let bat = Toss::new("north", TossDecision::Bat);
        assert_eq!(cfg.batting_team(&bat, 1).unwrap().id, "north");
        assert_eq!(cfg.batting_team(&bat, 2).unwrap().id, "south");
        assert_eq!(cfg.bowling_team(&bat, 1).unwrap().id, "south");

        let bowl = Toss::new("north", TossDecision::Bowl);
        assert_eq!(cfg.batting_team(&bowl, 1).unwrap().id, "south");
        assert_eq!(cfg.bowling_team(&bowl, 2).unwrap().id, "south");
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        assert!(config().validate().is_ok());

        let mut cfg = config();
        cfg.total_overs = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.team_b.players[0].id = "n0".into();
        assert!(cfg.validate().is_err());

        let cfg = config().with_toss(Toss::new("east", TossDecision::Bat));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_max_wickets_uses_smaller_of_roster_and_rule() {
        let mut cfg = config();
        assert_eq!(cfg.max_wickets(&cfg.team_a.clone(), 11), 10);

        cfg.team_a.players.truncate(8);
        assert_eq!(cfg.max_wickets(&cfg.team_a.clone(), 11), 7);

        cfg.players_per_team = Some(6);
        assert_eq!(cfg.max_wickets(&cfg.team_b.clone(), 11), 5);
    }

    #[test]
    fn test_player_name_fallback() {
        let cfg = config();
        assert_eq!(cfg.player_name("s3"), "s player 3");
        assert_eq!(cfg.player_name("ghost"), "ghost");
    }
}
