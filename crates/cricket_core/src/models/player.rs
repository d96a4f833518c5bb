use serde::{Deserialize, Serialize};

/// Roster identifier. Unique across both teams of a fixture.
pub type PlayerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    #[default]
    Batsman,
    Bowler,
    AllRounder,
    WicketKeeper,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub role: PlayerRole,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, role: PlayerRole) -> Self {
        Self { id: id.into(), name: name.into(), role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let player = Player::new("k1", "Keeper", PlayerRole::WicketKeeper);
        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["role"], "wicket_keeper");
    }

    #[test]
    fn test_role_defaults_when_missing() {
        let player: Player = serde_json::from_str(r#"{"id":"p1","name":"Opener"}"#).unwrap();
        assert_eq!(player.role, PlayerRole::Batsman);
    }
}
