//! # Engine Configuration
//!
//! Rule constants and win-probability tuning in one place, so presets and
//! per-competition overrides can be loaded from JSON or YAML.
//!
//! ```rust
//! use cricket_core::engine::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.rules.players_per_team, 11);
//! ```

use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: RulesConfig,
    pub win_probability: WinProbabilityConfig,
}

impl EngineConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ScoringError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        self.win_probability.validate()
    }
}

/// Competition rules that are not part of a single fixture's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Side size used for `maxWickets` unless the fixture overrides it (기본: 11)
    pub players_per_team: u32,
    /// Wickets-margin base for a successful chase (기본: 10).
    /// The margin is `base - wickets lost`, independent of the squad size.
    pub wicket_margin_base: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { players_per_team: 11, wicket_margin_base: 10 }
    }
}

impl RulesConfig {
    fn validate(&self) -> Result<()> {
        if self.players_per_team < 2 {
            return Err(ScoringError::InvalidConfig(format!(
                "players_per_team must be at least 2, got {}",
                self.players_per_team
            )));
        }
        if self.wicket_margin_base == 0 {
            return Err(ScoringError::InvalidConfig("wicket_margin_base must be positive".into()));
        }
        Ok(())
    }
}

/// Band edges and adjustments for the chase heuristic. All adjustments are
/// percentage points applied to the neutral starting probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinProbabilityConfig {
    pub neutral: i32,

    // === Required run rate bands ===
    /// RRR at or below this favours the chaser strongly (기본: 6.0)
    pub comfortable_rrr: f64,
    pub comfortable_bonus: i32,
    /// RRR at or below this still favours the chaser slightly (기본: 8.0)
    pub steady_rrr: f64,
    pub steady_bonus: i32,
    /// RRR above this starts to penalise the chaser (기본: 10.0)
    pub stretched_rrr: f64,
    pub stretched_penalty: i32,
    /// RRR above this is a steep chase (기본: 12.0)
    pub steep_rrr: f64,
    pub steep_penalty: i32,

    // === Wickets in hand ===
    pub deep_batting_wickets: u32,
    pub deep_batting_bonus: i32,
    pub collapse_wickets: u32,
    pub collapse_penalty: i32,

    // === Near-impossible finish ===
    pub final_balls: u32,
    pub final_runs: u32,
    pub final_penalty: i32,

    pub floor: i32,
    pub ceiling: i32,
}

impl Default for WinProbabilityConfig {
    fn default() -> Self {
        Self {
            neutral: 50,

            comfortable_rrr: 6.0,
            comfortable_bonus: 20,
            steady_rrr: 8.0,
            steady_bonus: 5,
            stretched_rrr: 10.0,
            stretched_penalty: 15,
            steep_rrr: 12.0,
            steep_penalty: 30,

            deep_batting_wickets: 8,
            deep_batting_bonus: 15,
            collapse_wickets: 3,
            collapse_penalty: 20,

            final_balls: 12,
            final_runs: 25,
            final_penalty: 30,

            floor: 1,
            ceiling: 99,
        }
    }
}

impl WinProbabilityConfig {
    fn validate(&self) -> Result<()> {
        let bands = [self.comfortable_rrr, self.steady_rrr, self.stretched_rrr, self.steep_rrr];
        if bands.windows(2).any(|w| w[0] > w[1]) {
            return Err(ScoringError::InvalidConfig(
                "required run rate bands must be ascending".into(),
            ));
        }
        if self.collapse_wickets >= self.deep_batting_wickets {
            return Err(ScoringError::InvalidConfig(
                "collapse_wickets must be below deep_batting_wickets".into(),
            ));
        }
        if !(0..=100).contains(&self.floor) || !(0..=100).contains(&self.ceiling) || self.floor > self.ceiling {
            return Err(ScoringError::InvalidConfig(format!(
                "probability bounds must satisfy 0 <= floor <= ceiling <= 100, got [{}, {}]",
                self.floor, self.ceiling
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml("rules:\n  players_per_team: 8\n").unwrap();
        assert_eq!(config.rules.players_per_team, 8);
        assert_eq!(config.rules.wicket_margin_base, 10);
        assert_eq!(config.win_probability, WinProbabilityConfig::default());
    }

    #[test]
    fn test_json_validation() {
        let err = EngineConfig::from_json(
            r#"{"win_probability": {"comfortable_rrr": 9.0, "steady_rrr": 8.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidConfig(_)));

        let err = EngineConfig::from_json(r#"{"rules": {"wicket_margin_base": 0}}"#).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidConfig(_)));
    }
}
