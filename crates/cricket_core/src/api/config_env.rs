use crate::engine::EngineConfig;
use crate::error::{Result, ScoringError};
use std::path::Path;
use std::{env, fs};

pub const ENGINE_CONFIG_PATH_ENV: &str = "CRICKET_ENGINE_CONFIG";

/// Load an engine config file. `.yaml`/`.yml` parse as YAML, anything else as JSON.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        ScoringError::InvalidConfig(format!("Failed to read engine config '{}': {e}", path.display()))
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        EngineConfig::from_yaml(&content)
    } else {
        EngineConfig::from_json(&content)
    };
    parsed.map_err(|e| {
        ScoringError::InvalidConfig(format!("Invalid engine config '{}': {e}", path.display()))
    })
}

/// Engine config from `CRICKET_ENGINE_CONFIG`, or the defaults when unset.
pub fn engine_config_from_env() -> Result<EngineConfig> {
    let Ok(path) = env::var(ENGINE_CONFIG_PATH_ENV) else {
        return Ok(EngineConfig::default());
    };

    let path = path.trim();
    if path.is_empty() {
        return Ok(EngineConfig::default());
    }

    load_engine_config(Path::new(path)).map_err(|e| {
        ScoringError::InvalidConfig(format!("{ENGINE_CONFIG_PATH_ENV}='{path}': {e}"))
    })
}
