//! Snapshot cache keyed by a SHA-256 fingerprint of the lifecycle and log.
//!
//! The log is the source of truth. A cache that disagrees with a fresh replay
//! is discarded, never the log.

use crate::engine::lifecycle::{Lifecycle, MatchState};
use crate::error::{Result, ScoringError};
use crate::models::Delivery;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[inline]
fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Fingerprint of everything a derived state depends on besides configuration.
pub fn fingerprint(lifecycle: &Lifecycle, log: &[Delivery]) -> Result<String> {
    let canonical = serde_json::to_vec(&(lifecycle, log))?;
    Ok(sha256_hex(&canonical))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayCache {
    pub fingerprint: String,
    pub deliveries: usize,
    pub state: MatchState,
}

impl ReplayCache {
    pub fn capture(lifecycle: &Lifecycle, log: &[Delivery], state: MatchState) -> Result<Self> {
        Ok(Self { fingerprint: fingerprint(lifecycle, log)?, deliveries: log.len(), state })
    }

    /// True when the cache was captured from exactly this lifecycle and log.
    pub fn is_fresh(&self, lifecycle: &Lifecycle, log: &[Delivery]) -> Result<bool> {
        if self.deliveries != log.len() {
            return Ok(false);
        }
        Ok(self.fingerprint == fingerprint(lifecycle, log)?)
    }

    /// Compare against a state recomputed from the log.
    pub fn verify(&self, replayed: &MatchState) -> Result<()> {
        if &self.state == replayed {
            return Ok(());
        }
        Err(ScoringError::InconsistentReplay {
            cached: describe(&self.state),
            replayed: describe(replayed),
        })
    }
}

/// One-line description used in `InconsistentReplay` messages.
pub fn describe(state: &MatchState) -> String {
    let scores: Vec<String> = state
        .innings
        .iter()
        .map(|i| format!("{}: {}", i.batting_team_id, i.score.display()))
        .collect();
    format!("{:?} [{}]", state.phase, scores.join(", "))
}
