//! Replay support: validation of stored logs and the optional snapshot cache.

pub mod cache;
pub mod validate;

pub use cache::{fingerprint, ReplayCache};
pub use validate::{validate_log, validate_progression};
