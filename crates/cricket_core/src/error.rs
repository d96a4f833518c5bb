use thiserror::Error;

/// Which of the three active selections was missing when a delivery was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSlot {
    Striker,
    NonStriker,
    Bowler,
}

impl std::fmt::Display for SelectionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionSlot::Striker => write!(f, "striker"),
            SelectionSlot::NonStriker => write!(f, "non-striker"),
            SelectionSlot::Bowler => write!(f, "bowler"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Missing selection: {slot} must be set before recording a delivery")]
    MissingSelection { slot: SelectionSlot },

    #[error("Overs exhausted: innings {innings} is limited to {total_overs} overs")]
    OversExhausted { innings: u8, total_overs: u32 },

    #[error("Invalid dismissal: {0}")]
    InvalidDismissal(String),

    #[error("Inconsistent replay: cached {cached}, replayed {replayed}")]
    InconsistentReplay { cached: String, replayed: String },

    #[error("Invalid delivery: {0}")]
    InvalidDelivery(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Bowler {bowler} bowled the previous over and cannot bowl consecutive overs")]
    BowlerIneligible { bowler: String },

    #[error("Innings {innings} is already complete")]
    InningsComplete { innings: u8 },

    #[error("Wrong innings: expected {expected}, found {found}")]
    WrongInnings { expected: u8, found: u8 },

    #[error("Match is not live ({status})")]
    MatchNotLive { status: String },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid log at index {index}: {reason}")]
    InvalidLog { index: usize, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ScoringError {
    /// Rejections the scorer can fix by correcting the input and retrying.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ScoringError::MissingSelection { .. }
            | ScoringError::InvalidDismissal(_)
            | ScoringError::InvalidDelivery(_)
            | ScoringError::InvalidSelection(_)
            | ScoringError::BowlerIneligible { .. }
            | ScoringError::WrongInnings { .. } => true,
            // The cache is dropped and the log replayed again
            ScoringError::InconsistentReplay { .. } => true,
            ScoringError::OversExhausted { .. }
            | ScoringError::InningsComplete { .. }
            | ScoringError::MatchNotLive { .. }
            | ScoringError::InvalidTransition(_) => false,
            ScoringError::InvalidConfig(_)
            | ScoringError::InvalidLog { .. }
            | ScoringError::Serialization(_) => false,
        }
    }
}

impl From<serde_json::Error> for ScoringError {
    fn from(err: serde_json::Error) -> Self {
        ScoringError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ScoringError {
    fn from(err: serde_yaml::Error) -> Self {
        ScoringError::InvalidConfig(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
