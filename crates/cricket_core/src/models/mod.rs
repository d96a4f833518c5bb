pub mod delivery;
pub mod match_config;
pub mod player;
pub mod score;
pub mod team;

pub use delivery::{
    overs_string, BallOutcome, Delivery, Dismissal, ExtraType, WicketType, BALLS_PER_OVER,
    NO_BALL_PENALTY, WIDE_PENALTY,
};
pub use match_config::{MatchConfig, Toss, TossDecision};
pub use player::{Player, PlayerId, PlayerRole};
pub use score::{Extras, FallOfWicket, InningsScore};
pub use team::Team;
