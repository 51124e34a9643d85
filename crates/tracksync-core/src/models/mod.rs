//! Data models for tracksync

mod match_record;
mod user;

pub use match_record::{Match, MatchId, MatchPlayer, MatchState, MatchTeam, PlayerStat};
pub use user::{User, UserId};
