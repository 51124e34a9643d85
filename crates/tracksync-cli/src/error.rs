use std::io;

use thiserror::Error;
use tracksync_core::config::ConfigError;
use tracksync_core::tracker::TrackerError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tracksync_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Match ID cannot be empty")]
    EmptyMatchId,
    #[error("Match not found for id/prefix: {0}")]
    MatchNotFound(String),
    #[error("{0}")]
    AmbiguousMatchId(String),
}
