//! tracksync-core - Core library for tracksync
//!
//! This crate contains the match models, the Tracker.gg client and payload
//! normalizer, the database layer, and the sync/merge service used by the
//! `tracksync` CLI.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod sync;
pub mod tracker;

pub use error::{Error, Result};
pub use models::{Match, MatchId, User, UserId};
pub use sync::{MatchSyncService, SyncRequest, SyncSummary};
