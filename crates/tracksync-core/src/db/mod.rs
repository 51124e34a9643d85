//! Database layer for tracksync

mod connection;
mod match_repository;
mod migrations;
mod user_repository;

pub use connection::Database;
pub use match_repository::{LibSqlMatchRepository, MatchRepository};
pub use user_repository::{LibSqlUserRepository, UserRepository};
