//! Shared services used by the CLI.

mod database;

pub use database::DatabaseService;
