pub mod archive;
pub mod common;
pub mod delete;
pub mod export;
pub mod list;
pub mod show;
pub mod sync;
