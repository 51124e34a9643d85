//! Shared database service wrapper used by the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlMatchRepository, LibSqlUserRepository, MatchRepository, UserRepository,
};
use crate::models::{Match, MatchId, User};
use crate::sync::{MatchSyncService, SyncRequest, SyncSummary};
use crate::tracker::MatchSource;
use crate::Result;

/// Thread-safe service for DB, repository and sync operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening match database at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing database file, if any.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Resolve the owner account, creating it on first use.
    pub async fn get_or_create_user(&self, username: &str) -> Result<User> {
        let db = self.db.lock().await;
        let repo = LibSqlUserRepository::new(db.connection());
        repo.get_or_create(username).await
    }

    /// List an owner's matches, most recently played first.
    pub async fn list_matches(
        &self,
        owner: &User,
        include_archived: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>> {
        let db = self.db.lock().await;
        let repo = LibSqlMatchRepository::new(db.connection());
        repo.list(&owner.id, include_archived, limit, offset).await
    }

    /// Fetch one of the owner's matches by id.
    pub async fn get_match(&self, owner: &User, id: &MatchId) -> Result<Option<Match>> {
        let db = self.db.lock().await;
        let repo = LibSqlMatchRepository::new(db.connection());
        repo.get(&owner.id, id).await
    }

    /// List match ids of the owner starting with `prefix`.
    pub async fn list_match_ids_by_prefix(
        &self,
        owner: &User,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let repo = LibSqlMatchRepository::new(db.connection());
        repo.list_ids_by_prefix(&owner.id, prefix, limit).await
    }

    /// Fetch the owner's match history from `source` and upsert it.
    pub async fn sync_matches<S: MatchSource>(
        &self,
        source: &S,
        owner: &User,
        request: &SyncRequest,
    ) -> Result<SyncSummary> {
        let db = self.db.lock().await;
        let repo = LibSqlMatchRepository::new(db.connection());
        MatchSyncService::new(&repo)
            .sync(source, owner, request)
            .await
    }

    /// Soft-archive one of the owner's matches.
    pub async fn archive_match(&self, owner: &User, id: &MatchId) -> Result<Match> {
        let db = self.db.lock().await;
        let repo = LibSqlMatchRepository::new(db.connection());
        MatchSyncService::new(&repo).archive(owner, id).await
    }

    /// Permanently delete one of the owner's matches.
    pub async fn delete_match(&self, owner: &User, id: &MatchId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlMatchRepository::new(db.connection());
        MatchSyncService::new(&repo).delete(owner, id).await
    }
}
