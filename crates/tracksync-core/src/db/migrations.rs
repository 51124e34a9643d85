//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: users and the match graph
async fn migrate_v1(conn: &Connection) -> Result<()> {
    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at INTEGER NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            tracker_match_id TEXT NOT NULL,
            map_name TEXT,
            mode TEXT,
            played_at INTEGER,
            duration INTEGER,
            score_team_a INTEGER,
            score_team_b INTEGER,
            raw_payload TEXT NOT NULL DEFAULT 'null',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            archived_at INTEGER,
            UNIQUE (owner_id, tracker_match_id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_matches_owner_played ON matches(owner_id, played_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_matches_owner_archived ON matches(owner_id, archived_at)",
        "CREATE TABLE IF NOT EXISTS match_teams (
            id TEXT PRIMARY KEY,
            match_id TEXT NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            side TEXT,
            score INTEGER
        )",
        "CREATE INDEX IF NOT EXISTS idx_match_teams_match ON match_teams(match_id)",
        "CREATE TABLE IF NOT EXISTS match_players (
            id TEXT PRIMARY KEY,
            match_id TEXT NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
            team_id TEXT REFERENCES match_teams(id) ON DELETE SET NULL,
            position INTEGER NOT NULL,
            tracker_player_id TEXT,
            handle TEXT,
            tag TEXT,
            agent TEXT
        )",
        "CREATE INDEX IF NOT EXISTS idx_match_players_match ON match_players(match_id)",
        "CREATE TABLE IF NOT EXISTS player_stats (
            player_id TEXT PRIMARY KEY REFERENCES match_players(id) ON DELETE CASCADE,
            kills INTEGER NOT NULL DEFAULT 0,
            deaths INTEGER NOT NULL DEFAULT 0,
            assists INTEGER NOT NULL DEFAULT 0,
            headshots INTEGER,
            damage INTEGER,
            weapons TEXT,
            timing TEXT,
            extra TEXT
        )",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    run_in_transaction(conn, &statements).await?;
    tracing::info!("Migrated database to version 1");
    Ok(())
}

// libsql doesn't have execute_batch, so each statement runs separately
async fn run_in_transaction(conn: &Connection, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    async fn table_exists(conn: &Connection, name: &str) -> bool {
        let mut rows = conn
            .query(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master
                    WHERE type = 'table' AND name = ?
                )",
                [name],
            )
            .await
            .unwrap();

        rows.next()
            .await
            .unwrap()
            .is_some_and(|row| row.get::<i32>(0).unwrap() != 0)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap(); // Should not fail

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migration_v1_creates_match_graph_tables() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        for table in ["users", "matches", "match_teams", "match_players", "player_stats"] {
            assert!(table_exists(&conn, table).await, "missing table {table}");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migration_v1_creates_listing_indexes() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'matches'
                 ORDER BY name",
                (),
            )
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            names.push(row.get::<String>(0).unwrap());
        }

        assert!(names.contains(&"idx_matches_owner_archived".to_string()));
        assert!(names.contains(&"idx_matches_owner_played".to_string()));
        assert_eq!(get_version(&conn).await.unwrap(), 1);
    }
}
