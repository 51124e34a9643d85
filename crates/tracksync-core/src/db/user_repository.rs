//! User (match owner) repository implementation

use crate::error::{Error, Result};
use crate::models::{User, UserId};
use libsql::{Connection, Value};

/// Trait for owner account lookups (async)
#[allow(async_fn_in_trait)]
pub trait UserRepository {
    /// Get a user by ID
    async fn get(&self, id: &UserId) -> Result<Option<User>>;

    /// Find a user by username (case-insensitive)
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Return the user with the given name, creating it when missing
    async fn get_or_create(&self, username: &str) -> Result<User>;
}

/// libSQL implementation of `UserRepository`
pub struct LibSqlUserRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlUserRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_user(row: &libsql::Row) -> Result<User> {
        let id: String = row.get(0)?;
        Ok(User {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("Invalid user ID: {id}")))?,
            username: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    async fn query_one(&self, sql: &str, param: String) -> Result<Option<User>> {
        let mut rows = self.conn.query(sql, [param]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_user(&row)?)),
            None => Ok(None),
        }
    }
}

impl UserRepository for LibSqlUserRepository<'_> {
    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        self.query_one(
            "SELECT id, username, created_at FROM users WHERE id = ?",
            id.as_str(),
        )
        .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_one(
            "SELECT id, username, created_at FROM users WHERE username = ? COLLATE NOCASE",
            username.trim().to_string(),
        )
        .await
    }

    async fn get_or_create(&self, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("Username cannot be empty".into()));
        }

        if let Some(user) = self.find_by_username(username).await? {
            return Ok(user);
        }

        let user = User::new(username);
        self.conn
            .execute(
                "INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)",
                vec![
                    Value::Text(user.id.as_str()),
                    Value::Text(user.username.clone()),
                    Value::Integer(user.created_at),
                ],
            )
            .await?;
        tracing::debug!("Created owner account {}", user.username);

        Ok(user)
    }
}
