use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{GameFilters, SessionId};

/// Filesystem-backed session store: one SQLite database file, one row per
/// live session. Sessions carry the validated form inputs from the entry
/// page to the result page and nothing else.
#[derive(Clone)]
pub struct SessionStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session_id: SessionId,
    pub username: String,
    pub filters: GameFilters,
    pub expires_at: DateTime<Utc>,
}

impl SessionStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        let store = Self { pool };
        store.ensure_sessions_table().await?;
        Ok(store)
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_sessions_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id           TEXT PRIMARY KEY,
                username     TEXT NOT NULL,
                player_count INTEGER,
                playing_time INTEGER,
                expires_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure sessions table exists")?;
        Ok(())
    }

    /// Writes a fresh session row and returns its id. Called once per
    /// successful form submission.
    pub async fn create_session(
        &self,
        username: &str,
        filters: GameFilters,
        ttl: Duration,
    ) -> Result<SessionId> {
        let session_id = SessionId::generate();
        let expires_at = Utc::now() + ttl;
        sqlx::query(
            "INSERT INTO sessions (id, username, player_count, playing_time, expires_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id.to_string())
        .bind(username)
        .bind(filters.player_count.map(i64::from))
        .bind(filters.playing_time.map(i64::from))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(session_id)
    }

    /// Loads a live session. An expired row is deleted on the way out and
    /// reported as absent, so callers never see stale state.
    pub async fn load_session(&self, session_id: SessionId) -> Result<Option<StoredSession>> {
        let row = sqlx::query(
            "SELECT username, player_count, playing_time, expires_at
             FROM sessions WHERE id = ?",
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = row.get(3);
        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(session_id.to_string())
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(StoredSession {
            session_id,
            username: row.get::<String, _>(0),
            filters: GameFilters {
                player_count: row
                    .get::<Option<i64>, _>(1)
                    .and_then(|v| u32::try_from(v).ok()),
                playing_time: row
                    .get::<Option<i64>, _>(2)
                    .and_then(|v| u32::try_from(v).ok()),
            },
            expires_at,
        }))
    }

    /// Deletes every expired row. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
