//! SQLite-backed linked-account store.

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use actionkit_core::{
    ActionId, AuthKind, CoreError, CoreResult, LinkedAccount, LinkedAccountStore,
};

use crate::error::{StoreError, StoreResult};

/// SQLite-based implementation of [`LinkedAccountStore`].
#[derive(Debug, Clone)]
pub struct SqlLinkedAccountStore {
    pool: SqlitePool,
}

impl SqlLinkedAccountStore {
    /// Connect and run migrations. Accepts `sqlite://path` and
    /// `sqlite::memory:` URLs; file databases are created when missing.
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let pool = if let Some(path_str) = database_url.strip_prefix("sqlite://") {
            let options = SqliteConnectOptions::new()
                .filename(PathBuf::from(path_str))
                .create_if_missing(true);
            SqlitePoolOptions::new().max_connections(10).connect_with(options).await?
        } else {
            let options =
                SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
            SqlitePoolOptions::new().max_connections(10).connect_with(options).await?
        };

        sqlx::query("PRAGMA foreign_keys = ON;").execute(&pool).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create from an existing pool (for testing). Migrations still need to
    /// be run through [`Self::migrate`].
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations, tracked in a `_migrations` table.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let applied: Vec<i64> =
            sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
                .fetch_all(&self.pool)
                .await?;

        if !applied.contains(&1) {
            self.run_script(include_str!("../migrations/001_linked_accounts.sql")).await?;
            sqlx::query("INSERT INTO _migrations (version, name) VALUES (1, '001_linked_accounts')")
                .execute(&self.pool)
                .await?;
            tracing::debug!("applied migration 001_linked_accounts");
        }

        Ok(())
    }

    /// Execute a multi-statement migration script, one statement at a time
    /// (SQLite prepared statements are single-statement).
    async fn run_script(&self, script: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for statement in script.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn auth_kind_to_str(kind: AuthKind) -> &'static str {
    match kind {
        AuthKind::None => "none",
        AuthKind::Token => "token",
        AuthKind::OAuth => "oauth",
    }
}

fn auth_kind_from_str(s: &str) -> CoreResult<AuthKind> {
    match s {
        "none" => Ok(AuthKind::None),
        "token" => Ok(AuthKind::Token),
        "oauth" => Ok(AuthKind::OAuth),
        other => Err(CoreError::Db(format!("unknown auth kind: {other}"))),
    }
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> CoreResult<LinkedAccount> {
    let custom_data = row
        .get::<Option<String>, _>("custom_data")
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| CoreError::from(StoreError::Serde(e)))?;

    Ok(LinkedAccount {
        action_id: ActionId::new(row.get::<String, _>("action_id")),
        auth_kind: auth_kind_from_str(&row.get::<String, _>("auth_kind"))?,
        access_token: row.get("access_token"),
        refresh_token: row.get("refresh_token"),
        expires_at: row.get("expires_at"),
        scope: row.get("scope"),
        custom_data,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

fn db_err(err: sqlx::Error) -> CoreError {
    StoreError::Database(err).into()
}

#[async_trait]
impl LinkedAccountStore for SqlLinkedAccountStore {
    async fn upsert(&self, account: &LinkedAccount) -> CoreResult<()> {
        let custom_data = account
            .custom_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| CoreError::from(StoreError::Serde(e)))?;

        sqlx::query(
            r#"
            INSERT INTO linked_accounts
                (action_id, auth_kind, access_token, refresh_token, expires_at,
                 scope, custom_data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(action_id) DO UPDATE SET
                auth_kind = excluded.auth_kind,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                scope = excluded.scope,
                custom_data = excluded.custom_data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(account.action_id.as_str())
        .bind(auth_kind_to_str(account.auth_kind))
        .bind(&account.access_token)
        .bind(&account.refresh_token)
        .bind(account.expires_at)
        .bind(&account.scope)
        .bind(custom_data)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, action_id: &ActionId) -> CoreResult<Option<LinkedAccount>> {
        let row = sqlx::query("SELECT * FROM linked_accounts WHERE action_id = ?")
            .bind(action_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_account).transpose()
    }

    async fn delete(&self, action_id: &ActionId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM linked_accounts WHERE action_id = ?")
            .bind(action_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> CoreResult<Vec<LinkedAccount>> {
        let rows = sqlx::query("SELECT * FROM linked_accounts ORDER BY action_id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_account).collect()
    }

    async fn list_by_auth_kind(&self, kind: AuthKind) -> CoreResult<Vec<LinkedAccount>> {
        let rows =
            sqlx::query("SELECT * FROM linked_accounts WHERE auth_kind = ? ORDER BY action_id")
                .bind(auth_kind_to_str(kind))
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        rows.iter().map(row_to_account).collect()
    }
}
