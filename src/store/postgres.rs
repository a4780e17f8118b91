//! Postgres-backed store.
//!
//! Schema lives in `migrations/schema.sql`. Every query runs under a
//! `db.query` span so request traces show the exact statement.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, Connection, PgPool, Row};
use std::time::Duration;
use tracing::{info_span, Instrument};

use super::{
    SessionRecord, SessionStore, Store, StoreError, StoreResult, UserRecord, UserStore,
    VerificationRecord, VerificationStore,
};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to the database behind `dsn`.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be established.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        email_verified: row.get("email_verified"),
    }
}

fn session_from_row(row: &sqlx::postgres::PgRow) -> SessionRecord {
    SessionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get::<DateTime<Utc>, _>("expires_at"),
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: &UserRecord) -> StoreResult<()> {
        let query = r"
            INSERT INTO users (id, email, password_hash, email_verified)
            VALUES ($1, $2, $3, $4)
        ";
        let result = sqlx::query(query)
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.email_verified)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert user")
                .into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let query = r"
            SELECT id, email, password_hash, email_verified
            FROM users
            WHERE email = $1
        ";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup user by email")?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        let query = r"
            SELECT id, email, password_hash, email_verified
            FROM users
            WHERE id = $1
        ";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup user by id")?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_user_verified(&self, id: &str, verified: bool) -> StoreResult<()> {
        let query = "UPDATE users SET email_verified = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(verified)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update user verified flag")?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn insert_session(&self, session: &SessionRecord) -> StoreResult<()> {
        let query = r"
            INSERT INTO user_sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
        ";
        let result = sqlx::query(query)
            .bind(&session.id)
            .bind(&session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert session")
                .into()),
        }
    }

    async fn find_session_by_id(&self, id: &str) -> StoreResult<Option<SessionRecord>> {
        let query = r"
            SELECT id, user_id, expires_at
            FROM user_sessions
            WHERE id = $1
        ";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup session")?;
        Ok(row.as_ref().map(session_from_row))
    }

    async fn delete_session(&self, id: &str) -> StoreResult<()> {
        let query = "DELETE FROM user_sessions WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete session")?;
        Ok(())
    }

    async fn delete_sessions_by_user(&self, user_id: &str) -> StoreResult<()> {
        let query = "DELETE FROM user_sessions WHERE user_id = $1";
        sqlx::query(query)
            .bind(user_id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete sessions for user")?;
        Ok(())
    }
}

#[async_trait]
impl VerificationStore for PostgresStore {
    async fn delete_by_user(&self, user_id: &str) -> StoreResult<()> {
        let query = "DELETE FROM email_verification_codes WHERE user_id = $1";
        sqlx::query(query)
            .bind(user_id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete verification codes for user")?;
        Ok(())
    }

    async fn insert_code(&self, code: &VerificationRecord) -> StoreResult<()> {
        let query = r"
            INSERT INTO email_verification_codes (user_id, email, code, expires_at)
            VALUES ($1, $2, $3, $4)
        ";
        let result = sqlx::query(query)
            .bind(&code.user_id)
            .bind(&code.email)
            .bind(&code.code)
            .bind(code.expires_at)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert verification code")
                .into()),
        }
    }

    async fn delete_and_return_by_user_code_email(
        &self,
        user_id: &str,
        email: &str,
        code: &str,
    ) -> StoreResult<Option<VerificationRecord>> {
        // Single atomic statement: the RETURNING clause is what guarantees
        // at-most-one caller observes the row under concurrent submissions.
        let query = r"
            DELETE FROM email_verification_codes
            WHERE user_id = $1 AND email = $2 AND code = $3
            RETURNING user_id, email, code, expires_at
        ";
        let row = sqlx::query(query)
            .bind(user_id)
            .bind(email)
            .bind(code)
            .fetch_optional(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to consume verification code")?;

        Ok(row.map(|row| VerificationRecord {
            user_id: row.get("user_id"),
            email: row.get("email"),
            code: row.get("code"),
            expires_at: row.get::<DateTime<Utc>, _>("expires_at"),
        }))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn ping(&self) -> StoreResult<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
