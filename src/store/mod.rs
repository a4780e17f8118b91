//! Persistence traits for the authentication core.
//!
//! The core state machine in [`crate::auth`] only talks to these traits, so a
//! backend is a drop-in: [`postgres::PostgresStore`] for deployments,
//! [`memory::MemoryStore`] for tests and database-less local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// A registered account. `password_hash` is a PHC string and stays nullable
/// to leave room for non-password credentials.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub email_verified: bool,
}

/// A session row. The `id` is the raw bearer token carried in the cookie.
#[derive(Clone, Debug)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// An outstanding email-verification code. At most one row per user.
#[derive(Clone, Debug)]
pub struct VerificationRecord {
    pub user_id: String,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (duplicate email).
    #[error("duplicate key")]
    Conflict,
    /// The backend is unreachable or misbehaving; fatal for the request.
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Returns [`StoreError::Conflict`] when the email is
    /// already taken.
    async fn insert_user(&self, user: &UserRecord) -> StoreResult<()>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>>;

    async fn update_user_verified(&self, id: &str, verified: bool) -> StoreResult<()>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &SessionRecord) -> StoreResult<()>;

    async fn find_session_by_id(&self, id: &str) -> StoreResult<Option<SessionRecord>>;

    /// Delete one session. Deleting a missing id is not an error.
    async fn delete_session(&self, id: &str) -> StoreResult<()>;

    /// Delete every session belonging to the user.
    async fn delete_sessions_by_user(&self, user_id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn delete_by_user(&self, user_id: &str) -> StoreResult<()>;

    async fn insert_code(&self, code: &VerificationRecord) -> StoreResult<()>;

    /// Atomically delete the row matching all three fields and return it.
    ///
    /// This must be a single atomic operation, not read-then-delete: the
    /// returned row (or its absence) is what gives concurrent verification
    /// attempts at-most-one-success semantics.
    async fn delete_and_return_by_user_code_email(
        &self,
        user_id: &str,
        email: &str,
        code: &str,
    ) -> StoreResult<Option<VerificationRecord>>;
}

/// The full backend surface the server wires up.
#[async_trait]
pub trait Store: UserStore + SessionStore + VerificationStore {
    /// Cheap connectivity probe for the health endpoint.
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name reported by `/health`.
    fn backend(&self) -> &'static str;
}
