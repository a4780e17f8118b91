//! In-process store.
//!
//! Keeps the whole data set behind one mutex, which doubles as the atomicity
//! guarantee for `delete_and_return_by_user_code_email`. Used by the test
//! suite and by `gatehouse` runs without `--dsn`.

use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{
    SessionRecord, SessionStore, Store, StoreError, StoreResult, UserRecord, UserStore,
    VerificationRecord, VerificationStore,
};

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    sessions: HashMap<String, SessionRecord>,
    // Keyed by user id: at most one outstanding code per user.
    codes: HashMap<String, VerificationRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable(anyhow!("memory store mutex poisoned")))
    }

    /// Number of user rows. Introspection for tests and local debugging.
    pub fn user_count(&self) -> usize {
        self.inner.lock().map_or(0, |inner| inner.users.len())
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().map_or(0, |inner| inner.sessions.len())
    }

    pub fn code_count(&self) -> usize {
        self.inner.lock().map_or(0, |inner| inner.codes.len())
    }

    /// The outstanding verification code for a user, if any.
    pub fn code_for_user(&self, user_id: &str) -> Option<VerificationRecord> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.codes.get(user_id).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &UserRecord) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.users.contains_key(&user.id)
            || inner.users.values().any(|row| row.email == user.email)
        {
            return Err(StoreError::Conflict);
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let inner = self.lock()?;
        Ok(inner.users.values().find(|row| row.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        let inner = self.lock()?;
        Ok(inner.users.get(id).cloned())
    }

    async fn update_user_verified(&self, id: &str, verified: bool) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if let Some(user) = inner.users.get_mut(id) {
            user.email_verified = verified;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &SessionRecord) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.sessions.contains_key(&session.id) {
            return Err(StoreError::Conflict);
        }
        inner.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_session_by_id(&self, id: &str) -> StoreResult<Option<SessionRecord>> {
        let inner = self.lock()?;
        Ok(inner.sessions.get(id).cloned())
    }

    async fn delete_session(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.sessions.remove(id);
        Ok(())
    }

    async fn delete_sessions_by_user(&self, user_id: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.sessions.retain(|_, row| row.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn delete_by_user(&self, user_id: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.codes.remove(user_id);
        Ok(())
    }

    async fn insert_code(&self, code: &VerificationRecord) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.codes.contains_key(&code.user_id) {
            return Err(StoreError::Conflict);
        }
        inner.codes.insert(code.user_id.clone(), code.clone());
        Ok(())
    }

    async fn delete_and_return_by_user_code_email(
        &self,
        user_id: &str,
        email: &str,
        code: &str,
    ) -> StoreResult<Option<VerificationRecord>> {
        // Remove-and-return under the lock mirrors the SQL DELETE ... RETURNING.
        let mut inner = self.lock()?;
        let matches = inner
            .codes
            .get(user_id)
            .is_some_and(|row| row.email == email && row.code == code);
        if !matches {
            return Ok(None);
        }
        Ok(inner.codes.remove(user_id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
