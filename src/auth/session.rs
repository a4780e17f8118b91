//! Session lifecycle: create, validate, rotate, invalidate.
//!
//! A session moves through ACTIVE -> STALE -> EXPIRED -> absent. Validation
//! of a stale session flags a cookie refresh but leaves the stored
//! `expires_at` untouched; only `create` writes a stored expiry. The
//! transport cookie can therefore outlive the persisted value, a quirk kept
//! on purpose (see DESIGN.md) rather than silently reconciled.

use anyhow::Context;
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;

use super::Error;
use crate::store::{SessionRecord, Store, UserRecord};

/// A resolved session together with its owner.
#[derive(Clone, Debug)]
pub struct ValidatedSession {
    pub user: UserRecord,
    pub session: SessionRecord,
    /// True when the session is past the freshness window and the caller
    /// should reissue the cookie with a full max-age.
    pub refresh_cookie: bool,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    ttl: Duration,
    fresh_for: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, ttl: Duration, fresh_for: Duration) -> Self {
        Self {
            store,
            ttl,
            fresh_for,
        }
    }

    /// Create a session for the user and return it with its raw token.
    ///
    /// # Errors
    /// Propagates store failures as infrastructure errors.
    pub async fn create(&self, user_id: &str) -> Result<SessionRecord, Error> {
        let session = SessionRecord {
            id: generate_token()?,
            user_id: user_id.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        self.store.insert_session(&session).await?;
        Ok(session)
    }

    /// Resolve a raw token into its session and user.
    ///
    /// Absent and expired sessions both come back as `None`; an expired row
    /// is deleted on sight. A session whose remaining lifetime has dropped
    /// below the freshness window is returned with `refresh_cookie` set.
    ///
    /// # Errors
    /// Propagates store failures as infrastructure errors.
    pub async fn validate(&self, token: &str) -> Result<Option<ValidatedSession>, Error> {
        let Some(session) = self.store.find_session_by_id(token).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.expires_at <= now {
            self.store.delete_session(&session.id).await?;
            return Ok(None);
        }

        let Some(user) = self.store.find_user_by_id(&session.user_id).await? else {
            // Orphaned session; treat as absent.
            self.store.delete_session(&session.id).await?;
            return Ok(None);
        };

        let refresh_cookie = session.expires_at - now < self.fresh_for;
        Ok(Some(ValidatedSession {
            user,
            session,
            refresh_cookie,
        }))
    }

    /// Delete one session. Idempotent.
    ///
    /// # Errors
    /// Propagates store failures as infrastructure errors.
    pub async fn invalidate(&self, token: &str) -> Result<(), Error> {
        self.store.delete_session(token).await?;
        Ok(())
    }

    /// Delete every session the user holds, forcing re-authentication of
    /// other devices.
    ///
    /// # Errors
    /// Propagates store failures as infrastructure errors.
    pub async fn invalidate_all(&self, user_id: &str) -> Result<(), Error> {
        self.store.delete_sessions_by_user(user_id).await?;
        Ok(())
    }
}

/// 32 random bytes, base64url without padding. The raw value is the bearer
/// credential; it is only ever handed to the cookie.
fn generate_token() -> Result<String, Error> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
