//! Single-use, time-limited email-verification codes.
//!
//! One outstanding code per user: issuing replaces any prior row. Consuming
//! deletes first and checks expiry second, so a code is burned by its first
//! attempt whether or not that attempt succeeds.

use chrono::{Duration, Utc};
use rand::{rngs::OsRng, Rng};
use std::sync::Arc;

use super::Error;
use crate::store::{Store, VerificationRecord};

pub const CODE_LENGTH: usize = 8;

#[derive(Clone)]
pub struct VerificationCodeManager {
    store: Arc<dyn Store>,
    ttl: Duration,
}

impl VerificationCodeManager {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issue a fresh code for the user/email pair, replacing any prior one,
    /// and return it for delivery.
    ///
    /// # Errors
    /// Propagates store failures as infrastructure errors.
    pub async fn issue(&self, user_id: &str, email: &str) -> Result<String, Error> {
        self.store.delete_by_user(user_id).await?;
        let code = generate_code();
        self.store
            .insert_code(&VerificationRecord {
                user_id: user_id.to_string(),
                email: email.to_string(),
                code: code.clone(),
                expires_at: Utc::now() + self.ttl,
            })
            .await?;
        Ok(code)
    }

    /// Attempt to consume a code. Returns whether verification succeeded.
    ///
    /// The row is deleted atomically before expiry is checked: an expired
    /// code returns `false` but is gone regardless, and a replayed code
    /// always fails after the first attempt.
    ///
    /// # Errors
    /// Propagates store failures as infrastructure errors.
    pub async fn consume(&self, user_id: &str, email: &str, code: &str) -> Result<bool, Error> {
        let Some(record) = self
            .store
            .delete_and_return_by_user_code_email(user_id, email, code)
            .await?
        else {
            return Ok(false);
        };
        Ok(Utc::now() <= record.expires_at)
    }
}

/// Eight digits, each drawn independently and uniformly.
fn generate_code() -> String {
    let mut rng = OsRng;
    (0..CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
