//! Password hashing with Argon2id.
//!
//! Each hash carries its own random salt in the PHC output, so hashing the
//! same password twice yields different strings. Verification never fails
//! loudly: a malformed stored hash is simply a non-match.

use anyhow::{anyhow, Context, Result};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::OnceLock;

/// Hash a plaintext password into a PHC string.
///
/// # Errors
/// Only fails on internal hasher errors; well-formed input always succeeds.
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Check a plaintext against a stored PHC string.
#[must_use]
pub fn verify(stored: &str, plaintext: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    })
}

/// A process-wide hash of an unguessable value.
///
/// Login verifies against this when the email is unknown, so "user not found"
/// costs the same as "wrong password" and the two stay indistinguishable on
/// the wire and on the clock.
pub fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        hash("gatehouse-dummy-password").unwrap_or_else(|_| String::new())
    })
}

/// Run [`hash`] on the blocking pool; Argon2 is deliberately slow and must
/// not stall the async executor.
///
/// # Errors
/// Propagates hasher errors and task-join failures.
pub async fn hash_blocking(plaintext: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash(&plaintext))
        .await
        .context("password hashing task failed")?
}

/// Run [`verify`] on the blocking pool.
///
/// # Errors
/// Fails only if the blocking task cannot be joined.
pub async fn verify_blocking(stored: String, plaintext: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify(&stored, &plaintext))
        .await
        .context("password verification task failed")
}
