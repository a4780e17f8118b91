//! # Gatehouse (credential and session authentication core)
//!
//! `gatehouse` is a small authentication service: password accounts, cookie
//! sessions, and single-use email verification codes behind an HTTP API.
//!
//! ## Sessions
//!
//! A session is identified by a 32-byte random token, sent back to the client
//! in an `HttpOnly` cookie and stored verbatim as the lookup key. Sessions
//! that pass the freshness window get their cookie re-sent; expired sessions
//! are deleted on first sight.
//!
//! ## Email verification
//!
//! Signup issues an 8-digit single-use code with a short TTL. Consuming a
//! code is atomic: the row is deleted before the expiry is checked, so a
//! replayed or expired code can never succeed twice.
//!
//! ## Error discipline
//!
//! Responses never reveal whether an email exists, which credential part was
//! wrong, or whether a code was invalid rather than expired.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
