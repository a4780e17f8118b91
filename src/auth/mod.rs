//! The authentication state machine: password hashing, session lifecycle,
//! and the verification-code protocol. Nothing in here knows which store
//! backend is behind the [`crate::store::Store`] traits.

mod error;
pub mod password;
mod session;
mod verification;

pub use error::Error;
pub use session::{SessionManager, ValidatedSession};
pub use verification::{VerificationCodeManager, CODE_LENGTH};
