//! Auth handlers: signup, login, logout, session introspection, and email
//! verification. The request guard in [`crate::api::guard`] has already run
//! by the time any of these execute.

pub(crate) mod login;
pub(crate) mod session;
pub(crate) mod signup;
mod state;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;

pub use state::{AuthConfig, AuthState};
