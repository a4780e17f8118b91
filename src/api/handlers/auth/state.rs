//! Auth configuration and shared request state.

use chrono::Duration;
use std::sync::Arc;

use crate::api::email::Mailer;
use crate::auth::{SessionManager, VerificationCodeManager};
use crate::store::Store;

const DEFAULT_COOKIE_NAME: &str = "gatehouse_session";
const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
const DEFAULT_SESSION_FRESH_SECONDS: i64 = 15 * 24 * 60 * 60;
const DEFAULT_CODE_TTL_SECONDS: i64 = 15 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    cookie_name: String,
    cookie_secure: bool,
    session_ttl_seconds: i64,
    session_fresh_seconds: i64,
    verification_code_ttl_seconds: i64,
    // Extra hosts the origin check accepts besides the request's own Host.
    allowed_hosts: Vec<String>,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_fresh_seconds: DEFAULT_SESSION_FRESH_SECONDS,
            verification_code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            allowed_hosts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: String) -> Self {
        self.cookie_name = name;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_fresh_seconds(mut self, seconds: i64) -> Self {
        self.session_fresh_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_verification_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verification_code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_allowed_hosts(mut self, hosts: Vec<String>) -> Self {
        self.allowed_hosts = hosts;
        self
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_fresh_seconds(&self) -> i64 {
        self.session_fresh_seconds
    }

    #[must_use]
    pub fn verification_code_ttl_seconds(&self) -> i64 {
        self.verification_code_ttl_seconds
    }

    #[must_use]
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a handler needs, threaded through as one request extension
/// instead of module-level state.
pub struct AuthState {
    config: AuthConfig,
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    sessions: SessionManager,
    verification: VerificationCodeManager,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        let sessions = SessionManager::new(
            store.clone(),
            Duration::seconds(config.session_ttl_seconds()),
            Duration::seconds(config.session_fresh_seconds()),
        );
        let verification = VerificationCodeManager::new(
            store.clone(),
            Duration::seconds(config.verification_code_ttl_seconds()),
        );
        Self {
            config,
            store,
            mailer,
            sessions,
            verification,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    #[must_use]
    pub fn mailer(&self) -> &Arc<dyn Mailer> {
        &self.mailer
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[must_use]
    pub fn verification(&self) -> &VerificationCodeManager {
        &self.verification
    }
}
