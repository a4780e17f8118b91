use crate::api::{self, AuthConfig, AuthState, LogMailer, Mailer, SmtpMailer};
use crate::store::{MemoryStore, PostgresStore, Store};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub session_ttl_seconds: i64,
    pub session_fresh_seconds: i64,
    pub verification_code_ttl_seconds: i64,
    pub allowed_hosts: Vec<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub smtp_from: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database or SMTP relay configuration is invalid,
/// or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let store: Arc<dyn Store> = match &args.dsn {
        Some(dsn) => Arc::new(PostgresStore::connect(dsn).await?),
        None => {
            warn!("No --dsn given, using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match &args.smtp_host {
        Some(host) => {
            info!("Delivering email via {host}:{}", args.smtp_port);
            Arc::new(SmtpMailer::new(
                host,
                args.smtp_port,
                args.smtp_username,
                args.smtp_password,
                &args.smtp_from,
            )?)
        }
        None => {
            warn!("No --smtp-host given, verification emails are logged instead of sent");
            Arc::new(LogMailer)
        }
    };

    let auth_config = AuthConfig::new()
        .with_cookie_name(args.cookie_name)
        .with_cookie_secure(args.cookie_secure)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_session_fresh_seconds(args.session_fresh_seconds)
        .with_verification_code_ttl_seconds(args.verification_code_ttl_seconds)
        .with_allowed_hosts(args.allowed_hosts);

    let auth_state = Arc::new(AuthState::new(auth_config, store, mailer));

    api::new(args.port, auth_state).await
}
