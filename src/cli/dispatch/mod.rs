//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action the binary should run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, smtp};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>("dsn").cloned();

    let auth_opts = auth::Options::parse(matches)?;
    let smtp_opts = smtp::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        cookie_name: auth_opts.cookie_name,
        cookie_secure: auth_opts.cookie_secure,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        session_fresh_seconds: auth_opts.session_fresh_seconds,
        verification_code_ttl_seconds: auth_opts.verification_code_ttl_seconds,
        allowed_hosts: auth_opts.allowed_hosts,
        smtp_host: smtp_opts.host,
        smtp_port: smtp_opts.port,
        smtp_username: smtp_opts.username,
        smtp_password: smtp_opts.password,
        smtp_from: smtp_opts.from,
    }))
}
