use anyhow::Result;
use clap::{Arg, ArgAction, Command};

pub const ARG_COOKIE_NAME: &str = "cookie-name";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SESSION_FRESH_SECONDS: &str = "session-fresh-seconds";
pub const ARG_CODE_TTL_SECONDS: &str = "verification-code-ttl-seconds";
pub const ARG_ALLOWED_HOST: &str = "allowed-host";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_COOKIE_NAME)
                .long(ARG_COOKIE_NAME)
                .help("Name of the session cookie")
                .env("GATEHOUSE_COOKIE_NAME")
                .default_value("gatehouse_session"),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark the session cookie as Secure (HTTPS only)")
                .env("GATEHOUSE_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session TTL in seconds")
                .env("GATEHOUSE_SESSION_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SESSION_FRESH_SECONDS)
                .long(ARG_SESSION_FRESH_SECONDS)
                .help("Remaining lifetime below which the session cookie is re-sent")
                .env("GATEHOUSE_SESSION_FRESH_SECONDS")
                .default_value("1296000")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_CODE_TTL_SECONDS)
                .long(ARG_CODE_TTL_SECONDS)
                .help("Email verification code TTL in seconds")
                .env("GATEHOUSE_VERIFICATION_CODE_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_ALLOWED_HOST)
                .long(ARG_ALLOWED_HOST)
                .help("Extra host[:port] accepted by the cross-origin check, repeatable")
                .env("GATEHOUSE_ALLOWED_HOST")
                .action(ArgAction::Append),
        )
}

#[derive(Debug)]
pub struct Options {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub session_ttl_seconds: i64,
    pub session_fresh_seconds: i64,
    pub verification_code_ttl_seconds: i64,
    pub allowed_hosts: Vec<String>,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let cookie_name = matches
            .get_one::<String>(ARG_COOKIE_NAME)
            .cloned()
            .unwrap_or_else(|| "gatehouse_session".to_string());
        let allowed_hosts = matches
            .get_many::<String>(ARG_ALLOWED_HOST)
            .map(|hosts| hosts.cloned().collect())
            .unwrap_or_default();

        Ok(Self {
            cookie_name,
            cookie_secure: matches.get_flag(ARG_COOKIE_SECURE),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(2_592_000),
            session_fresh_seconds: matches
                .get_one::<i64>(ARG_SESSION_FRESH_SECONDS)
                .copied()
                .unwrap_or(1_296_000),
            verification_code_ttl_seconds: matches
                .get_one::<i64>(ARG_CODE_TTL_SECONDS)
                .copied()
                .unwrap_or(900),
            allowed_hosts,
        })
    }
}
