use anyhow::Result;
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM: &str = "smtp-from";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host, verification emails are logged when unset")
                .env("GATEHOUSE_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port")
                .env("GATEHOUSE_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username")
                .env("GATEHOUSE_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("GATEHOUSE_SMTP_PASSWORD"),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM)
                .long(ARG_SMTP_FROM)
                .help("From address for outbound email")
                .env("GATEHOUSE_SMTP_FROM")
                .default_value("no-reply@gatehouse.dev"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: String,
}

impl Options {
    /// Extract SMTP options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            host: matches.get_one::<String>(ARG_SMTP_HOST).cloned(),
            port: matches
                .get_one::<u16>(ARG_SMTP_PORT)
                .copied()
                .unwrap_or(587),
            username: matches.get_one::<String>(ARG_SMTP_USERNAME).cloned(),
            password: matches
                .get_one::<String>(ARG_SMTP_PASSWORD)
                .cloned()
                .map(SecretString::from),
            from: matches
                .get_one::<String>(ARG_SMTP_FROM)
                .cloned()
                .unwrap_or_else(|| "no-reply@gatehouse.dev".to_string()),
        })
    }
}
