use crate::api::handlers::auth::{Environment, MAX_SESSION_TTL_SECONDS};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_ADMIN_PASSWORD: &str = "admin-password";
pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_FRONTEND_ORIGIN: &str = "frontend-origin";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub admin_email: String,
    pub admin_password: Option<SecretString>,
    pub environment: Environment,
    pub frontend_origin: Option<String>,
    pub session_ttl_seconds: i64,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or malformed.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Env vars set to "" come through as empty strings; treat them as unset.
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(jwt_secret) = get_non_empty(ARG_JWT_SECRET) else {
            anyhow::bail!("missing required argument: --{ARG_JWT_SECRET}");
        };
        let Some(admin_email) = get_non_empty(ARG_ADMIN_EMAIL) else {
            anyhow::bail!("missing required argument: --{ARG_ADMIN_EMAIL}");
        };

        let environment = match get_non_empty(ARG_ENVIRONMENT) {
            Some(value) => value.parse::<Environment>()?,
            None => Environment::default(),
        };

        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(86_400);

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            admin_email,
            admin_password: get_non_empty(ARG_ADMIN_PASSWORD).map(SecretString::from),
            environment,
            frontend_origin: get_non_empty(ARG_FRONTEND_ORIGIN),
            session_ttl_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign session tokens")
                .env("KUTEERAM_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Email of the single administrator identity")
                .long_help(
                    "Email of the single administrator identity. Logging in with it grants the admin role; admin-only routes also require an exact match on this email.",
                )
                .env("KUTEERAM_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Seed the administrator with this password if it does not exist")
                .env("KUTEERAM_ADMIN_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment: development or production")
                .env("KUTEERAM_ENVIRONMENT")
                .default_value("development"),
        )
        .arg(
            Arg::new(ARG_FRONTEND_ORIGIN)
                .long(ARG_FRONTEND_ORIGIN)
                .help("Frontend origin allowed by CORS (defaults per environment)")
                .env("KUTEERAM_FRONTEND_ORIGIN"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token and cookie TTL in seconds")
                .env("KUTEERAM_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
}
