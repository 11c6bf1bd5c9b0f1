//! Auth configuration and shared state.

use anyhow::{Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, str::FromStr};

use super::token::SessionTokens;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Deployment mode; selects the cookie attribute profile and error verbosity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(anyhow!("unknown environment: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    admin_email: String,
    environment: Environment,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString, admin_email: String) -> Self {
        Self {
            jwt_secret,
            admin_email,
            environment: Environment::default(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(super) fn jwt_secret(&self) -> &str {
        self.jwt_secret.expose_secret()
    }
}

/// Shared by every auth handler and both gates via `Extension<Arc<AuthState>>`.
pub struct AuthState {
    config: AuthConfig,
    tokens: SessionTokens,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the signing secret is empty or the TTL is not positive.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let tokens = SessionTokens::new(config.jwt_secret(), config.session_ttl_seconds())?;
        Ok(Self { config, tokens })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("signing-secret".to_string()),
            "admin@kuteeram.dev".to_string(),
        )
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = config();
        assert_eq!(config.admin_email(), "admin@kuteeram.dev");
        assert_eq!(config.environment(), Environment::Development);
        assert_eq!(config.session_ttl_seconds(), DEFAULT_SESSION_TTL_SECONDS);
        assert_eq!(config.jwt_secret(), "signing-secret");

        let config = config
            .with_environment(Environment::Production)
            .with_session_ttl_seconds(60);
        assert!(config.environment().is_production());
        assert_eq!(config.session_ttl_seconds(), 60);
    }

    #[test]
    fn environment_parses_aliases() -> Result<()> {
        assert_eq!("production".parse::<Environment>()?, Environment::Production);
        assert_eq!(" Prod ".parse::<Environment>()?, Environment::Production);
        assert_eq!("dev".parse::<Environment>()?, Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
        Ok(())
    }

    #[test]
    fn auth_state_rejects_empty_secret() {
        let config = AuthConfig::new(SecretString::from(String::new()), "a@x.com".to_string());
        assert!(AuthState::new(config).is_err());
    }

    #[test]
    fn auth_state_debug_hides_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("signing-secret"));
    }
}
