//! Session token codec (HS256 JWT).
//!
//! Tokens carry only the identity id (`sub`) plus `iat`/`exp`. There is no
//! server-side record: a token stays usable until `exp` even after logout.
//! Verification distinguishes why a token failed so it can be logged, but
//! callers outside this module only ever see [`SessionTokens::subject`].

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Why a token was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOutcome {
    Valid(Uuid),
    Expired,
    BadSignature,
    Malformed,
}

impl TokenOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid(_) => "valid",
            Self::Expired => "expired",
            Self::BadSignature => "bad_signature",
            Self::Malformed => "malformed",
        }
    }
}

pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl SessionTokens {
    /// # Errors
    /// Returns an error if `secret` is empty or `ttl_seconds` is outside
    /// `1..=MAX_SESSION_TTL_SECONDS`.
    pub fn new(secret: &str, ttl_seconds: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(anyhow!("session signing secret must not be empty"));
        }
        if !(1..=MAX_SESSION_TTL_SECONDS).contains(&ttl_seconds) {
            return Err(anyhow!(
                "session TTL must be between 1 and {MAX_SESSION_TTL_SECONDS} seconds, got {ttl_seconds}"
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: valid through the `exp` second, invalid after it.
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds,
        })
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Mint a token for `subject` that expires one TTL from now.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue(&self, subject: Uuid) -> Result<String> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Mint a token as if issued at `issued_at` (unix seconds).
    ///
    /// # Errors
    /// Returns an error if the expiry overflows or signing fails.
    pub fn issue_at(&self, subject: Uuid, issued_at: i64) -> Result<String> {
        let exp = issued_at
            .checked_add(self.ttl_seconds)
            .ok_or_else(|| anyhow!("session expiry overflows for issued_at {issued_at}"))?;
        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: issued_at,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("failed to sign session token")
    }

    #[must_use]
    pub fn verify(&self, token: &str) -> TokenOutcome {
        match decode::<SessionClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Uuid::parse_str(&data.claims.sub)
                .map_or(TokenOutcome::Malformed, TokenOutcome::Valid),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => TokenOutcome::Expired,
                ErrorKind::InvalidSignature => TokenOutcome::BadSignature,
                _ => TokenOutcome::Malformed,
            },
        }
    }

    /// Collapse every rejection into `None`.
    #[must_use]
    pub fn subject(&self, token: &str) -> Option<Uuid> {
        match self.verify(token) {
            TokenOutcome::Valid(subject) => Some(subject),
            outcome => {
                debug!(outcome = outcome.as_str(), "session token rejected");
                None
            }
        }
    }
}
