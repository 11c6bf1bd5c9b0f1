//! Auth handlers and supporting modules.
//!
//! This module coordinates password authentication, stateless session tokens
//! and the administrator gate.
//!
//! ## Sessions
//!
//! A session is an HS256 JWT carrying only the identity id. It travels in the
//! `token` cookie (or an `Authorization: Bearer` header) and is never stored
//! server-side, so logout clears the cookie but cannot revoke a copied token.
//!
//! ## Administrator
//!
//! Exactly one email is the administrator. Logging in with it persists the
//! `admin` role; admin-only routes check the role *and* the email.

pub(crate) mod admin;
pub(crate) mod login;
mod password;
pub(crate) mod principal;
pub(crate) mod register;
pub(crate) mod session;
mod state;
mod token;
pub(crate) mod types;
mod utils;

pub use admin::{SeedOutcome, require_admin, seed_admin};
pub use password::{hash_password, verify_password};
pub use principal::{require_session, resolve_identity};
pub use session::SESSION_COOKIE_NAME;
pub use state::{AuthConfig, AuthState, Environment};
pub use token::{MAX_SESSION_TTL_SECONDS, SessionTokens, TokenOutcome};
