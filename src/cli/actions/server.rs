use crate::{
    api::{
        self, AppState,
        handlers::auth::{self, AuthConfig, AuthState, Environment, SeedOutcome},
        lifecycle::BookingLifecycle,
    },
    store::{MemoryStore, PgStore, SharedStore},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{info, warn};

pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub jwt_secret: SecretString,
    pub admin_email: String,
    pub admin_password: Option<SecretString>,
    pub environment: Environment,
    pub frontend_url: String,
    pub session_ttl_seconds: i64,
    pub booking_completion_delay: Duration,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &self.dsn.as_ref().map(|_| "[REDACTED]"))
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "[REDACTED]"))
            .field("environment", &self.environment)
            .field("frontend_url", &self.frontend_url)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("booking_completion_delay", &self.booking_completion_delay)
            .finish_non_exhaustive()
    }
}

async fn open_store(dsn: Option<&str>) -> Result<SharedStore> {
    match dsn {
        Some(dsn) => {
            let store = PgStore::connect(dsn)
                .await
                .context("Failed to connect to database")?;
            store
                .apply_schema()
                .await
                .context("Failed to apply database schema")?;
            info!("Using PostgreSQL record store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("No DSN configured; records are kept in memory and lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be opened, the administrator cannot be
/// seeded, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let store = open_store(args.dsn.as_deref()).await?;

    let config = AuthConfig::new(args.jwt_secret, args.admin_email.clone())
        .with_environment(args.environment)
        .with_session_ttl_seconds(args.session_ttl_seconds);
    let auth_state = Arc::new(AuthState::new(config).context("Invalid auth configuration")?);

    if let Some(password) = &args.admin_password {
        let outcome = auth::seed_admin(store.as_ref(), &args.admin_email, password)
            .await
            .context("Failed to seed administrator")?;
        match outcome {
            SeedOutcome::Created => info!(admin_email = %args.admin_email, "administrator created"),
            SeedOutcome::Elevated => {
                info!(admin_email = %args.admin_email, "existing identity elevated to administrator");
            }
            SeedOutcome::AlreadyPresent => {
                info!(admin_email = %args.admin_email, "administrator already present");
            }
        }
    }

    let lifecycle = Arc::new(BookingLifecycle::new(
        store.clone(),
        args.booking_completion_delay,
    ));

    info!(
        environment = %args.environment,
        frontend = %args.frontend_url,
        "starting kuteeram"
    );

    let state = AppState {
        store,
        auth: auth_state,
        lifecycle,
    };

    api::new(args.port, state, &args.frontend_url).await
}
