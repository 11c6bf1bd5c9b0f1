//! Map parsed command-line arguments to the action that runs the server.

use crate::{
    api,
    cli::{
        actions::{Action, server::Args},
        commands::{ARG_DSN, ARG_PORT, auth, bookings},
    },
};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .filter(|dsn| !dsn.trim().is_empty());

    let auth_opts = auth::Options::parse(matches)?;
    let bookings_opts = bookings::Options::parse(matches);

    let frontend_url = auth_opts
        .frontend_origin
        .unwrap_or_else(|| api::default_frontend_url(auth_opts.environment).to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        admin_email: auth_opts.admin_email,
        admin_password: auth_opts.admin_password,
        environment: auth_opts.environment,
        frontend_url,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        booking_completion_delay: bookings_opts.completion_delay,
    }))
}
