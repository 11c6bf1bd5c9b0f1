//! # Kuteeram (identity, sessions and bookings)
//!
//! `kuteeram` is a small HTTP API for booking services. Visitors register and
//! log in, browse the service catalogue and book services; a single
//! administrator identity curates the catalogue.
//!
//! ## Sessions
//!
//! Login and registration issue an HS256 JWT whose only claim of interest is
//! the user id. It travels in an `HttpOnly` cookie named `token`, with an
//! `Authorization: Bearer` header accepted as a fallback. The role is never
//! read from the token; every gated request reloads the identity from the
//! record store.
//!
//! ## Administration
//!
//! Admin-only routes require both the `admin` role and an exact match on the
//! configured administrator email, so a stray `admin` row is not enough.
//!
//! ## Bookings
//!
//! New bookings start as `pending` and are moved to `completed` by an
//! in-process timer. Timers do not survive a restart.

pub mod api;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
