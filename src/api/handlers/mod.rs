//! API handlers for Kuteeram.
//!
//! `auth` owns registration, login and the two gates; `services` and
//! `bookings` are the resources those gates protect.

pub mod auth;
pub mod bookings;
pub mod health;
pub mod root;
pub mod services;
