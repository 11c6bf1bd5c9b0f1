//! Record store for identities, services and bookings.
//!
//! Handlers and gates only see the traits below behind [`SharedStore`]. Two
//! implementations exist: [`PgStore`] for `PostgreSQL` and [`MemoryStore`]
//! for tests and local runs without a database. Email uniqueness is enforced
//! here, at the store boundary, and surfaces as [`InsertOutcome::Conflict`].

mod memory;
pub mod models;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{
    Booking, BookingStatus, BookingView, Credential, Identity, NewBooking, NewService, NewUser,
    Role, Service, ServiceSummary, ServiceView, UserSummary,
};
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn Store>;

#[derive(Debug)]
pub enum InsertOutcome<T> {
    Created(T),
    Conflict,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<InsertOutcome<Identity>>;

    async fn find_credential_by_email(&self, email: &str) -> Result<Option<Credential>>;

    /// Lookup by id; the result never includes the password hash.
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>>;

    /// Returns `false` when no identity has that id.
    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<bool>;
}

#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn insert_service(&self, service: NewService) -> Result<Service>;

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>>;

    /// All services, oldest first, with the creator expanded.
    async fn list_services(&self) -> Result<Vec<ServiceView>>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking>;

    async fn find_booking(&self, id: Uuid) -> Result<Option<BookingView>>;

    /// Bookings owned by `user_id`, newest first.
    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<BookingView>>;

    /// Unconditional status write. Returns `false` when the booking is gone.
    async fn set_booking_status(&self, id: Uuid, status: BookingStatus) -> Result<bool>;
}

#[async_trait]
pub trait Store: UserStore + ServiceStore + BookingStore {
    /// Cheap liveness probe used by `/health`.
    async fn ping(&self) -> Result<()>;
}
