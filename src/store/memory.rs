//! In-process store backed by a `tokio` `RwLock`.
//!
//! Used by the test suite and when the server starts without `--dsn`.
//! Everything is lost on restart.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Booking, BookingStatus, BookingStore, BookingView, Credential, Identity, InsertOutcome,
    NewBooking, NewService, NewUser, Role, Service, ServiceStore, ServiceView, Store, UserStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, Credential>,
    emails: HashMap<String, Uuid>,
    services: Vec<Service>,
    bookings: Vec<Booking>,
}

impl Tables {
    fn expand(&self, booking: &Booking) -> BookingView {
        BookingView {
            id: booking.id,
            user: self
                .users
                .get(&booking.user_id)
                .map(|credential| credential.identity.summary()),
            service: self
                .services
                .iter()
                .find(|service| service.id == booking.service_id)
                .map(Service::summary),
            status: booking.status,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<InsertOutcome<Identity>> {
        let mut tables = self.tables.write().await;
        if tables.emails.contains_key(&user.email) {
            return Ok(InsertOutcome::Conflict);
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.emails.insert(identity.email.clone(), identity.id);
        tables.users.insert(
            identity.id,
            Credential {
                identity: identity.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(InsertOutcome::Created(identity))
    }

    async fn find_credential_by_email(&self, email: &str) -> Result<Option<Credential>> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .get(&id)
            .map(|credential| credential.identity.clone()))
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).is_some_and(|credential| {
            credential.identity.role = role;
            true
        }))
    }
}

#[async_trait]
impl ServiceStore for MemoryStore {
    async fn insert_service(&self, service: NewService) -> Result<Service> {
        let record = Service {
            id: Uuid::new_v4(),
            title: service.title,
            description: service.description,
            price: service.price,
            created_by: service.created_by,
            created_at: Utc::now(),
        };
        self.tables.write().await.services.push(record.clone());
        Ok(record)
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>> {
        let tables = self.tables.read().await;
        Ok(tables
            .services
            .iter()
            .find(|service| service.id == id)
            .cloned())
    }

    async fn list_services(&self) -> Result<Vec<ServiceView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .services
            .iter()
            .map(|service| ServiceView {
                id: service.id,
                title: service.title.clone(),
                description: service.description.clone(),
                price: service.price,
                created_by: tables
                    .users
                    .get(&service.created_by)
                    .map(|credential| credential.identity.summary()),
                created_at: service.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking> {
        let now = Utc::now();
        let record = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id,
            service_id: booking.service_id,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.bookings.push(record.clone());
        Ok(record)
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<BookingView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .find(|booking| booking.id == id)
            .map(|booking| tables.expand(booking)))
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<BookingView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .rev()
            .filter(|booking| booking.user_id == user_id)
            .map(|booking| tables.expand(booking))
            .collect())
    }

    async fn set_booking_status(&self, id: Uuid, status: BookingStatus) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .bookings
            .iter_mut()
            .find(|booking| booking.id == id)
            .is_some_and(|booking| {
                booking.status = status;
                booking.updated_at = Utc::now();
                true
            }))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
