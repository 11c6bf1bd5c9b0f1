//! Records exchanged with the store and returned by the API.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(anyhow!("unknown role: {other}")),
        }
    }
}

/// A registered principal without its password hash.
#[derive(ToSchema, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Exact, case-sensitive match against the configured administrator email.
    #[must_use]
    pub fn has_admin_email(&self, admin_email: &str) -> bool {
        !admin_email.is_empty() && self.email == admin_email
    }

    /// Both the stored role and the canonical admin email must agree.
    #[must_use]
    pub fn is_administrator(&self, admin_email: &str) -> bool {
        self.role == Role::Admin && self.has_admin_email(admin_email)
    }

    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Identity plus the stored Argon2 PHC string. Only login and seeding see this.
#[derive(Clone, Debug)]
pub struct Credential {
    pub identity: Identity,
    pub password_hash: String,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Public projection of an identity: never carries the hash or the role.
#[derive(ToSchema, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(ToSchema, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Service {
    #[must_use]
    pub fn summary(&self) -> ServiceSummary {
        ServiceSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewService {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub created_by: Uuid,
}

/// Service listing entry with the creator expanded.
#[derive(ToSchema, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(ToSchema, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
}

/// `confirmed` is representable but nothing moves a booking into it.
#[derive(ToSchema, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
}

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            other => Err(anyhow!("unknown booking status: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub service_id: Uuid,
}

/// Booking with owner and service expanded, as returned to clients.
#[derive(ToSchema, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: Uuid,
    pub user: Option<UserSummary>,
    pub service: Option<ServiceSummary>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str, role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn role_parses_and_displays() -> Result<()> {
        assert_eq!("admin".parse::<Role>()?, Role::Admin);
        assert_eq!("user".parse::<Role>()?, Role::User);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
        Ok(())
    }

    #[test]
    fn booking_status_defaults_to_pending() -> Result<()> {
        assert_eq!(BookingStatus::default(), BookingStatus::Pending);
        assert_eq!(
            "confirmed".parse::<BookingStatus>()?,
            BookingStatus::Confirmed
        );
        assert_eq!(
            serde_json::to_value(BookingStatus::Completed)?,
            serde_json::json!("completed")
        );
        Ok(())
    }

    #[test]
    fn administrator_needs_role_and_email() {
        let admin_email = "root@kuteeram.dev";
        assert!(identity(admin_email, Role::Admin).is_administrator(admin_email));
        assert!(!identity(admin_email, Role::User).is_administrator(admin_email));
        assert!(!identity("other@kuteeram.dev", Role::Admin).is_administrator(admin_email));
    }

    #[test]
    fn admin_email_match_is_case_sensitive() {
        let user = identity("Root@kuteeram.dev", Role::Admin);
        assert!(!user.has_admin_email("root@kuteeram.dev"));
        assert!(!user.has_admin_email(""));
    }

    #[test]
    fn views_serialize_in_camel_case() -> Result<()> {
        let creator = identity("a@x.com", Role::Admin);
        let view = ServiceView {
            id: Uuid::new_v4(),
            title: "Cleaning".to_string(),
            description: "Two hours".to_string(),
            price: 10.0,
            created_by: Some(creator.summary()),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&view)?;
        assert!(value.get("createdBy").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_by").is_none());

        let booking = BookingView {
            id: Uuid::new_v4(),
            user: Some(creator.summary()),
            service: None,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&booking)?;
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("updated_at").is_none());
        Ok(())
    }

    #[test]
    fn summary_omits_role() -> Result<()> {
        let value = serde_json::to_value(identity("a@x.com", Role::User).summary())?;
        assert!(value.get("role").is_none());
        assert_eq!(
            value.get("email").and_then(serde_json::Value::as_str),
            Some("a@x.com")
        );
        Ok(())
    }
}
