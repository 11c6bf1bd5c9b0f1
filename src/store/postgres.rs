//! `PostgreSQL` store built on a `sqlx` pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use std::time::Duration;
use tracing::{Instrument, Span, info_span};
use uuid::Uuid;

use super::{
    Booking, BookingStatus, BookingStore, BookingView, Credential, Identity, InsertOutcome,
    NewBooking, NewService, NewUser, Role, Service, ServiceStore, ServiceSummary, ServiceView,
    Store, UserStore, UserSummary,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const BOOKING_VIEW_SELECT: &str = r"
    SELECT b.id, b.status, b.created_at, b.updated_at,
           u.id AS owner_id, u.name AS owner_name, u.email AS owner_email,
           s.id AS service_id, s.title AS service_title,
           s.description AS service_description, s.price AS service_price
    FROM bookings b
    LEFT JOIN users u ON u.id = b.user_id
    LEFT JOIN services s ON s.id = b.service_id
";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the same pool settings the server uses in production.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Apply `sql/schema.sql`. Statements are idempotent.
    ///
    /// # Errors
    /// Returns an error naming the statement that failed.
    pub async fn apply_schema(&self) -> Result<()> {
        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&self.pool)
                .instrument(query_span("DDL", statement))
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }
        Ok(())
    }
}

fn query_span(operation: &str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn identity_from_row(row: &PgRow) -> Result<Identity> {
    let role: String = row.try_get("role")?;
    Ok(Identity {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: role.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

fn service_from_row(row: &PgRow) -> Result<Service> {
    Ok(Service {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn booking_view_from_row(row: &PgRow) -> Result<BookingView> {
    let status: String = row.try_get("status")?;

    let owner_id: Option<Uuid> = row.try_get("owner_id")?;
    let user = match owner_id {
        Some(id) => Some(UserSummary {
            id,
            name: row.try_get("owner_name")?,
            email: row.try_get("owner_email")?,
        }),
        None => None,
    };

    let service_id: Option<Uuid> = row.try_get("service_id")?;
    let service = match service_id {
        Some(id) => Some(ServiceSummary {
            id,
            title: row.try_get("service_title")?,
            description: row.try_get("service_description")?,
            price: row.try_get("service_price")?,
        }),
        None => None,
    };

    Ok(BookingView {
        id: row.try_get("id")?,
        user,
        service,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<InsertOutcome<Identity>> {
        let query = r"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, role, created_at
        ";
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match row {
            Ok(row) => Ok(InsertOutcome::Created(identity_from_row(&row)?)),
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn find_credential_by_email(&self, email: &str) -> Result<Option<Credential>> {
        let query =
            "SELECT id, name, email, role, created_at, password_hash FROM users WHERE email = $1";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup credential")?;

        row.map(|row| -> Result<Credential> {
            Ok(Credential {
                identity: identity_from_row(&row)?,
                password_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>> {
        // password_hash is deliberately not selected
        let query = "SELECT id, name, email, role, created_at FROM users WHERE id = $1";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup identity")?;

        row.as_ref().map(identity_from_row).transpose()
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<bool> {
        let query = "UPDATE users SET role = $2 WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update user role")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ServiceStore for PgStore {
    async fn insert_service(&self, service: NewService) -> Result<Service> {
        let query = r"
            INSERT INTO services (id, title, description, price, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, price, created_by, created_at
        ";
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&service.title)
            .bind(&service.description)
            .bind(service.price)
            .bind(service.created_by)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert service")?;

        service_from_row(&row)
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>> {
        let query = r"
            SELECT id, title, description, price, created_by, created_at
            FROM services WHERE id = $1
        ";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup service")?;

        row.as_ref().map(service_from_row).transpose()
    }

    async fn list_services(&self) -> Result<Vec<ServiceView>> {
        let query = r"
            SELECT s.id, s.title, s.description, s.price, s.created_at,
                   u.id AS creator_id, u.name AS creator_name, u.email AS creator_email
            FROM services s
            LEFT JOIN users u ON u.id = s.created_by
            ORDER BY s.created_at ASC
        ";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to list services")?;

        rows.iter()
            .map(|row| -> Result<ServiceView> {
                let creator_id: Option<Uuid> = row.try_get("creator_id")?;
                let created_by = match creator_id {
                    Some(id) => Some(UserSummary {
                        id,
                        name: row.try_get("creator_name")?,
                        email: row.try_get("creator_email")?,
                    }),
                    None => None,
                };
                Ok(ServiceView {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    description: row.try_get("description")?,
                    price: row.try_get("price")?,
                    created_by,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking> {
        let query = r"
            INSERT INTO bookings (id, user_id, service_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, service_id, status, created_at, updated_at
        ";
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(booking.user_id)
            .bind(booking.service_id)
            .bind(BookingStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert booking")?;

        let status: String = row.try_get("status")?;
        Ok(Booking {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            service_id: row.try_get("service_id")?,
            status: status.parse()?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<BookingView>> {
        let query = format!("{BOOKING_VIEW_SELECT} WHERE b.id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup booking")?;

        row.as_ref().map(booking_view_from_row).transpose()
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<BookingView>> {
        let query = format!("{BOOKING_VIEW_SELECT} WHERE b.user_id = $1 ORDER BY b.created_at DESC");
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to list bookings")?;

        rows.iter().map(booking_view_from_row).collect()
    }

    async fn set_booking_status(&self, id: Uuid, status: BookingStatus) -> Result<bool> {
        let query = "UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update booking status")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        let query = "SELECT 1";
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("database ping failed")?;
        Ok(())
    }
}
