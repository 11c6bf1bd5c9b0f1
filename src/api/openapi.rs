use super::handlers::{auth, bookings, health, services};
use axum::middleware::from_fn;
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec. Gated routes go into the
/// `session` or `admin` group; the admin group is merged inside the session
/// group so `require_admin` always sees a resolved identity.
/// Routes added outside (like `/` or `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    let admin = OpenApiRouter::new()
        .routes(routes!(services::create_service))
        .route_layer(from_fn(auth::require_admin));

    let session = OpenApiRouter::new()
        .routes(routes!(auth::session::validate))
        .routes(routes!(bookings::create_booking, bookings::list_bookings))
        .merge(admin)
        .route_layer(from_fn(auth::require_session));

    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::session::logout))
        .routes(routes!(services::list_services))
        .merge(session);

    let mut kuteeram_tag = Tag::new("kuteeram");
    kuteeram_tag.description = Some("Identity, session and booking API".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Liveness and record store reachability".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Registration, login and session management".to_string());

    let mut services_tag = Tag::new("services");
    services_tag.description = Some("Bookable services; creation is admin-only".to_string());

    let mut bookings_tag = Tag::new("bookings");
    bookings_tag.description = Some("Bookings owned by the caller".to_string());

    router.get_openapi_mut().tags =
        Some(vec![kuteeram_tag, health_tag, auth_tag, services_tag, bookings_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(value: &str) -> Option<&str> {
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    match author.split_once('<') {
        Some((name, email)) => (non_empty(name), non_empty(email.trim_end_matches('>'))),
        None => (non_empty(author), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Kuteeram"));
            assert_eq!(contact.email.as_deref(), Some("team@kuteeram.dev"));
        }

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.identifier.as_deref(), Some("BSD-3-Clause"));
        }
    }

    #[test]
    fn openapi_documents_public_and_gated_routes() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        for name in ["kuteeram", "health", "auth", "services", "bookings"] {
            assert!(tags.iter().any(|tag| tag.name == name), "missing tag {name}");
        }
        for path in [
            "/health",
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/logout",
            "/api/auth/validate",
            "/api/services",
            "/api/bookings",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn health_documents_a_single_object() {
        let spec = openapi();
        let get = spec
            .paths
            .paths
            .get("/health")
            .and_then(|item| item.get.as_ref());
        assert!(get.is_some());
        if let Some(get) = get {
            assert_eq!(get.tags.as_deref(), Some(&["health".to_string()][..]));
            let ok = serde_json::to_value(get.responses.responses.get("200")).unwrap_or_default();
            let schema = ok.pointer("/content/application~1json/schema");
            assert!(schema.is_some());
            assert!(
                schema.and_then(|schema| schema.get("type")).is_none(),
                "expected a $ref to Health, got {schema:?}"
            );
        }
    }

    #[test]
    fn parse_author_variants() {
        assert_eq!(
            parse_author("Team Kuteeram <team@kuteeram.dev>"),
            (Some("Team Kuteeram"), Some("team@kuteeram.dev"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
        assert_eq!(parse_author("<only@mail>"), (None, Some("only@mail")));
    }
}
