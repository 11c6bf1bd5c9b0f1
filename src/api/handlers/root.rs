use axum::response::IntoResponse;

/// Plain-text banner so a bare `GET /` confirms which build is answering.
pub async fn root() -> impl IntoResponse {
    format!(
        "{} {} is running",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}
