use axum::{http::StatusCode, response::IntoResponse, Json};
use common::utils::envelope::Envelope;

/// Liveness probe: 200 while the process serves requests.
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, Json(Envelope::ok("alive")))
}
