use api_state::ApiState;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use routes::{
    liveness::live,
    stage_types::text_process_type,
    tasks::{add, delete_by_id, info_by_id, list_by_count, list_by_page},
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for the data-processing task endpoints.
pub fn data_process_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/live", get(live))
        .route("/list-by-page", post(list_by_page))
        .route("/list-by-count", post(list_by_count))
        .route("/add", post(add))
        .route("/delete-by-id", post(delete_by_id))
        .route("/info-by-id", post(info_by_id))
        .route("/text-process-type", post(text_process_type))
}
