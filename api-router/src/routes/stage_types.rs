use axum::{extract::State, Json};
use common::utils::envelope::Envelope;
use transform_pipeline::detail::{support_types, SupportedCategory};

use crate::api_state::ApiState;

pub async fn text_process_type(State(state): State<ApiState>) -> Json<Envelope<Vec<SupportedCategory>>> {
    Json(Envelope::ok(support_types(&state.pipeline.config().layout)))
}
