use std::sync::Arc;

use common::{storage::db::SurrealDbClient, utils::config::AppConfig};
use transform_pipeline::{BackgroundDispatcher, PreviewLimits, TransformPipeline};

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub pipeline: Arc<TransformPipeline>,
    pub dispatcher: BackgroundDispatcher,
    pub preview_limits: PreviewLimits,
}

impl ApiState {
    pub fn new(
        config: &AppConfig,
        db: Arc<SurrealDbClient>,
        pipeline: Arc<TransformPipeline>,
        dispatcher: BackgroundDispatcher,
    ) -> Self {
        Self {
            db,
            pipeline,
            dispatcher,
            preview_limits: PreviewLimits::from(config),
        }
    }
}
