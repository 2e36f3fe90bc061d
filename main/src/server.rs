use std::sync::Arc;

use api_router::{api_state::ApiState, data_process_routes};
use axum::Router;
use common::{storage::db::SurrealDbClient, utils::config::get_config};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use transform_pipeline::{BackgroundDispatcher, TransformPipeline};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );
    db.ensure_initialized().await?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let pipeline = Arc::new(TransformPipeline::new(db.clone(), openai_client, &config)?);
    info!(
        model = %config.processing_model,
        data_dir = %config.data_dir,
        layout = ?pipeline.config().layout,
        finalize_task_status = config.finalize_task_status,
        "Transform pipeline initialized"
    );

    let dispatcher = BackgroundDispatcher::new();
    let api_state = ApiState::new(&config, db, pipeline, dispatcher.clone());

    let app = Router::new()
        .merge(data_process_routes())
        .with_state(api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        in_flight = dispatcher.in_flight(),
        "Server stopped; waiting for detached pipeline runs"
    );
    dispatcher.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
