use crate::cli::CommonArgs;
use crate::store::InsightStoreError;
use crate::AppState;
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{prelude::*, Registry};
use tracing_tree::HierarchicalLayer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve generated guest insights", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "8000")]
    port: u16,
}

impl IntoResponse for InsightStoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            InsightStoreError::NotFound => StatusCode::NOT_FOUND,
            InsightStoreError::ReadError => StatusCode::INTERNAL_SERVER_ERROR,
            InsightStoreError::Internal(msg) => {
                error!("Failed to read insights: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[instrument]
async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Restaurant Insights API",
        "status": "running",
    }))
}

// Health check endpoint
#[instrument]
pub async fn health_check() -> &'static str {
    debug!("Health check requested");
    "OK"
}

/// The stored insights document, byte for byte.
#[instrument(skip(state))]
async fn get_profiles(
    State(state): State<Arc<AppState>>,
) -> Result<Response, InsightStoreError> {
    let bytes = state.insight_store.read_raw().await.map_err(|e| {
        warn!("Insights unavailable: {}", e);
        e
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/profiles", get(get_profiles))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve() -> Result<()> {
    // Initialize logging with tracing
    let subscriber = Registry::default()
        .with(
            HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    let args = Args::parse();

    let state = crate::create_app_state(crate::AppConfig {
        insights_file: args.common.insights_file,
    });

    let app = routes(state);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received CTRL-C, shutting down");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
