//! RealOrRender API: report generation and verification endpoints
//!
//! | Route                    | Purpose                                   |
//! |--------------------------|-------------------------------------------|
//! | `POST /generate-pdf`     | Verification result to a PDF download      |
//! | `POST /api/generate-pdf` | Same, under the browser client's prefix    |
//! | `POST /api/verify/image` | Upload an image to the detection service   |
//! | `POST /api/verify/video` | Upload a video to the detection service    |
//! | `GET /health`            | Liveness                                   |
//! | `GET /metrics`           | Prometheus exposition                      |
pub mod config;
pub mod detect;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use ror_report::templates::{TemplatesFile, DEFAULT_TEMPLATES};
use ror_report::TemplateRenderer;

pub use config::{Args, ServerConfig};
pub use detect::DetectionClient;
pub use error::{ApiError, ErrorResponse};
pub use metrics::ReportMetrics;

/// Shared, read-only state of the service.
pub struct AppState {
    pub config: ServerConfig,
    pub detection: DetectionClient,
    pub metrics: ReportMetrics,
    pub renderer: Arc<TemplateRenderer>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, ApiError> {
        let detection = DetectionClient::new(&config.detection_url, config.detection_timeout)?;
        let metrics = ReportMetrics::new()?;
        let templates = match &config.templates_path {
            Some(path) => {
                tracing::info!(path = %path, "loading report templates");
                TemplatesFile::load(path)?
            }
            None => TemplatesFile::from_yaml(DEFAULT_TEMPLATES)?,
        };
        let renderer = Arc::new(TemplateRenderer::new(templates)?);
        Ok(AppState {
            config,
            detection,
            metrics,
            renderer,
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.body_limit_bytes;
    let cors = middleware::cors(&state.config.cors_origins);

    Router::new()
        .route("/generate-pdf", post(handlers::generate_pdf))
        .route("/api/generate-pdf", post(handlers::generate_pdf))
        .route("/api/verify/image", post(handlers::verify_image))
        .route("/api/verify/video", post(handlers::verify_video))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit))
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

pub fn create_app(config: ServerConfig) -> Result<Router, ApiError> {
    let state = AppState::new(config)?;
    Ok(build_router(Arc::new(state)))
}

pub async fn run(addr: &str, config: ServerConfig) -> Result<(), ApiError> {
    tracing::info!(
        detection_url = %config.detection_url,
        body_limit = config.body_limit_bytes,
        "starting RealOrRender API"
    );
    let app = create_app(config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to bind {}: {}", addr, e)))?;

    tracing::info!("RealOrRender API listening on {}", addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| ApiError::Internal(format!("server error: {}", e)))
}
