//! API Handlers
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{multipart::Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use ror_core::{MediaKind, ReportRequest, UploadInfo, VerificationSession, ROR_VERSION};

use crate::error::ApiError;
use crate::AppState;

const REPORT_ID: HeaderName = HeaderName::from_static("x-report-id");

/// `POST /generate-pdf`
///
/// The body is parsed as JSON whatever its `Content-Type`.
pub async fn generate_pdf(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let result = render(&state, body).await;
    if let Err(err) = &result {
        state.metrics.report_failed(err.reason());
    }
    result
}

async fn render(state: &AppState, body: Bytes) -> Result<Response, ApiError> {
    let request = ReportRequest::from_json(&body)?;
    let report_id = Uuid::new_v4();
    let kind = if request.is_video() {
        MediaKind::Video
    } else {
        MediaKind::Image
    };
    tracing::info!(%report_id, kind = kind.as_str(), "report requested");

    let now = Utc::now();
    let renderer = state.renderer.clone();
    let report = tokio::task::spawn_blocking(move || {
        ror_report::generate_report_with(request, now, &renderer)
    })
        .await
        .map_err(|e| ApiError::Internal(format!("report task failed: {}", e)))??;
    state.metrics.report_generated(kind, report.image_section);

    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (REPORT_ID, report_id.to_string()),
        ],
        report.bytes,
    )
        .into_response())
}

/// `POST /api/verify/image`
pub async fn verify_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ReportRequest>, ApiError> {
    verify(&state, MediaKind::Image, multipart).await
}

/// `POST /api/verify/video`
pub async fn verify_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ReportRequest>, ApiError> {
    verify(&state, MediaKind::Video, multipart).await
}

fn tick_period(kind: MediaKind) -> Duration {
    match kind {
        MediaKind::Image => Duration::from_millis(200),
        MediaKind::Video => Duration::from_millis(250),
    }
}

async fn verify(
    state: &AppState,
    kind: MediaKind,
    mut multipart: Multipart,
) -> Result<Json<ReportRequest>, ApiError> {
    let (upload, bytes) = read_upload(&mut multipart).await?;

    let mut session = VerificationSession::with_limits(kind, state.config.upload_limits);
    session.select_file(upload.clone())?;
    session.start()?;

    let detection = state.detection.predict(kind, &upload, bytes);
    tokio::pin!(detection);
    let mut ticker = tokio::time::interval(tick_period(kind));
    ticker.tick().await;
    let outcome = loop {
        tokio::select! {
            outcome = &mut detection => break outcome,
            _ = ticker.tick() => {
                let progress = session.tick()?;
                tracing::debug!(kind = kind.as_str(), progress, "verification in progress");
            }
        }
    };

    match outcome {
        Ok(payload) => {
            state.metrics.detection_call(kind, "ok");
            session.finish(Ok(payload.clone()))?;
            let verdict = payload.verdict();
            tracing::info!(
                kind = kind.as_str(),
                file = %upload.file_name,
                is_ai = verdict.is_ai,
                confidence = verdict.confidence,
                "verification finished"
            );
            Ok(Json(payload.into_request()))
        }
        Err(err) => {
            state.metrics.detection_call(kind, "error");
            session.finish(Err(err.to_string()))?;
            Err(err.into())
        }
    }
}

/// Pull the `file` field out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<(UploadInfo, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let upload = UploadInfo {
            file_name,
            content_type,
            size: bytes.len() as u64,
        };
        return Ok((upload, bytes.to_vec()));
    }
    Err(ApiError::BadRequest("No file uploaded.".to_string()))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": ROR_VERSION })),
    )
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let body = state.metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
