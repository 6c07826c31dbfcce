//! Client of the external detection service.
//!
//! `POST {base}/predict_image` and `POST {base}/predict_video` take a
//! multipart body with one `file` field and answer with the raw prediction.
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;

use ror_core::{ImagePrediction, MediaKind, ReportPayload, RorError, UploadInfo, VideoPrediction};

#[derive(Debug, Clone)]
pub struct DetectionClient {
    http: reqwest::Client,
    base_url: String,
}

impl DetectionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RorError::Detection(format!("failed to build HTTP client: {}", e)))?;
        Ok(DetectionClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, kind: MediaKind) -> String {
        let path = match kind {
            MediaKind::Image => "predict_image",
            MediaKind::Video => "predict_video",
        };
        format!("{}/{}", self.base_url, path)
    }

    /// Upload one file and map the prediction to a display-ready payload.
    pub async fn predict(
        &self,
        kind: MediaKind,
        upload: &UploadInfo,
        bytes: Vec<u8>,
    ) -> Result<ReportPayload, RorError> {
        let part = Part::bytes(bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| RorError::Upload(format!("invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(kind);
        tracing::debug!(url = %url, file = %upload.file_name, "calling detection service");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RorError::Detection(format!("detection service unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RorError::Detection(error_message(status, &body)));
        }

        let payload = match kind {
            MediaKind::Image => response.json::<ImagePrediction>().await.map(ReportPayload::from),
            MediaKind::Video => response.json::<VideoPrediction>().await.map(ReportPayload::from),
        }
        .map_err(|e| RorError::Detection(format!("invalid detection response: {}", e)))?;
        Ok(payload)
    }
}

/// Message for a non-success answer: the `detail` field when it has one,
/// otherwise the whole JSON body, otherwise the status text.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()))
    };
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => fallback(),
        Ok(data) => match data.get("detail") {
            Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
            Some(detail) if is_truthy(detail) && !detail.is_string() => detail.to_string(),
            _ => data.to_string(),
        },
        Err(_) => fallback(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
