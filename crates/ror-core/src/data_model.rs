//! Data Model: VerificationResult, ReportRequest, ReportPayload
use serde::{Deserialize, Serialize};

use crate::error::{Result, RorError};
use crate::lenient;

/// Message returned when a report request carries no `result`.
pub const MISSING_RESULT: &str = "Missing 'result' data in request body.";

/// Verification outcome as the client sends it.
///
/// `confidence` is already the display percentage for the shown label; see
/// [`crate::detection`] for how it is derived from the raw model score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub confidence: f64,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub face_confidence: Option<f64>,
    /// `[x, y, w, h]` of the highest-confidence face.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub face_box: Option<[f64; 4]>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub average_face_confidence: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub processed_frame_count: Option<u64>,
}

/// Body of `POST /generate-pdf`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<VerificationResult>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_video: Option<bool>,
    /// ISO-8601 timestamp shown on the report and embedded in the filename.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub corrected_original_base64: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub boxed_image_base64: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_raw_frame_base64: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_boxed_frame_base64: Option<String>,
}

impl ReportRequest {
    /// Parse a request body. Only `result.isAI` and `result.confidence` are
    /// strictly typed; see [`crate::lenient`] for the optional fields.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| RorError::Validation(format!("Invalid request body: {}", e)))
    }

    pub fn is_video(&self) -> bool {
        self.is_video.unwrap_or(false)
    }

    /// Convert the wire request into its tagged payload.
    ///
    /// Fields that belong to the other media kind are dropped here, so the
    /// layout never sees them.
    pub fn into_payload(self) -> Result<ReportPayload> {
        let is_video = self.is_video();
        let result = self
            .result
            .ok_or_else(|| RorError::Validation(MISSING_RESULT.to_string()))?;
        let verdict = Verdict {
            is_ai: result.is_ai,
            confidence: result.confidence,
        };

        let payload = if is_video {
            ReportPayload::Video(VideoReport {
                verdict,
                average_face_confidence: result.average_face_confidence,
                processed_frame_count: result.processed_frame_count,
                raw_frame: self.first_raw_frame_base64,
                boxed_frame: self.first_boxed_frame_base64,
            })
        } else {
            ReportPayload::Image(ImageReport {
                verdict,
                face_confidence: result.face_confidence,
                face_box: result.face_box,
                original: self.corrected_original_base64,
                boxed: self.boxed_image_base64,
            })
        };
        Ok(payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub is_ai: bool,
    /// Display percentage in `[0, 100]`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
    pub verdict: Verdict,
    pub face_confidence: Option<f64>,
    pub face_box: Option<[f64; 4]>,
    /// Orientation-corrected original, as a data URI.
    pub original: Option<String>,
    /// Original annotated with the detected face box, as a data URI.
    pub boxed: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoReport {
    pub verdict: Verdict,
    pub average_face_confidence: Option<f64>,
    pub processed_frame_count: Option<u64>,
    pub raw_frame: Option<String>,
    pub boxed_frame: Option<String>,
}

/// A report is either about one image or about a video; never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportPayload {
    Image(ImageReport),
    Video(VideoReport),
}

impl ReportPayload {
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Image(report) => report.verdict,
            Self::Video(report) => report.verdict,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Image(_) => MediaKind::Image,
            Self::Video(_) => MediaKind::Video,
        }
    }

    /// The (left, right) data URIs of the side-by-side pair.
    pub fn image_sources(&self) -> (Option<&str>, Option<&str>) {
        match self {
            Self::Image(report) => (report.original.as_deref(), report.boxed.as_deref()),
            Self::Video(report) => (report.raw_frame.as_deref(), report.boxed_frame.as_deref()),
        }
    }

    /// Back to wire form, e.g. to hand a detection outcome to the client.
    pub fn into_request(self) -> ReportRequest {
        match self {
            Self::Image(report) => ReportRequest {
                result: Some(VerificationResult {
                    is_ai: report.verdict.is_ai,
                    confidence: report.verdict.confidence,
                    face_confidence: report.face_confidence,
                    face_box: report.face_box,
                    average_face_confidence: None,
                    processed_frame_count: None,
                }),
                is_video: Some(false),
                corrected_original_base64: report.original,
                boxed_image_base64: report.boxed,
                ..ReportRequest::default()
            },
            Self::Video(report) => ReportRequest {
                result: Some(VerificationResult {
                    is_ai: report.verdict.is_ai,
                    confidence: report.verdict.confidence,
                    face_confidence: None,
                    face_box: None,
                    average_face_confidence: report.average_face_confidence,
                    processed_frame_count: report.processed_frame_count,
                }),
                is_video: Some(true),
                first_raw_frame_base64: report.raw_frame,
                first_boxed_frame_base64: report.boxed_frame,
                ..ReportRequest::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}
