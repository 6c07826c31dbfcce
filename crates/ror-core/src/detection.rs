//! Detection service responses and their mapping to display results.
//!
//! The detection service returns a raw score where higher means "more
//! likely real". The product shows confidence in the *displayed* label
//! instead, so an AI verdict shows `1 - score` and an authentic verdict
//! shows `score`, both as rounded percentages. This mapping is kept exactly
//! as the client has always applied it.

use serde::{Deserialize, Serialize};

use crate::data_model::{ImageReport, ReportPayload, Verdict, VideoReport};

/// Label the detection service uses for AI-generated media.
pub const FAKE_LABEL: &str = "fake";

/// `POST /predict_image` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePrediction {
    pub label: String,
    pub prediction: f64,
    #[serde(default)]
    pub face_confidence: Option<f64>,
    #[serde(default)]
    pub face_box: Option<[f64; 4]>,
    #[serde(default)]
    pub boxed_image_base64: Option<String>,
    #[serde(default)]
    pub corrected_original_base64: Option<String>,
}

/// `POST /predict_video` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPrediction {
    pub label: String,
    pub average_prediction: f64,
    #[serde(default)]
    pub average_face_confidence: Option<f64>,
    #[serde(default)]
    pub processed_frame_count: Option<u64>,
    #[serde(default)]
    pub first_raw_frame_base64: Option<String>,
    #[serde(default)]
    pub first_boxed_frame_base64: Option<String>,
}

impl From<ImagePrediction> for ReportPayload {
    fn from(p: ImagePrediction) -> Self {
        ReportPayload::Image(ImageReport {
            verdict: verdict(&p.label, p.prediction),
            face_confidence: p.face_confidence.and_then(percent_if_set),
            face_box: p.face_box,
            original: non_empty(p.corrected_original_base64),
            boxed: non_empty(p.boxed_image_base64),
        })
    }
}

impl From<VideoPrediction> for ReportPayload {
    fn from(p: VideoPrediction) -> Self {
        ReportPayload::Video(VideoReport {
            verdict: verdict(&p.label, p.average_prediction),
            average_face_confidence: p.average_face_confidence.and_then(percent_if_set),
            processed_frame_count: p.processed_frame_count,
            raw_frame: non_empty(p.first_raw_frame_base64),
            boxed_frame: non_empty(p.first_boxed_frame_base64),
        })
    }
}

fn verdict(label: &str, raw_score: f64) -> Verdict {
    let is_ai = label == FAKE_LABEL;
    Verdict {
        is_ai,
        confidence: display_confidence(is_ai, raw_score),
    }
}

/// Percentage of certainty in the displayed label.
pub fn display_confidence(is_ai: bool, raw_score: f64) -> f64 {
    if is_ai {
        round_half_up((1.0 - raw_score) * 100.0)
    } else {
        round_half_up(raw_score * 100.0)
    }
}

/// Zero means "no face found" and is reported as absent.
fn percent_if_set(fraction: f64) -> Option<f64> {
    if fraction == 0.0 || fraction.is_nan() {
        None
    } else {
        Some(round_half_up(fraction * 100.0))
    }
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
