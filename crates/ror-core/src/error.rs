//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RorError {
    /// Required request data is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A single embedded image could not be decoded. Never leaves the layout engine.
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    #[error("report rendering failed: {0}")]
    Render(String),

    #[error("PDF serialization failed: {0}")]
    Serialization(String),

    /// The uploaded file was rejected before reaching the detection service.
    #[error("{0}")]
    Upload(String),

    /// The detection service failed or answered with an error.
    #[error("{0}")]
    Detection(String),

    /// Invalid verification session transition.
    #[error("invalid session transition: {0}")]
    Session(String),
}

impl RorError {
    /// Short machine-readable tag, used for metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ImageDecode(_) => "image_decode",
            Self::Render(_) => "render",
            Self::Serialization(_) => "serialization",
            Self::Upload(_) => "upload",
            Self::Detection(_) => "detection",
            Self::Session(_) => "session",
        }
    }
}

pub type Result<T> = std::result::Result<T, RorError>;
