//! RealOrRender Core: data model, errors, detection mapping and the
//! verification session state machine.
//!
//! Shared by the report renderer and the HTTP service.

pub mod data_model;
pub mod detection;
pub mod error;
pub mod lenient;
pub mod session;

pub use data_model::{
    ImageReport, MediaKind, ReportPayload, ReportRequest, Verdict, VerificationResult,
    VideoReport,
};
pub use detection::{ImagePrediction, VideoPrediction};
pub use error::{Result, RorError};
pub use session::{SessionState, UploadInfo, UploadLimits, VerificationSession};

/// Product name shown in reports and download filenames.
pub const PRODUCT_NAME: &str = "RealOrRender";

/// Service version
pub const ROR_VERSION: &str = env!("CARGO_PKG_VERSION");
