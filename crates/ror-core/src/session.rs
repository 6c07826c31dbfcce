//! Verification session: Idle → FileSelected → Verifying → Succeeded | Failed
//!
//! One session tracks one upload through verification. Transitions that do
//! not apply to the current state are rejected and leave the state as it was.

use serde::Serialize;

use crate::data_model::{MediaKind, ReportPayload};
use crate::error::{Result, RorError};

const MIB: u64 = 1024 * 1024;

/// Metadata of one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadInfo {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Upload size limits per media kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadLimits {
    pub image_max_bytes: u64,
    pub video_max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            image_max_bytes: 10 * MIB,
            video_max_bytes: 50 * MIB,
        }
    }
}

impl UploadLimits {
    pub fn max_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Image => self.image_max_bytes,
            MediaKind::Video => self.video_max_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    FileSelected(UploadInfo),
    Verifying { upload: UploadInfo, progress: u8 },
    Succeeded { upload: UploadInfo, result: ReportPayload },
    Failed { error: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FileSelected(_) => "file_selected",
            Self::Verifying { .. } => "verifying",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationSession {
    kind: MediaKind,
    limits: UploadLimits,
    state: SessionState,
}

impl VerificationSession {
    pub fn new(kind: MediaKind) -> Self {
        Self::with_limits(kind, UploadLimits::default())
    }

    pub fn with_limits(kind: MediaKind, limits: UploadLimits) -> Self {
        Self {
            kind,
            limits,
            state: SessionState::Idle,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn progress(&self) -> u8 {
        match &self.state {
            SessionState::Verifying { progress, .. } => *progress,
            SessionState::Succeeded { .. } => 100,
            _ => 0,
        }
    }

    /// Select a file. A rejected file moves the session to `Failed`.
    pub fn select_file(&mut self, upload: UploadInfo) -> Result<()> {
        self.ensure_not_verifying("select_file")?;

        if let Err(message) = self.check_upload(&upload) {
            self.state = SessionState::Failed {
                error: message.clone(),
            };
            return Err(RorError::Upload(message));
        }

        tracing::debug!(
            kind = self.kind.as_str(),
            file = %upload.file_name,
            size = upload.size,
            "file selected"
        );
        self.state = SessionState::FileSelected(upload);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_not_verifying("clear")?;
        self.state = SessionState::Idle;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::FileSelected(upload) => {
                self.state = SessionState::Verifying {
                    upload,
                    progress: 0,
                };
                Ok(())
            }
            other => {
                let err = invalid("start", &other);
                self.state = other;
                Err(err)
            }
        }
    }

    /// Advance simulated progress; it never reaches 100 before `finish`.
    pub fn tick(&mut self) -> Result<u8> {
        let step = match self.kind {
            MediaKind::Image => 10,
            MediaKind::Video => 5,
        };
        match &mut self.state {
            SessionState::Verifying { progress, .. } => {
                *progress = progress.saturating_add(step).min(90);
                Ok(*progress)
            }
            other => Err(invalid("tick", other)),
        }
    }

    pub fn finish(&mut self, outcome: std::result::Result<ReportPayload, String>) -> Result<()> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Verifying { upload, .. } => {
                self.state = match outcome {
                    Ok(result) => SessionState::Succeeded { upload, result },
                    Err(error) => SessionState::Failed { error },
                };
                Ok(())
            }
            other => {
                let err = invalid("finish", &other);
                self.state = other;
                Err(err)
            }
        }
    }

    fn check_upload(&self, upload: &UploadInfo) -> std::result::Result<(), String> {
        let prefix = format!("{}/", self.kind.as_str());
        if !upload.content_type.starts_with(&prefix) {
            return Err(format!(
                "Invalid file type. Please upload {} files.",
                self.kind.as_str()
            ));
        }

        let max = self.limits.max_bytes(self.kind);
        if upload.size > max {
            return Err(format!(
                "File is too large. Maximum size is {:.2} MB.",
                max as f64 / MIB as f64
            ));
        }
        Ok(())
    }

    fn ensure_not_verifying(&self, transition: &str) -> Result<()> {
        match &self.state {
            SessionState::Verifying { .. } => Err(invalid(transition, &self.state)),
            _ => Ok(()),
        }
    }
}

fn invalid(transition: &str, state: &SessionState) -> RorError {
    RorError::Session(format!("cannot {} while {}", transition, state.name()))
}
