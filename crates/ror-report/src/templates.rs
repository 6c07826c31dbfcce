//! Template loading for the analysis report.
//!
//! The report copy lives in `templates/report.yaml`:
//! - fixed strings (title, headings, captions, explanation, footer)
//! - Handlebars templates for the parameterised result lines

use serde::Deserialize;
use std::collections::HashMap;

use ror_core::RorError;

/// Report copy bundled with the crate.
pub const DEFAULT_TEMPLATES: &str = include_str!("../templates/report.yaml");

/// Major version of the templates file layout this crate understands.
pub const TEMPLATES_MAJOR_VERSION: u32 = 1;

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub title: String,
    pub generated_on: String,
    pub result_heading: String,
    pub labels: Labels,
    pub lines: HashMap<String, String>,
    pub captions: Captions,
    pub explanation: Explanation,
    pub footer: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Labels {
    pub ai: String,
    pub authentic: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Captions {
    pub image: CaptionPair,
    pub video: CaptionPair,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptionPair {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Explanation {
    pub heading: String,
    pub lines: Vec<String>,
}

/// Parameterised lines of the result section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTemplate {
    Confidence,
    ConfidenceVideo,
    FaceConfidence,
    FaceBox,
    AverageFaceConfidence,
    ProcessedFrameCount,
}

impl LineTemplate {
    pub const ALL: [LineTemplate; 6] = [
        LineTemplate::Confidence,
        LineTemplate::ConfidenceVideo,
        LineTemplate::FaceConfidence,
        LineTemplate::FaceBox,
        LineTemplate::AverageFaceConfidence,
        LineTemplate::ProcessedFrameCount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Confidence => "confidence",
            Self::ConfidenceVideo => "confidence_video",
            Self::FaceConfidence => "face_confidence",
            Self::FaceBox => "face_box",
            Self::AverageFaceConfidence => "average_face_confidence",
            Self::ProcessedFrameCount => "processed_frame_count",
        }
    }
}

impl TemplatesFile {
    /// Load templates from a YAML file
    pub fn load(path: &str) -> Result<Self, RorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RorError::Render(format!("failed to read templates file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse templates from YAML content. The file's major version must match
    /// [`TEMPLATES_MAJOR_VERSION`] and every line template must be present.
    pub fn from_yaml(yaml: &str) -> Result<Self, RorError> {
        let file: TemplatesFile = serde_yaml::from_str(yaml)
            .map_err(|e| RorError::Render(format!("failed to parse templates YAML: {}", e)))?;

        let major = file
            .version
            .split('.')
            .next()
            .and_then(|major| major.trim().parse::<u32>().ok());
        if major != Some(TEMPLATES_MAJOR_VERSION) {
            return Err(RorError::Render(format!(
                "unsupported templates version '{}' (expected {}.x)",
                file.version, TEMPLATES_MAJOR_VERSION
            )));
        }

        if let Some(missing) = LineTemplate::ALL
            .iter()
            .find(|line| !file.lines.contains_key(line.name()))
        {
            return Err(RorError::Render(format!(
                "templates file has no '{}' line",
                missing.name()
            )));
        }
        Ok(file)
    }

    pub fn line(&self, line: LineTemplate) -> Option<&str> {
        self.lines.get(line.name()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_templates_parse() {
        let file = TemplatesFile::from_yaml(DEFAULT_TEMPLATES).unwrap();
        assert_eq!(file.title, "RealOrRender Analysis Report");
        assert_eq!(file.explanation.lines.len(), 3);
        assert_eq!(file.footer.len(), 2);
        assert_eq!(file.captions.video.left, "Representative Frame (Original)");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ror-report-{}.yaml", std::process::id()));
        std::fs::write(&path, DEFAULT_TEMPLATES.replace("Analysis Report", "Audit Report")).unwrap();
        let file = TemplatesFile::load(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(file.title, "RealOrRender Audit Report");

        assert!(TemplatesFile::load("/nonexistent/report.yaml").is_err());
    }

    #[test]
    fn test_version_checked() {
        let minor = DEFAULT_TEMPLATES.replace("version: \"1.0\"", "version: \"1.3\"");
        assert!(TemplatesFile::from_yaml(&minor).is_ok());

        for version in ["2.0", "one", ""] {
            let yaml =
                DEFAULT_TEMPLATES.replace("version: \"1.0\"", &format!("version: \"{}\"", version));
            let err = TemplatesFile::from_yaml(&yaml).unwrap_err();
            assert!(err.to_string().contains("unsupported templates version"));
        }
    }

    #[test]
    fn test_missing_line_rejected() {
        let yaml = DEFAULT_TEMPLATES.replace("  face_box:", "  face_boxes:");
        let err = TemplatesFile::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("face_box"));
    }
}
