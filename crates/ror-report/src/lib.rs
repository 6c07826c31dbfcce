//! RealOrRender report renderer
//!
//! Turns a verification result plus optional base64 images into a one-page
//! A4 PDF summarising the verdict.
//!
//! # Example
//!
//! ```ignore
//! use ror_core::ReportRequest;
//! use ror_report::generate_report;
//!
//! let request = ReportRequest::from_json(body)?;
//! let report = generate_report(request, chrono::Utc::now())?;
//! std::fs::write(&report.filename, &report.bytes)?;
//! ```

pub mod embed;
pub mod fonts;
pub mod layout;
pub mod pdf;
pub mod renderer;
pub mod templates;

use chrono::{DateTime, SecondsFormat, Utc};

use ror_core::{ReportPayload, ReportRequest, RorError, PRODUCT_NAME};

pub use embed::EmbeddedImage;
pub use layout::{layout_report, ImageSection, ReportLayout};
pub use pdf::write_pdf;
pub use renderer::TemplateRenderer;

/// Display format of the generation time. Digits only, so the rendered width
/// does not depend on the value.
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// A rendered report ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub image_section: ImageSection,
}

/// Build the report for `request`. `now` is used when the request carries no
/// timestamp.
pub fn generate_report(request: ReportRequest, now: DateTime<Utc>) -> Result<RenderedReport, RorError> {
    generate_report_with(request, now, TemplateRenderer::bundled())
}

pub fn generate_report_with(
    request: ReportRequest,
    now: DateTime<Utc>,
    renderer: &TemplateRenderer,
) -> Result<RenderedReport, RorError> {
    let timestamp = request
        .timestamp
        .clone()
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));
    let payload = request.into_payload()?;

    let (bytes, image_section) = render_payload(&payload, &timestamp, renderer)?;
    Ok(RenderedReport {
        bytes,
        filename: report_filename(&timestamp),
        image_section,
    })
}

/// Lay out and serialize an already validated payload.
pub fn render_payload(
    payload: &ReportPayload,
    timestamp: &str,
    renderer: &TemplateRenderer,
) -> Result<(Vec<u8>, ImageSection), RorError> {
    let layout = layout_report(payload, &display_timestamp(timestamp), renderer)?;
    let bytes = write_pdf(&layout)?;
    tracing::info!(
        kind = payload.kind().as_str(),
        is_ai = payload.verdict().is_ai,
        image_section = layout.image_section.as_str(),
        size = bytes.len(),
        "report rendered"
    );
    Ok((bytes, layout.image_section))
}

/// Human-readable form of an ISO-8601 timestamp. Anything unparseable is
/// shown as given.
pub fn display_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed.with_timezone(&Utc).format(DISPLAY_FORMAT).to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// `RealOrRender-Analysis-<timestamp>.pdf`, with anything that is unsafe in a
/// `Content-Disposition` header replaced by `-`.
pub fn report_filename(timestamp: &str) -> String {
    let safe: String = timestamp
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | ':' => c,
            _ => '-',
        })
        .collect();
    format!("{}-Analysis-{}.pdf", PRODUCT_NAME, safe)
}
