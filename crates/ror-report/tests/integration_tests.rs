//! Integration tests for ror-report with the bundled report copy.
//!
//! These go through the full pipeline: wire request, payload, layout and
//! PDF bytes.

use std::io::Cursor;

use base64::Engine;
use chrono::{TimeZone, Utc};
use image::{DynamicImage, ImageBuffer, Rgba};
use serde_json::json;

use ror_core::{ReportRequest, RorError};
use ror_report::layout::{palette, DrawOp, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};
use ror_report::{generate_report, layout_report, ImageSection, ReportLayout, TemplateRenderer};

fn png_data_uri(width: u32, height: u32) -> String {
    let img = ImageBuffer::from_pixel(width, height, Rgba([30u8, 160, 90, 255]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes.into_inner())
    )
}

fn request(body: serde_json::Value) -> ReportRequest {
    serde_json::from_value(body).unwrap()
}

fn layout_of(body: serde_json::Value) -> ReportLayout {
    let payload = request(body).into_payload().unwrap();
    layout_report(&payload, "2025-05-01 10:00:00 UTC", TemplateRenderer::bundled()).unwrap()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap()
}

// =============================================================================
// Report Scenarios
// =============================================================================

#[test]
fn test_ai_image_without_images() {
    let layout = layout_of(json!({
        "result": { "isAI": true, "confidence": 82 },
        "isVideo": false
    }));

    assert!(layout.find_text("RealOrRender Analysis Report").is_some());
    assert!(layout.find_text("Generated on: 2025-05-01 10:00:00 UTC").is_some());
    let label = layout.find_text("AI-GENERATED CONTENT").unwrap();
    assert_eq!(label.color, palette::RESULT_RED);
    assert_eq!(
        layout.find_text("Confidence Score").unwrap().text,
        "Confidence Score: 82%"
    );
    assert!(layout.find_text("Analysis Explanation:").is_some());
    assert!(layout.find_text("informational purposes").is_some());

    assert_eq!(layout.image_section, ImageSection::Missing);
    assert!(layout.image_rects().is_empty());
    assert!(layout.find_text("Face").is_none());
    assert!(layout.find_text("Original Image").is_none());
}

#[test]
fn test_authentic_image_with_pair() {
    let layout = layout_of(json!({
        "result": {
            "isAI": false,
            "confidence": 95,
            "faceConfidence": 88,
            "faceBox": [10, 10, 50, 60]
        },
        "isVideo": false,
        "correctedOriginalBase64": png_data_uri(120, 80),
        "boxedImageBase64": png_data_uri(120, 80)
    }));

    assert_eq!(
        layout.find_text("AUTHENTIC CONTENT").unwrap().color,
        palette::RESULT_GREEN
    );
    assert!(layout.find_text("Face Detection Confidence: 88%").is_some());
    assert!(layout
        .find_text("Detected Face Box (x,y,w,h): [10, 10, 50, 60]")
        .is_some());

    assert_eq!(layout.image_section, ImageSection::Drawn);
    assert_eq!(layout.image_rects().len(), 2);
    assert_eq!(layout.images.len(), 2);
    assert!(layout.texts().any(|run| run.text == "Original Image"));
    assert!(layout.texts().any(|run| run.text == "Detected Face Box"));
}

#[test]
fn test_corrupt_image_omits_whole_section() {
    let report = generate_report(
        request(json!({
            "result": {
                "isAI": false,
                "confidence": 95,
                "faceConfidence": 88,
                "faceBox": [10, 10, 50, 60]
            },
            "correctedOriginalBase64": png_data_uri(120, 80),
            "boxedImageBase64": "data:image/png;base64,!!!corrupt!!!"
        })),
        now(),
    )
    .unwrap();

    assert!(report.bytes.starts_with(b"%PDF-"));
    assert_eq!(report.image_section, ImageSection::EmbedFailed);

    let layout = layout_of(json!({
        "result": { "isAI": false, "confidence": 95 },
        "correctedOriginalBase64": png_data_uri(120, 80),
        "boxedImageBase64": "data:image/png;base64,!!!corrupt!!!"
    }));
    assert!(layout.image_rects().is_empty());
    assert!(layout.find_text("Original Image").is_none());
}

#[test]
fn test_video_detail_lines() {
    let layout = layout_of(json!({
        "isVideo": true,
        "result": {
            "isAI": true,
            "confidence": 70,
            "averageFaceConfidence": 64,
            "processedFrameCount": 12,
            "faceBox": [1, 2, 3, 4],
            "faceConfidence": 99
        }
    }));

    assert_eq!(
        layout.find_text("Confidence Score").unwrap().text,
        "Confidence Score: 70% (Avg. across frames)"
    );
    assert!(layout.find_text("Avg. Face Detection Confidence: 64%").is_some());
    assert!(layout.find_text("Frames Processed with Face: 12").is_some());
    assert!(layout.find_text("Detected Face Box").is_none());
    assert!(layout.find_text("Face Detection Confidence: 99%").is_none());
}

// =============================================================================
// Mistyped Optional Fields
// =============================================================================

#[test]
fn test_short_face_box_leaves_line_out() {
    let report = generate_report(
        request(json!({
            "result": { "isAI": true, "confidence": 82, "faceBox": [10, 20, 30] }
        })),
        now(),
    )
    .unwrap();
    assert!(report.bytes.starts_with(b"%PDF-"));

    let layout = layout_of(json!({
        "result": { "isAI": true, "confidence": 82, "faceBox": [10, 20, 30] }
    }));
    assert!(layout.find_text("AI-GENERATED CONTENT").is_some());
    assert!(layout.find_text("Detected Face Box").is_none());
}

#[test]
fn test_video_with_bogus_face_box_renders() {
    let layout = layout_of(json!({
        "isVideo": true,
        "result": {
            "isAI": false,
            "confidence": 70,
            "faceBox": "oops",
            "processedFrameCount": 12.5,
            "averageFaceConfidence": 64
        }
    }));
    assert!(layout.find_text("Avg. Face Detection Confidence: 64%").is_some());
    assert!(layout.find_text("Frames Processed").is_none());
}

#[test]
fn test_string_confidence_and_numeric_image_dropped() {
    let report = generate_report(
        request(json!({
            "result": { "isAI": false, "confidence": 95, "faceConfidence": "88" },
            "timestamp": 42,
            "correctedOriginalBase64": png_data_uri(40, 30),
            "boxedImageBase64": 42
        })),
        now(),
    )
    .unwrap();
    assert!(report.bytes.starts_with(b"%PDF-"));
    assert_eq!(report.image_section, ImageSection::Missing);
    assert_eq!(
        report.filename,
        "RealOrRender-Analysis-2025-05-01T10:00:00.000Z.pdf"
    );

    let layout = layout_of(json!({
        "result": { "isAI": false, "confidence": 95, "faceConfidence": "88" }
    }));
    assert!(layout.find_text("Face Detection Confidence").is_none());
    assert_eq!(
        layout.find_text("Confidence Score").unwrap().text,
        "Confidence Score: 95%"
    );
}

// =============================================================================
// Mode Exclusivity
// =============================================================================

#[test]
fn test_image_mode_ignores_video_frames() {
    let layout = layout_of(json!({
        "result": { "isAI": true, "confidence": 60, "processedFrameCount": 5 },
        "firstRawFrameBase64": png_data_uri(50, 50),
        "firstBoxedFrameBase64": png_data_uri(50, 50)
    }));

    assert_eq!(layout.image_section, ImageSection::Missing);
    assert!(layout.find_text("Frames Processed").is_none());
    assert!(layout.find_text("Representative Frame").is_none());
}

#[test]
fn test_video_mode_uses_frame_captions() {
    let layout = layout_of(json!({
        "isVideo": true,
        "result": { "isAI": false, "confidence": 90 },
        "firstRawFrameBase64": png_data_uri(64, 36),
        "firstBoxedFrameBase64": png_data_uri(64, 36),
        "correctedOriginalBase64": png_data_uri(10, 10)
    }));

    assert_eq!(layout.image_section, ImageSection::Drawn);
    assert!(layout.texts().any(|run| run.text == "Representative Frame (Original)"));
    assert!(layout.texts().any(|run| run.text == "Representative Frame (Boxed)"));
    assert!(layout.find_text("Original Image").is_none());
}

// =============================================================================
// Geometry
// =============================================================================

#[test]
fn test_large_images_fit_their_box() {
    let layout = layout_of(json!({
        "result": { "isAI": false, "confidence": 95 },
        "correctedOriginalBase64": png_data_uri(3000, 1000),
        "boxedImageBase64": png_data_uri(500, 2500)
    }));

    let max_width = (PAGE_WIDTH - 2.0 * MARGIN - 10.0) / 2.0;
    let max_height = PAGE_HEIGHT * 0.30;
    let rects = layout.image_rects();
    assert_eq!(rects.len(), 2);
    for rect in &rects {
        assert!(rect.width <= max_width + 1e-3);
        assert!(rect.height <= max_height + 1e-3);
        assert!(rect.x >= MARGIN && rect.x + rect.width <= PAGE_WIDTH - MARGIN + 1e-3);
    }
    assert!((rects[0].width / rects[0].height - 3.0).abs() < 1e-3);
    assert!((rects[1].width / rects[1].height - 0.2).abs() < 1e-3);
}

#[test]
fn test_small_images_are_not_enlarged() {
    let layout = layout_of(json!({
        "result": { "isAI": false, "confidence": 95 },
        "correctedOriginalBase64": png_data_uri(40, 30),
        "boxedImageBase64": png_data_uri(40, 30)
    }));
    for rect in layout.image_rects() {
        assert_eq!((rect.width, rect.height), (40.0, 30.0));
    }
}

#[test]
fn test_everything_stays_on_page() {
    let layout = layout_of(json!({
        "isVideo": true,
        "result": {
            "isAI": true,
            "confidence": 70,
            "averageFaceConfidence": 64,
            "processedFrameCount": 12
        },
        "firstRawFrameBase64": png_data_uri(800, 800),
        "firstBoxedFrameBase64": png_data_uri(800, 800)
    }));

    for op in &layout.ops {
        if let DrawOp::Text(run) = op {
            assert!(run.x >= 0.0 && run.y >= 0.0 && run.y <= PAGE_HEIGHT, "{:?}", run);
        }
    }
    let explanation = layout.find_text("Analysis Explanation:").unwrap();
    let lowest_caption = layout
        .find_text("Representative Frame (Original)")
        .unwrap()
        .y;
    assert!(explanation.y < lowest_caption);
}

// =============================================================================
// Full Pipeline
// =============================================================================

#[test]
fn test_missing_result_rejected() {
    let err = generate_report(request(json!({ "isVideo": false })), now()).unwrap_err();
    assert_eq!(
        err,
        RorError::Validation("Missing 'result' data in request body.".to_string())
    );
}

#[test]
fn test_pdf_bytes_and_filename() {
    let report = generate_report(
        request(json!({
            "result": { "isAI": true, "confidence": 82 },
            "timestamp": "2025-05-01T10:00:00.000Z"
        })),
        now(),
    )
    .unwrap();

    assert!(report.bytes.starts_with(b"%PDF-"));
    assert_eq!(
        report.filename,
        "RealOrRender-Analysis-2025-05-01T10:00:00.000Z.pdf"
    );
    let doc = lopdf::Document::load_mem(&report.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn test_missing_timestamp_uses_now() {
    let report = generate_report(
        request(json!({ "result": { "isAI": false, "confidence": 51 } })),
        now(),
    )
    .unwrap();
    assert_eq!(
        report.filename,
        "RealOrRender-Analysis-2025-05-01T10:00:00.000Z.pdf"
    );
}

#[test]
fn test_rendering_is_deterministic() {
    let body = json!({
        "result": { "isAI": false, "confidence": 95, "faceConfidence": 88 },
        "timestamp": "2025-05-01T10:00:00.000Z",
        "correctedOriginalBase64": png_data_uri(60, 40),
        "boxedImageBase64": png_data_uri(60, 40)
    });
    let first = generate_report(request(body.clone()), now()).unwrap();
    let second = generate_report(request(body), now()).unwrap();
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn test_layout_independent_of_timestamp_value() {
    let at = |timestamp: &str| {
        let payload = request(json!({ "result": { "isAI": true, "confidence": 82 } }))
            .into_payload()
            .unwrap();
        layout_report(
            &payload,
            &ror_report::display_timestamp(timestamp),
            TemplateRenderer::bundled(),
        )
        .unwrap()
    };
    let a = at("2025-05-01T10:00:00Z");
    let b = at("1999-12-31T23:59:59Z");

    let positions = |layout: &ReportLayout| -> Vec<(f32, f32)> {
        layout.texts().map(|run| (run.x, run.y)).collect()
    };
    assert_eq!(positions(&a), positions(&b));
}
