//! Single-page layout of the analysis report.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner. A
//! cursor starts at the top margin and only moves down; each section draws at
//! the cursor and then advances it by a fixed amount. Text is never wrapped.
//!
//! ```text
//! title · timestamp · rule · result section · [image pair] · explanation
//! ...
//! footer (pinned to the bottom margin)
//! ```

use serde_json::json;

use ror_core::{ImageReport, MediaKind, ReportPayload, RorError, VideoReport};

use crate::embed::{EmbeddedImage, Size};
use crate::fonts::Font;
use crate::renderer::TemplateRenderer;
use crate::templates::{CaptionPair, LineTemplate};

/// A4 portrait.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Indent of the result label and detail lines.
const RESULT_INDENT: f32 = 15.0;
/// Horizontal gap between the two images of a pair.
const IMAGE_GAP: f32 = 10.0;
/// Image height cap as a fraction of the page height.
const IMAGE_MAX_HEIGHT_RATIO: f32 = 0.30;
/// Images whose bottom edge would sit below this are not drawn.
pub const MIN_IMAGE_Y: f32 = MARGIN + 50.0;
const CAPTION_SIZE: f32 = 9.0;
const CAPTION_GAP: f32 = 5.0;
const FOOTER_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b }
    }
}

pub mod palette {
    use super::Color;

    pub const TITLE_BLUE: Color = Color::rgb(0.0, 0.53, 0.71);
    pub const RESULT_RED: Color = Color::rgb(0.863, 0.208, 0.271);
    pub const RESULT_GREEN: Color = Color::rgb(0.1, 0.6, 0.1);
    pub const DARK_GRAY: Color = Color::rgb(0.3, 0.3, 0.3);
    pub const LIGHT_GRAY: Color = Color::rgb(0.588, 0.588, 0.588);
    pub const LINE_GRAY: Color = Color::rgb(0.78, 0.78, 0.78);
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Left edge of the first glyph.
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub size: f32,
    pub font: Font,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextRun),
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Color,
    },
    /// Place `ReportLayout::images[index]` into `rect`.
    Image { index: usize, rect: Rect },
}

/// What happened to the side-by-side image section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSection {
    Drawn,
    /// One or both data URIs were not supplied.
    Missing,
    /// One or both images could not be decoded.
    EmbedFailed,
    /// The pair would have reached into the footer area.
    Overflow,
}

impl ImageSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drawn => "drawn",
            Self::Missing => "missing",
            Self::EmbedFailed => "embed_failed",
            Self::Overflow => "overflow",
        }
    }
}

/// Drawing instructions for one page.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
    pub images: Vec<EmbeddedImage>,
    pub image_section: ImageSection,
}

impl ReportLayout {
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(run) => Some(run),
            _ => None,
        })
    }

    pub fn find_text(&self, needle: &str) -> Option<&TextRun> {
        self.texts().find(|run| run.text.contains(needle))
    }

    pub fn image_rects(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

/// Two images drawn side by side with a caption under each.
pub struct ImagePair<'a> {
    pub left: EmbeddedImage,
    pub right: EmbeddedImage,
    pub left_caption: &'a str,
    pub right_caption: &'a str,
}

/// Next writable baseline; only ever moves down.
#[derive(Debug, Clone, Copy)]
struct LayoutCursor {
    y: f32,
}

impl LayoutCursor {
    fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }
}

struct PageBuilder {
    ops: Vec<DrawOp>,
    images: Vec<EmbeddedImage>,
    cursor: LayoutCursor,
}

impl PageBuilder {
    fn new() -> Self {
        PageBuilder {
            ops: Vec::new(),
            images: Vec::new(),
            cursor: LayoutCursor {
                y: PAGE_HEIGHT - MARGIN,
            },
        }
    }

    fn text_at(&mut self, text: &str, x: f32, y: f32, size: f32, font: Font, color: Color) {
        self.ops.push(DrawOp::Text(TextRun {
            text: text.to_string(),
            x,
            y,
            size,
            font,
            color,
        }));
    }

    /// Left-aligned text at the cursor.
    fn text(&mut self, text: &str, indent: f32, size: f32, font: Font, color: Color) {
        let y = self.cursor.y;
        self.text_at(text, MARGIN + indent, y, size, font, color);
    }

    fn centered(&mut self, text: &str, size: f32, font: Font, color: Color) {
        let x = (PAGE_WIDTH - font.text_width(text, size)) / 2.0;
        let y = self.cursor.y;
        self.text_at(text, x, y, size, font, color);
    }

    fn rule(&mut self) {
        let y = self.cursor.y;
        self.ops.push(DrawOp::Line {
            from: (MARGIN, y),
            to: (PAGE_WIDTH - MARGIN, y),
            thickness: 1.0,
            color: palette::LINE_GRAY,
        });
    }

    fn image(&mut self, image: EmbeddedImage, rect: Rect) {
        let index = self.images.len();
        self.images.push(image);
        self.ops.push(DrawOp::Image { index, rect });
    }

    /// Lay out a pair at the cursor. Returns the lowest baseline used, or
    /// `None` when the pair does not fit above the footer area.
    fn image_pair(&mut self, pair: ImagePair<'_>) -> Option<f32> {
        let max_width = (CONTENT_WIDTH - IMAGE_GAP) / 2.0;
        let max_height = PAGE_HEIGHT * IMAGE_MAX_HEIGHT_RATIO;

        let left_size = pair.left.scale(pair.left.fit_scale(max_width, max_height));
        let right_size = pair.right.scale(pair.right.fit_scale(max_width, max_height));
        let image_y = self.cursor.y - left_size.height.max(right_size.height);
        if image_y < MIN_IMAGE_Y {
            tracing::warn!(image_y, min = MIN_IMAGE_Y, "image pair too low, skipping");
            return None;
        }

        let left_x = MARGIN;
        let right_x = left_x + left_size.width + IMAGE_GAP;
        self.image(pair.left, rect_at(left_x, image_y, left_size));
        self.image(pair.right, rect_at(right_x, image_y, right_size));

        let caption_y = image_y - CAPTION_SIZE - CAPTION_GAP;
        for (caption, x, size) in [
            (pair.left_caption, left_x, left_size),
            (pair.right_caption, right_x, right_size),
        ] {
            let caption_width = Font::Regular.text_width(caption, CAPTION_SIZE);
            self.text_at(
                caption,
                x + (size.width - caption_width) / 2.0,
                caption_y,
                CAPTION_SIZE,
                Font::Regular,
                palette::LIGHT_GRAY,
            );
        }
        Some(caption_y)
    }

    fn finish(self, image_section: ImageSection) -> ReportLayout {
        ReportLayout {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            ops: self.ops,
            images: self.images,
            image_section,
        }
    }
}

fn rect_at(x: f32, y: f32, size: Size) -> Rect {
    Rect {
        x,
        y,
        width: size.width,
        height: size.height,
    }
}

/// Lay out the report for `payload`. `generated_on` is the already formatted
/// time shown under the title.
pub fn layout_report(
    payload: &ReportPayload,
    generated_on: &str,
    renderer: &TemplateRenderer,
) -> Result<ReportLayout, RorError> {
    let copy = renderer.templates();
    let mut page = PageBuilder::new();

    page.centered(&copy.title, 20.0, Font::Bold, palette::TITLE_BLUE);
    page.cursor.advance(35.0);

    page.centered(
        &renderer.generated_on(generated_on)?,
        9.0,
        Font::Regular,
        palette::LIGHT_GRAY,
    );
    page.cursor.advance(19.0);

    page.rule();
    page.cursor.advance(25.0);

    // Result section
    page.text(&copy.result_heading, 0.0, 14.0, Font::Bold, palette::DARK_GRAY);
    page.cursor.advance(20.0);

    let verdict = payload.verdict();
    let (label, label_color) = if verdict.is_ai {
        (&copy.labels.ai, palette::RESULT_RED)
    } else {
        (&copy.labels.authentic, palette::RESULT_GREEN)
    };
    page.text(label, RESULT_INDENT, 12.0, Font::Bold, label_color);
    page.cursor.advance(20.0);

    for line in result_lines(payload, renderer)? {
        page.text(&line, RESULT_INDENT, 10.0, Font::Regular, palette::DARK_GRAY);
        page.cursor.advance(15.0);
    }
    page.cursor.advance(15.0);

    // Image pair
    let captions = match payload.kind() {
        MediaKind::Image => &copy.captions.image,
        MediaKind::Video => &copy.captions.video,
    };
    let (image_section, section_end) = match embed_pair(payload, captions) {
        Ok(pair) => match page.image_pair(pair) {
            Some(caption_y) => (ImageSection::Drawn, caption_y),
            None => (ImageSection::Overflow, page.cursor.y),
        },
        Err(section) => (section, page.cursor.y),
    };
    page.cursor.y = section_end;
    page.cursor.advance(25.0);

    // Explanation
    page.text(&copy.explanation.heading, 0.0, 11.0, Font::Bold, palette::DARK_GRAY);
    page.cursor.advance(18.0);
    for line in &copy.explanation.lines {
        page.text(line, 0.0, 9.0, Font::Regular, palette::DARK_GRAY);
        page.cursor.advance(12.0);
    }
    page.cursor.advance(10.0);

    // Footer, pinned regardless of the cursor. The first line sits above the last.
    let footer_base = MARGIN / 2.0;
    let footer_count = copy.footer.len();
    for (i, line) in copy.footer.iter().enumerate() {
        let from_bottom = (footer_count - 1 - i) as f32;
        let y = footer_base + from_bottom * (FOOTER_SIZE + 2.0);
        page.text_at(line, MARGIN, y, FOOTER_SIZE, Font::Regular, palette::LIGHT_GRAY);
    }

    tracing::debug!(
        kind = payload.kind().as_str(),
        ops = page.ops.len(),
        image_section = image_section.as_str(),
        "report laid out"
    );
    Ok(page.finish(image_section))
}

/// Confidence line followed by the detail lines of the payload's kind.
fn result_lines(payload: &ReportPayload, renderer: &TemplateRenderer) -> Result<Vec<String>, RorError> {
    let confidence = json!({ "confidence": format_number(payload.verdict().confidence) });
    let mut lines = Vec::with_capacity(3);

    match payload {
        ReportPayload::Image(ImageReport {
            face_confidence,
            face_box,
            ..
        }) => {
            lines.push(renderer.render_line(LineTemplate::Confidence, &confidence)?);
            if let Some(value) = face_confidence {
                lines.push(value_line(renderer, LineTemplate::FaceConfidence, format_number(*value))?);
            }
            if let Some(face_box) = face_box {
                let joined = face_box
                    .iter()
                    .map(|v| format_number(*v))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(value_line(renderer, LineTemplate::FaceBox, joined)?);
            }
        }
        ReportPayload::Video(VideoReport {
            average_face_confidence,
            processed_frame_count,
            ..
        }) => {
            lines.push(renderer.render_line(LineTemplate::ConfidenceVideo, &confidence)?);
            if let Some(value) = average_face_confidence {
                lines.push(value_line(
                    renderer,
                    LineTemplate::AverageFaceConfidence,
                    format_number(*value),
                )?);
            }
            if let Some(count) = processed_frame_count {
                lines.push(value_line(
                    renderer,
                    LineTemplate::ProcessedFrameCount,
                    count.to_string(),
                )?);
            }
        }
    }
    Ok(lines)
}

fn value_line(renderer: &TemplateRenderer, line: LineTemplate, value: String) -> Result<String, RorError> {
    renderer.render_line(line, &json!({ "value": value }))
}

/// Embed both images of the pair, or say why the section is skipped.
fn embed_pair<'a>(
    payload: &ReportPayload,
    captions: &'a CaptionPair,
) -> Result<ImagePair<'a>, ImageSection> {
    let kind = payload.kind().as_str();
    let (left, right) = match payload.image_sources() {
        (Some(left), Some(right)) => (left, right),
        _ => {
            tracing::debug!(kind, "image pair not supplied");
            return Err(ImageSection::Missing);
        }
    };

    let embed = |uri: &str, role: &str| match EmbeddedImage::from_data_uri(uri) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!(kind, role, error = %e, "image not embedded");
            None
        }
    };
    match (embed(left, "left"), embed(right, "right")) {
        (Some(left), Some(right)) => Ok(ImagePair {
            left,
            right,
            left_caption: &captions.left,
            right_caption: &captions.right,
        }),
        _ => Err(ImageSection::EmbedFailed),
    }
}

/// Integral values without a fractional part, others in shortest form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
