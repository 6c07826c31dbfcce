//! PDF serialization of a [`ReportLayout`].
//!
//! One page, two Type1 standard fonts, one image XObject per placed image.
//! JPEG streams are stored as-is under DCTDecode; everything else is
//! Flate-compressed on save.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use ror_core::RorError;

use crate::embed::{EmbeddedImage, PixelData};
use crate::fonts::{encode_win_ansi, Font};
use crate::layout::{Color, DrawOp, ReportLayout, TextRun};

const PDF_VERSION: &str = "1.5";

fn serialization_error(e: lopdf::Error) -> RorError {
    RorError::Serialization(e.to_string())
}

/// Serialize the layout into a complete PDF file.
pub fn write_pdf(layout: &ReportLayout) -> Result<Vec<u8>, RorError> {
    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in [Font::Regular, Font::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }

    let mut xobjects = Dictionary::new();
    for (index, image) in layout.images.iter().enumerate() {
        let image_id = add_image(&mut doc, image);
        xobjects.set(image_resource_name(index), image_id);
    }

    let content = Content {
        operations: content_operations(layout),
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().map_err(serialization_error)?,
    ));

    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });
    let media_box: Vec<Object> = vec![0.into(), 0.into(), layout.width.into(), layout.height.into()];
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => media_box,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RorError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn image_resource_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

fn add_image(doc: &mut Document, image: &EmbeddedImage) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width() as i64,
        "Height" => image.height() as i64,
        "BitsPerComponent" => 8,
    };

    let stream = match image.pixels() {
        PixelData::Jpeg { data, color_space } => {
            dict.set("ColorSpace", Object::Name(color_space.pdf_name().as_bytes().to_vec()));
            dict.set("Filter", "DCTDecode");
            let mut stream = Stream::new(dict, data.clone());
            stream.allows_compression = false;
            stream
        }
        PixelData::Rgb { rgb, alpha } => {
            dict.set("ColorSpace", "DeviceRGB");
            if let Some(alpha) = alpha {
                let mask_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => image.width() as i64,
                        "Height" => image.height() as i64,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    alpha.clone(),
                ));
                dict.set("SMask", mask_id);
            }
            Stream::new(dict, rgb.clone())
        }
    };
    doc.add_object(stream)
}

fn content_operations(layout: &ReportLayout) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &layout.ops {
        match op {
            DrawOp::Text(run) => push_text(&mut ops, run),
            DrawOp::Line {
                from,
                to,
                thickness,
                color,
            } => {
                ops.push(Operation::new("RG", color_operands(*color)));
                ops.push(Operation::new("w", vec![(*thickness).into()]));
                ops.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
                ops.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
                ops.push(Operation::new("S", vec![]));
            }
            DrawOp::Image { index, rect } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        rect.width.into(),
                        0.into(),
                        0.into(),
                        rect.height.into(),
                        rect.x.into(),
                        rect.y.into(),
                    ],
                ));
                ops.push(Operation::new(
                    "Do",
                    vec![Object::Name(image_resource_name(*index).into_bytes())],
                ));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}

fn push_text(ops: &mut Vec<Operation>, run: &TextRun) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![
            Object::Name(run.font.resource_name().as_bytes().to_vec()),
            run.size.into(),
        ],
    ));
    ops.push(Operation::new("rg", color_operands(run.color)));
    ops.push(Operation::new("Td", vec![run.x.into(), run.y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_win_ansi(&run.text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn color_operands(color: Color) -> Vec<Object> {
    vec![color.r.into(), color.g.into(), color.b.into()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout_report, ImageSection};
    use crate::renderer::TemplateRenderer;
    use ror_core::{ImageReport, ReportPayload, Verdict};

    fn text_only_layout() -> ReportLayout {
        let payload = ReportPayload::Image(ImageReport {
            verdict: Verdict {
                is_ai: false,
                confidence: 95.0,
            },
            face_confidence: None,
            face_box: None,
            original: None,
            boxed: None,
        });
        layout_report(&payload, "2025-05-01 10:00:00 UTC", TemplateRenderer::bundled()).unwrap()
    }

    #[test]
    fn test_pdf_signature() {
        let bytes = write_pdf(&text_only_layout()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_single_page_round_trip() {
        let layout = text_only_layout();
        assert_eq!(layout.image_section, ImageSection::Missing);

        let bytes = write_pdf(&layout).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_text_operations() {
        let ops = content_operations(&text_only_layout());
        let shown = ops.iter().filter(|op| op.operator == "Tj").count();
        let begun = ops.iter().filter(|op| op.operator == "BT").count();
        assert_eq!(shown, begun);
        assert!(ops.iter().any(|op| op.operator == "S"));
        assert!(!ops.iter().any(|op| op.operator == "Do"));
    }
    fn encoded(image: image::DynamicImage, format: image::ImageFormat, mime: &str) -> String {
        use base64::Engine;
        let mut bytes = std::io::Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        format!(
            "data:{};base64,{}",
            mime,
            base64::engine::general_purpose::STANDARD.encode(bytes.into_inner())
        )
    }

    #[test]
    fn test_image_xobjects() {
        let jpeg = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            32,
            24,
            image::Rgb([200, 40, 40]),
        ));
        let png = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            32,
            24,
            image::Rgba([40, 40, 200, 100]),
        ));
        let payload = ReportPayload::Image(ImageReport {
            verdict: Verdict {
                is_ai: true,
                confidence: 82.0,
            },
            face_confidence: None,
            face_box: None,
            original: Some(encoded(jpeg, image::ImageFormat::Jpeg, "image/jpeg")),
            boxed: Some(encoded(png, image::ImageFormat::Png, "image/png")),
        });
        let layout = layout_report(&payload, "x", TemplateRenderer::bundled()).unwrap();
        assert_eq!(layout.image_section, ImageSection::Drawn);

        let ops = content_operations(&layout);
        assert_eq!(ops.iter().filter(|op| op.operator == "Do").count(), 2);

        let doc = Document::load_mem(&write_pdf(&layout).unwrap()).unwrap();
        let images: Vec<&Stream> = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .is_ok_and(|name| name == b"Image")
            })
            .collect();
        // JPEG, PNG and the PNG's soft mask
        assert_eq!(images.len(), 3);
        assert!(images.iter().any(|stream| {
            stream
                .dict
                .get(b"Filter")
                .and_then(|f| f.as_name())
                .is_ok_and(|name| name == b"DCTDecode")
        }));
        assert!(images.iter().any(|stream| stream.dict.has(b"SMask")));
    }
}
