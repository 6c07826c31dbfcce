//! # Image embedding
//!
//! Turns a `data:image/...;base64,...` URI into an image the PDF writer can
//! place. The format is taken from the URI prefix, never sniffed from the
//! bytes: a PNG labelled as JPEG fails to decode and is treated as absent.
//! JPEG bytes pass through unchanged (DCTDecode); PNG pixels are stored as RGB
//! with a separate alpha soft mask.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use image::{ColorType, DynamicImage, GenericImageView};

use ror_core::RorError;

/// Standard alphabet, padding optional.
const DATA_URI_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Recognise the declared MIME type of a data URI.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        if uri.starts_with("data:image/jpeg") || uri.starts_with("data:image/jpg") {
            Some(ImageFormat::Jpeg)
        } else if uri.starts_with("data:image/png") {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    fn decoder_format(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Color space of a pass-through JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl JpegColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            JpegColorSpace::DeviceRGB => "DeviceRGB",
            JpegColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// Pixel data in the form the PDF writer consumes.
#[derive(Debug, Clone)]
pub enum PixelData {
    /// Original JPEG stream.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// `width * height * 3` RGB bytes, plus `width * height` alpha bytes when
    /// the source had transparency.
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Placement size in page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// A decoded image ready to be placed on the page.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    width: u32,
    height: u32,
    pixels: PixelData,
}

impl EmbeddedImage {
    /// Decode a data URI. Unsupported MIME types, bad base64 and invalid image
    /// bytes all fail with [`RorError::ImageDecode`].
    pub fn from_data_uri(uri: &str) -> Result<Self, RorError> {
        let format = ImageFormat::from_data_uri(uri).ok_or_else(|| {
            let prefix: String = uri.chars().take(24).collect();
            RorError::ImageDecode(format!("unsupported data URI prefix '{}'", prefix))
        })?;
        let (_, payload) = uri
            .split_once(',')
            .ok_or_else(|| RorError::ImageDecode("data URI has no payload".to_string()))?;
        let payload: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = DATA_URI_BASE64
            .decode(payload.as_bytes())
            .map_err(|e| RorError::ImageDecode(format!("invalid base64: {}", e)))?;
        Self::from_bytes(bytes, format)
    }

    pub fn from_bytes(bytes: Vec<u8>, format: ImageFormat) -> Result<Self, RorError> {
        let decoded = image::load_from_memory_with_format(&bytes, format.decoder_format())
            .map_err(|e| RorError::ImageDecode(format!("{:?} decode failed: {}", format, e)))?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(RorError::ImageDecode("image has no pixels".to_string()));
        }

        let pixels = match format {
            ImageFormat::Jpeg => PixelData::Jpeg {
                color_space: jpeg_color_space(decoded.color()),
                data: bytes,
            },
            ImageFormat::Png => split_alpha(decoded),
        };
        Ok(EmbeddedImage {
            width,
            height,
            pixels,
        })
    }

    /// Intrinsic width in pixels; one pixel is placed as one point at scale 1.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    pub fn scale(&self, factor: f32) -> Size {
        Size {
            width: self.width as f32 * factor,
            height: self.height as f32 * factor,
        }
    }

    /// Largest factor that fits `max_width` x `max_height` without enlarging.
    pub fn fit_scale(&self, max_width: f32, max_height: f32) -> f32 {
        let width_scale = max_width / self.width as f32;
        let height_scale = max_height / self.height as f32;
        1.0f32.min(width_scale).min(height_scale)
    }
}

fn jpeg_color_space(color: ColorType) -> JpegColorSpace {
    match color {
        ColorType::L8 | ColorType::L16 => JpegColorSpace::DeviceGray,
        _ => JpegColorSpace::DeviceRGB,
    }
}

fn split_alpha(decoded: DynamicImage) -> PixelData {
    if !decoded.color().has_alpha() {
        return PixelData::Rgb {
            rgb: decoded.to_rgb8().into_raw(),
            alpha: None,
        };
    }

    let rgba = decoded.to_rgba8();
    let pixel_count = (rgba.width() * rgba.height()) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for px in rgba.as_raw().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
    }
    let alpha = if alpha.iter().all(|&a| a == u8::MAX) {
        None
    } else {
        Some(alpha)
    };
    PixelData::Rgb { rgb, alpha }
}
