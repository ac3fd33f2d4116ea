//! Footer image payloads.
//!
//! Payloads are `data:image/...;base64,` URIs or bare base64. Only PNG and
//! JPEG are embedded; the format is taken from the magic bytes, not from
//! the declared MIME type, and the bytes must decode as that format.

use std::io::Cursor;

use base64::Engine;
use image::GenericImageView;
use serde::Serialize;
use thiserror::Error;

use crate::situation::ImagePayload;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image data URI has no payload")]
    MissingPayload,

    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image data too short")]
    TooShort,

    #[error("unsupported image format (expected JPEG or PNG)")]
    UnsupportedFormat,

    #[error("corrupt {format} image: {source}")]
    Decode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn detect(data: &[u8]) -> Result<Self, ImageError> {
        if data.len() < 4 {
            return Err(ImageError::TooShort);
        }
        if data[0] == 0xFF && data[1] == 0xD8 {
            Ok(ImageFormat::Jpeg)
        } else if data[..4] == [0x89, 0x50, 0x4E, 0x47] {
            Ok(ImageFormat::Png)
        } else {
            Err(ImageError::UnsupportedFormat)
        }
    }

    fn codec(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Decoded image bytes ready for the PDF backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedImage {
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
    pub size: usize,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Detects the format and fully decodes the pixels, so a truncated or
/// corrupt file is rejected here rather than by the PDF backend.
fn load(data: Vec<u8>) -> Result<EmbeddedImage, ImageError> {
    let format = ImageFormat::detect(&data)?;
    let decoded = image::io::Reader::with_format(Cursor::new(&data), format.codec())
        .decode()
        .map_err(|source| ImageError::Decode {
            format: format.extension(),
            source,
        })?;

    let (width_px, height_px) = decoded.dimensions();

    Ok(EmbeddedImage {
        format,
        width_px,
        height_px,
        size: data.len(),
        data,
    })
}

pub fn decode_payload(payload: &ImagePayload) -> Result<EmbeddedImage, ImageError> {
    let source = payload.as_str().trim();
    let encoded = if source.starts_with("data:") {
        let (_, data) = source.split_once(',').ok_or(ImageError::MissingPayload)?;
        data
    } else {
        source
    };
    if encoded.is_empty() {
        return Err(ImageError::MissingPayload);
    }

    let data = base64::engine::general_purpose::STANDARD.decode(encoded)?;
    load(data)
}

/// Wraps raw image file bytes into a data URI payload.
pub fn encode_payload(data: &[u8]) -> Result<ImagePayload, ImageError> {
    let image = load(data.to_vec())?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&image.data);
    Ok(ImagePayload::new(format!(
        "data:{};base64,{}",
        image.format.mime_type(),
        encoded
    )))
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A valid 1x1 red PNG.
    pub fn png_1x1() -> Vec<u8> {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));

        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    /// A valid 2x2 JPEG.
    pub fn jpeg_2x2() -> Vec<u8> {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));

        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8)
            .unwrap();
        buf
    }
}
