//! # Image Intake
//!
//! Decode → resize to a fixed resolution → JPEG → base64.
//!
//! The resize ignores the source aspect ratio: every upload becomes exactly
//! `target_width × target_height`, so the model always receives the same
//! pixel budget. No EXIF orientation or color-space handling is applied.

use std::io::Cursor;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use fast_image_resize::Resizer;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use rca_scale::cpu::scale_rgba_cpu;
use rca_scale::plan::{Size, build_plan};
use tracing::debug;

use crate::error::{RcaError, RcaResult};

/// Settings for the intake step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeConfig {
    pub target_width: u32,
    pub target_height: u32,
    pub jpeg_quality: u8,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            target_width: 800,
            target_height: 600,
            jpeg_quality: 95,
        }
    }
}

/// A resized, JPEG-encoded, base64-encoded image ready to inline in a request.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub const MIME: &'static str = "image/jpeg";

    /// `data:image/jpeg;base64,...`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", Self::MIME, self.base64)
    }

    /// Decode the base64 payload back to JPEG bytes.
    pub fn jpeg_bytes(&self) -> RcaResult<Vec<u8>> {
        general_purpose::STANDARD
            .decode(&self.base64)
            .map_err(|e| RcaError::external("base64", e))
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("base64_len", &self.base64.len())
            .finish()
    }
}

/// Read and encode an image file.
pub fn encode_image_file(path: &Path, config: &IntakeConfig) -> RcaResult<EncodedImage> {
    let name = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| RcaError::image_decode(&name, e.to_string()))?;
    encode_named(&name, &bytes, config)
}

/// Encode an image held in memory.
pub fn encode_image_bytes(bytes: &[u8], config: &IntakeConfig) -> RcaResult<EncodedImage> {
    encode_named("<upload>", bytes, config)
}

fn encode_named(name: &str, bytes: &[u8], config: &IntakeConfig) -> RcaResult<EncodedImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| RcaError::image_decode(name, e.to_string()))?;
    debug!(
        source = name,
        width = decoded.width(),
        height = decoded.height(),
        "Decoded uploaded image"
    );

    let resized = resize_exact(decoded, config.target_width, config.target_height)?;
    let jpeg = encode_jpeg(&resized, config.jpeg_quality)?;

    Ok(EncodedImage {
        base64: general_purpose::STANDARD.encode(&jpeg),
        width: resized.width(),
        height: resized.height(),
    })
}

fn resize_exact(image: DynamicImage, width: u32, height: u32) -> RcaResult<RgbaImage> {
    let rgba = image.into_rgba8();
    let input = Size {
        w: rgba.width(),
        h: rgba.height(),
    };
    let plan = build_plan(input, Size { w: width, h: height });

    let mut out = vec![0u8; plan.out_len()];
    scale_rgba_cpu(&mut Resizer::new(), rgba.as_raw(), input, &plan, &mut out)?;

    RgbaImage::from_raw(plan.out.w, plan.out.h, out)
        .ok_or_else(|| RcaError::image_encode("resize", "scaled buffer does not match plan"))
}

fn encode_jpeg(image: &RgbaImage, quality: u8) -> RcaResult<Vec<u8>> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| RcaError::image_encode("jpeg", e.to_string()))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn tall_image_is_distorted_to_target() {
        let encoded = encode_image_bytes(&png_bytes(60, 200), &IntakeConfig::default()).unwrap();
        assert_eq!((encoded.width, encoded.height), (800, 600));

        let jpeg = encoded.jpeg_bytes().unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }

    #[test]
    fn custom_target_size_is_honored() {
        let config = IntakeConfig {
            target_width: 64,
            target_height: 48,
            jpeg_quality: 80,
        };
        let encoded = encode_image_bytes(&png_bytes(10, 10), &config).unwrap();
        assert_eq!((encoded.width, encoded.height), (64, 48));
    }

    #[test]
    fn data_uri_has_jpeg_prefix() {
        let encoded = encode_image_bytes(&png_bytes(8, 8), &IntakeConfig::default()).unwrap();
        let uri = encoded.data_uri();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert!(uri.ends_with(&encoded.base64));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = encode_image_bytes(b"definitely not an image", &IntakeConfig::default())
            .unwrap_err();
        assert_eq!(err.category(), "image_decode");
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = encode_image_file(
            Path::new("/nonexistent/workplace.jpg"),
            &IntakeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RcaError::ImageDecode { .. }));
        assert!(err.to_string().contains("/nonexistent/workplace.jpg"));
    }
}
