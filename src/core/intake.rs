// src/core/intake.rs — Upload validation and decoding

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infra::errors::HealthMateError;

/// Default upload limit, matching the documented "under 5MB" rule.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// A validated, decoded upload.
///
/// Keeps the original encoded bytes (that is what goes over the wire to the
/// provider) plus the metadata recovered by decoding them.
#[derive(Clone)]
pub struct ImageHandle {
    bytes: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl ImageHandle {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Validates raw uploads before they can touch any session state.
#[derive(Debug, Clone)]
pub struct ImageIntake {
    max_bytes: u64,
}

impl Default for ImageIntake {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl ImageIntake {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Validate and decode a raw upload.
    ///
    /// The size check runs against the declared size before any decoding is
    /// attempted. On success the caller decides whether to install the handle
    /// into a session; this function mutates nothing.
    pub fn validate_and_decode(
        &self,
        raw: &[u8],
        declared_size: u64,
    ) -> Result<ImageHandle, HealthMateError> {
        if declared_size > self.max_bytes {
            return Err(HealthMateError::TooLarge {
                size: declared_size,
                limit: self.max_bytes,
            });
        }

        let guessed =
            image::guess_format(raw).map_err(|_| HealthMateError::UnsupportedFormat {
                detail: "unrecognized image data".into(),
            })?;

        let format = match guessed {
            image::ImageFormat::Png => ImageFormat::Png,
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            other => {
                return Err(HealthMateError::UnsupportedFormat {
                    detail: format!("{other:?}").to_lowercase(),
                })
            }
        };

        let decoded = image::load_from_memory_with_format(raw, guessed).map_err(|e| {
            HealthMateError::UnsupportedFormat {
                detail: e.to_string(),
            }
        })?;

        Ok(ImageHandle {
            bytes: raw.to_vec(),
            format,
            width: decoded.width(),
            height: decoded.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(fmt: image::ImageFormat) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), fmt).unwrap();
        buf
    }

    #[test]
    fn test_accepts_png() {
        let raw = encode(image::ImageFormat::Png);
        let handle = ImageIntake::default()
            .validate_and_decode(&raw, raw.len() as u64)
            .unwrap();
        assert_eq!(handle.format(), ImageFormat::Png);
        assert_eq!(handle.dimensions(), (4, 4));
        assert_eq!(handle.byte_size(), raw.len() as u64);
    }

    #[test]
    fn test_accepts_jpeg() {
        let raw = encode(image::ImageFormat::Jpeg);
        let handle = ImageIntake::default()
            .validate_and_decode(&raw, raw.len() as u64)
            .unwrap();
        assert_eq!(handle.format(), ImageFormat::Jpeg);
        assert_eq!(handle.format().mime_type(), "image/jpeg");
    }

    #[test]
    fn test_rejects_oversized_before_decoding() {
        // Garbage bytes with an oversized declared size: the size check must
        // fire first, so no decode error surfaces.
        let err = ImageIntake::default()
            .validate_and_decode(b"not an image", 6 * 1024 * 1024)
            .unwrap_err();
        assert!(matches!(err, HealthMateError::TooLarge { size, .. } if size == 6 * 1024 * 1024));
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        let err = ImageIntake::default()
            .validate_and_decode(b"definitely not an image", 23)
            .unwrap_err();
        assert!(matches!(err, HealthMateError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_rejects_disallowed_format() {
        let raw = encode(image::ImageFormat::Bmp);
        let err = ImageIntake::default()
            .validate_and_decode(&raw, raw.len() as u64)
            .unwrap_err();
        assert!(matches!(err, HealthMateError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_exactly_at_limit_passes_size_check() {
        let raw = encode(image::ImageFormat::Png);
        let intake = ImageIntake::new(raw.len() as u64);
        assert!(intake.validate_and_decode(&raw, raw.len() as u64).is_ok());
    }
}
