//! Diagram image input.
//!
//! Images are accepted as PNG or JPEG, detected from their leading bytes, and
//! must not exceed the configured byte limit. The model receives them as a
//! base64 `data:` URL.

use std::{fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::debug;

use crate::error::FlowsketchError;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// A supported image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A validated image ready to send to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    format: ImageFormat,
    encoded: String,
}

impl ImageInput {
    /// Reads an image file.
    ///
    /// # Errors
    ///
    /// Returns [`FlowsketchError::Image`] if the file is larger than
    /// `max_bytes` or not a PNG/JPEG image, and [`FlowsketchError::Io`] if it
    /// cannot be read.
    pub fn from_path(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self, FlowsketchError> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        check_size(size, max_bytes)?;

        let bytes = fs::read(path)?;
        debug!(path:? = path, size; "Read image file");
        Self::from_bytes(&bytes, max_bytes)
    }

    /// Wraps raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FlowsketchError::Image`] for oversized or unsupported input.
    pub fn from_bytes(bytes: &[u8], max_bytes: u64) -> Result<Self, FlowsketchError> {
        check_size(bytes.len() as u64, max_bytes)?;
        let format = ImageFormat::sniff(bytes).ok_or_else(|| {
            FlowsketchError::Image("unsupported image format; expected PNG or JPEG".to_string())
        })?;

        Ok(Self {
            format,
            encoded: STANDARD.encode(bytes),
        })
    }

    /// Wraps base64-encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FlowsketchError::Image`] if `text` is not valid base64 or the
    /// decoded bytes are rejected by [`ImageInput::from_bytes`].
    pub fn from_base64(text: &str, max_bytes: u64) -> Result<Self, FlowsketchError> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|err| FlowsketchError::Image(format!("invalid base64 image data: {err}")))?;
        Self::from_bytes(&bytes, max_bytes)
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Base64 encoding of the image bytes.
    pub fn base64(&self) -> &str {
        &self.encoded
    }

    /// Returns the image as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.encoded)
    }
}

fn check_size(size: u64, max_bytes: u64) -> Result<(), FlowsketchError> {
    if size > max_bytes {
        return Err(FlowsketchError::Image(format!(
            "image is {size} bytes; the limit is {max_bytes} bytes"
        )));
    }
    Ok(())
}
