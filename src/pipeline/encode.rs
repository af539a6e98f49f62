//! Image encoding: raw file bytes → base64 data URL for the OCR request.
//!
//! Scans are sent exactly as they sit on disk. Re-encoding a JPEG would add a
//! second round of compression artefacts to text that is already marginal, so
//! the bytes are only sniffed for their format and then base64-wrapped.

use crate::error::ImageError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use tracing::debug;

/// An image ready to embed in a JSON request body.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    /// File name the bytes were read from, for error context.
    pub file_name: String,
    /// `image/png` or `image/jpeg`.
    pub mime_type: &'static str,
    /// Standard base64 of the original bytes.
    pub data: String,
}

impl EncodedImage {
    /// `data:<mime>;base64,<data>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Detect the format from the magic bytes and base64-encode the file.
///
/// The extension is not trusted: a `.jpg` holding PNG bytes is sent as PNG,
/// and a `.png` holding anything else is rejected before a request is made.
pub fn encode_image(file_name: &str, bytes: &[u8]) -> Result<EncodedImage, ImageError> {
    let format = image::guess_format(bytes).map_err(|e| ImageError::NotAnImage {
        file: file_name.to_string(),
        detail: e.to_string(),
    })?;

    let mime_type = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        other => {
            return Err(ImageError::NotAnImage {
                file: file_name.to_string(),
                detail: format!("unsupported format {:?}", other),
            })
        }
    };

    let data = STANDARD.encode(bytes);
    debug!("Encoded {} ({}) → {} bytes base64", file_name, mime_type, data.len());

    Ok(EncodedImage {
        file_name: file_name.to_string(),
        mime_type,
        data,
    })
}
