//! Decoded node images.
//!
//! Image nodes reference bitmaps by `image_id`; the host's resource provider
//! returns raw bytes or data URIs which are decoded here into RGBA pixels.

use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            "gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

/// A decoded RGBA image.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel, row-major).
    pub rgba: Vec<u8>,
    /// Format the pixels were decoded from.
    pub format: ImageFormat,
}

impl Bitmap {
    /// Wrap raw RGBA pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> RenderResult<Self> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if rgba.len() as u64 != expected {
            return Err(RenderError::Decode(format!(
                "expected {expected} bytes for {width}x{height}, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
            format: ImageFormat::Unknown,
        })
    }

    /// A bitmap filled with one color.
    #[must_use]
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            rgba: color.repeat(pixel_count),
            format: ImageFormat::Unknown,
        }
    }

    /// Decode encoded image bytes (PNG, JPEG, GIF, WebP).
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be decoded.
    #[cfg(feature = "images")]
    pub fn decode(data: &[u8]) -> RenderResult<Self> {
        let format = ImageFormat::from_magic_bytes(data);

        let img = image::load_from_memory(data).map_err(|e| RenderError::Decode(e.to_string()))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
            format,
        })
    }

    /// Decode encoded image bytes. Always fails without the `images` feature.
    ///
    /// # Errors
    ///
    /// Always returns [`RenderError::Decode`].
    #[cfg(not(feature = "images"))]
    pub fn decode(_data: &[u8]) -> RenderResult<Self> {
        Err(RenderError::Decode(
            "built without image decoding support".to_string(),
        ))
    }

    /// Decode a `data:` URI such as `data:image/png;base64,iVBORw0KGgo...`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is malformed or the image cannot be decoded.
    pub fn from_data_uri(uri: &str) -> RenderResult<Self> {
        Self::decode(&data_uri_bytes(uri)?)
    }

    /// Width and height as floating point, for layout.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }
}

/// Extract the payload bytes of a `data:` URI.
///
/// # Errors
///
/// Returns an error if the URI is malformed.
pub fn data_uri_bytes(uri: &str) -> RenderResult<Vec<u8>> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(encoded)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_extension("PNG"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("tiff"), ImageFormat::Unknown);
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            ImageFormat::Png
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
    }

    #[test]
    fn test_solid_and_from_rgba() {
        let bitmap = Bitmap::solid(2, 2, [255, 0, 0, 255]);
        assert_eq!(bitmap.rgba.len(), 16);
        assert_eq!(&bitmap.rgba[0..4], &[255, 0, 0, 255]);
        assert_eq!(bitmap.size(), (2.0, 2.0));

        assert!(Bitmap::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Bitmap::from_rgba(2, 2, vec![0; 15]),
            Err(RenderError::Decode(_))
        ));
    }

    #[cfg(feature = "images")]
    #[test]
    fn test_data_uri_decoding() {
        let bitmap = Bitmap::from_data_uri(&format!("data:image/png;base64,{PNG_1X1}")).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (1, 1));
        assert_eq!(bitmap.format, ImageFormat::Png);
    }

    #[test]
    fn test_data_uri_bytes() {
        assert_eq!(data_uri_bytes("data:text/plain,a%20b").unwrap(), b"a b");
        assert!(data_uri_bytes(&format!("data:image/png;base64,{PNG_1X1}"))
            .unwrap()
            .starts_with(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(data_uri_bytes("not a data uri").is_err());
        assert!(data_uri_bytes("data:image/png").is_err());
        assert!(data_uri_bytes("data:,%zz").is_err());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            Bitmap::decode(b"definitely not an image"),
            Err(RenderError::Decode(_))
        ));
    }
}
