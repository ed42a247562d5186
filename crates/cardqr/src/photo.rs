//! Embedded profile photos.
//!
//! Photos are stored on the profile as self-describing data references of
//! the form `data:image/<type>;base64,<payload>`.

use std::path::Path;
use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const DATA_IMAGE_PREFIX: &str = "data:image/";

fn typed_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^data:image/(png|jpeg|gif);base64,").expect("static pattern is valid")
    })
}

/// Accepted photo image types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoType {
    /// Portable Network Graphics.
    Png,
    /// JPEG.
    Jpeg,
    /// Graphics Interchange Format.
    Gif,
}

impl PhotoType {
    /// The vCard `TYPE=` parameter value.
    #[must_use]
    pub fn vcard_type(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Gif => "GIF",
        }
    }

    /// The MIME subtype used in data references.
    #[must_use]
    pub fn subtype(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }

    fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            "png" => Some(Self::Png),
            "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }
}

/// A parsed photo reference borrowing from the stored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoRef<'a> {
    /// Declared image type; `JPEG` when the tag is missing or unrecognized.
    pub kind: PhotoType,
    /// The raw base64 payload.
    pub payload: &'a str,
}

/// Parse a stored photo reference.
///
/// Returns `None` unless the value starts with `data:image/` and carries a
/// payload after the first comma.
#[must_use]
pub fn parse_photo(value: &str) -> Option<PhotoRef<'_>> {
    if !value.starts_with(DATA_IMAGE_PREFIX) {
        return None;
    }
    let (_, payload) = value.split_once(',')?;
    let kind = typed_prefix()
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| PhotoType::from_subtype(m.as_str()))
        .unwrap_or(PhotoType::Jpeg);
    Some(PhotoRef { kind, payload })
}

/// Build a data reference from raw image bytes.
///
/// The format is sniffed from the bytes, not the file name.
///
/// # Errors
///
/// Returns [`Error::PhotoFormat`] unless the bytes are PNG, JPEG or GIF.
pub fn encode_photo(bytes: &[u8]) -> Result<String> {
    let format = image::guess_format(bytes).map_err(|_| Error::PhotoFormat {
        detected: "unknown".to_string(),
    })?;
    let kind = PhotoType::from_format(format).ok_or_else(|| Error::PhotoFormat {
        detected: format!("{format:?}"),
    })?;
    Ok(format!(
        "{DATA_IMAGE_PREFIX}{};base64,{}",
        kind.subtype(),
        STANDARD.encode(bytes)
    ))
}

/// Read an image file and convert it to a data reference.
///
/// Files larger than `soft_limit` bytes are accepted but logged.
///
/// # Errors
///
/// Returns an error if the file can't be read or isn't an accepted format.
pub fn load_photo(path: impl AsRef<Path>, soft_limit: u64) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let size = bytes.len() as u64;
    if size > soft_limit {
        warn!(
            "Photo {} is {} bytes, above the suggested {} bytes; the QR code may not fit",
            path.display(),
            size,
            soft_limit
        );
    }
    debug!("Loaded photo {} ({} bytes)", path.display(), size);
    encode_photo(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const GIF_MAGIC: &[u8] = b"GIF89a\x01\0\x01\0";

    #[test]
    fn test_parse_png_reference() {
        let photo = parse_photo("data:image/png;base64,AAAA").unwrap();
        assert_eq!(photo.kind, PhotoType::Png);
        assert_eq!(photo.payload, "AAAA");
    }

    #[test]
    fn test_parse_unrecognized_type_falls_back_to_jpeg() {
        let photo = parse_photo("data:image/webp;base64,BBBB").unwrap();
        assert_eq!(photo.kind, PhotoType::Jpeg);
        assert_eq!(photo.payload, "BBBB");
    }

    #[test]
    fn test_parse_malformed_prefix_falls_back_to_jpeg() {
        let photo = parse_photo("data:image/png,CCCC").unwrap();
        assert_eq!(photo.kind, PhotoType::Jpeg);
        assert_eq!(photo.payload, "CCCC");
    }

    #[test]
    fn test_parse_rejects_non_image_reference() {
        assert!(parse_photo("https://example.com/me.png").is_none());
        assert!(parse_photo("data:text/plain;base64,AAAA").is_none());
    }

    #[test]
    fn test_parse_rejects_missing_payload() {
        assert!(parse_photo("data:image/png;base64").is_none());
    }

    #[test]
    fn test_encode_png_bytes() {
        let uri = encode_photo(PNG_MAGIC).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let parsed = parse_photo(&uri).unwrap();
        assert_eq!(parsed.kind, PhotoType::Png);
        assert_eq!(STANDARD.decode(parsed.payload).unwrap(), PNG_MAGIC);
    }

    #[test]
    fn test_encode_gif_bytes() {
        let uri = encode_photo(GIF_MAGIC).unwrap();
        assert!(uri.starts_with("data:image/gif;base64,"));
    }

    #[test]
    fn test_encode_rejects_unknown_bytes() {
        let err = encode_photo(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::PhotoFormat { .. }));
    }

    #[test]
    fn test_load_photo_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        // A tiny soft limit only warns
        let uri = load_photo(&path, 4).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_load_photo_missing_file() {
        let err = load_photo("/nonexistent/photo.png", 1024).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
