use serde::{Deserialize, Serialize};
use std::fmt;

/// Media types that can be attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MimeType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/bmp")]
    Bmp,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "application/pdf")]
    Pdf,
}

impl MimeType {
    pub fn as_str(self) -> &'static str {
        match self {
            MimeType::Jpeg => "image/jpeg",
            MimeType::Png => "image/png",
            MimeType::Gif => "image/gif",
            MimeType::Bmp => "image/bmp",
            MimeType::Webp => "image/webp",
            MimeType::Pdf => "application/pdf",
        }
    }

    /// Maps a file extension (with or without the dot, any case) to a MIME
    /// type. Unknown extensions map to JPEG.
    pub fn from_extension(extension: &str) -> Self {
        Self::from_known_extension(extension).unwrap_or(MimeType::Jpeg)
    }

    /// Like [`MimeType::from_extension`], but `None` for unknown extensions.
    pub fn from_known_extension(extension: &str) -> Option<Self> {
        match extension
            .trim_start_matches('.')
            .to_ascii_lowercase()
            .as_str()
        {
            "jpg" | "jpeg" => Some(MimeType::Jpeg),
            "png" => Some(MimeType::Png),
            "gif" => Some(MimeType::Gif),
            "bmp" => Some(MimeType::Bmp),
            "webp" => Some(MimeType::Webp),
            "pdf" => Some(MimeType::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &str) -> Self {
        Self::from_extension(extension(path).unwrap_or_default())
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension of the last path component, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Identifies the format from the leading magic bytes, if recognizable.
pub fn sniff(bytes: &[u8]) -> Option<MimeType> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some(MimeType::Jpeg),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some(MimeType::Png),
        [0x47, 0x49, 0x46, 0x38, ..] => Some(MimeType::Gif),
        [0x42, 0x4D, ..] => Some(MimeType::Bmp),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some(MimeType::Webp),
        [0x25, 0x50, 0x44, 0x46, ..] => Some(MimeType::Pdf),
        _ => None,
    }
}

/// `data:<mime>;base64,<payload>` as accepted by `image_url` content parts.
pub fn data_uri(mime_type: MimeType, encoded: &str) -> String {
    format!("data:{};base64,{}", mime_type.as_str(), encoded)
}
