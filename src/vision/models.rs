// Vision models and types
// Author: kelexine (https://github.com/kelexine)

use bytes::Bytes;

/// Content types of containers that downstream decoders cannot be trusted with.
pub const DIFFICULT_MEDIA_TYPES: &[&str] = &[
    "image/heic",
    "image/heif",
    "image/heic-sequence",
    "image/heif-sequence",
];

/// Filename extensions of the same containers.
pub const DIFFICULT_EXTENSIONS: &[&str] = &["heic", "heif", "heics"];

/// Target format of a conversion.
pub const TARGET_MEDIA_TYPE: &str = "image/jpeg";
pub const TARGET_EXTENSION: &str = "jpg";

/// Name used when the original upload had none.
pub const FALLBACK_BASENAME: &str = "upload";

/// A file part as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl ImageUpload {
    pub fn new(
        bytes: impl Into<Bytes>,
        filename: Option<String>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            filename,
            content_type,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the declared metadata names a difficult container.
    pub fn is_difficult(&self) -> bool {
        is_difficult(self.filename.as_deref(), self.content_type.as_deref())
    }
}

/// Re-encoded image produced for a difficult upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

impl From<ConvertedImage> for ImageUpload {
    fn from(converted: ConvertedImage) -> Self {
        ImageUpload {
            bytes: Bytes::from(converted.bytes),
            filename: Some(converted.filename),
            content_type: Some(converted.content_type.to_string()),
        }
    }
}

/// Detection uses declared metadata only, never the byte stream.
pub fn is_difficult(filename: Option<&str>, content_type: Option<&str>) -> bool {
    let by_type = content_type
        .map(essence)
        .map(|ct| DIFFICULT_MEDIA_TYPES.contains(&ct.as_str()))
        .unwrap_or(false);

    by_type
        || extension(filename)
            .map(|ext| DIFFICULT_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
}

/// Lower-cased media type without parameters (`image/HEIC; x=y` -> `image/heic`).
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Lower-cased text after the last dot; `None` for no dot or a trailing dot.
pub fn extension(filename: Option<&str>) -> Option<String> {
    let name = filename?;
    let dot = name.rfind('.')?;
    let ext = &name[dot + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Replace the extension with the target one, or append it when there is none.
pub fn target_filename(original: Option<&str>) -> String {
    let name = match original.map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => return format!("{}.{}", FALLBACK_BASENAME, TARGET_EXTENSION),
    };

    match name.rfind('.') {
        Some(dot) => format!("{}.{}", &name[..dot], TARGET_EXTENSION),
        None => format!("{}.{}", name, TARGET_EXTENSION),
    }
}
