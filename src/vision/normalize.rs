// Image normalization for the multipart transport
// Author: kelexine (https://github.com/kelexine)

use super::models::{target_filename, ConvertedImage, ImageUpload, TARGET_MEDIA_TYPE};
use crate::error::{GatewayError, Result};
use crate::metrics;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, info, warn};

/// Return the upload unchanged, or a JPEG re-encoding of it when its declared
/// type or extension names a difficult container.
pub fn normalize(upload: ImageUpload) -> Result<ImageUpload> {
    if !upload.is_difficult() {
        return Ok(upload);
    }

    let converted = convert(&upload)?;
    Ok(converted.into())
}

/// Same as [`normalize`], with decoding and encoding moved onto the blocking pool.
pub async fn normalize_upload(upload: ImageUpload) -> Result<ImageUpload> {
    if !upload.is_difficult() {
        return Ok(upload);
    }

    tokio::task::spawn_blocking(move || normalize(upload))
        .await
        .map_err(|e| GatewayError::Internal(format!("Image conversion task join error: {}", e)))?
}

/// Decode a difficult upload and re-encode it as JPEG.
pub fn convert(upload: &ImageUpload) -> Result<ConvertedImage> {
    debug!(
        "Converting {:?} ({:?}, {} bytes) to {}",
        upload.filename,
        upload.content_type,
        upload.bytes.len(),
        TARGET_MEDIA_TYPE
    );

    let decoded = image::load_from_memory(&upload.bytes).map_err(|e| {
        warn!("Failed to decode {:?}: {}", upload.filename, e);
        metrics::record_image_conversion("failed");
        GatewayError::InvalidImage(format!("image could not be decoded: {}", e))
    })?;

    let bytes = encode_jpeg(decoded)?;
    let filename = target_filename(upload.filename.as_deref());

    info!(
        "Converted {:?} to {} ({} -> {} bytes)",
        upload.filename,
        filename,
        upload.bytes.len(),
        bytes.len()
    );
    metrics::record_image_conversion("converted");

    Ok(ConvertedImage {
        bytes,
        filename,
        content_type: TARGET_MEDIA_TYPE,
    })
}

fn encode_jpeg(image: DynamicImage) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut out = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
        .map_err(|e| GatewayError::Internal(format!("JPEG encoding failed: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(8, 6, image::Rgba([200, 120, 40, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_passthrough_is_identity() {
        let upload = ImageUpload::new(
            Bytes::from_static(b"not even an image"),
            Some("face.png".to_string()),
            Some("image/png".to_string()),
        );

        let out = normalize(upload.clone()).unwrap();
        assert_eq!(out, upload);
    }

    #[test]
    fn test_heic_converted_to_jpeg() {
        let upload = ImageUpload::new(
            png_bytes(),
            Some("photo.heic".to_string()),
            Some("image/heic".to_string()),
        );

        let out = normalize(upload).unwrap();
        assert_eq!(out.filename.as_deref(), Some("photo.jpg"));
        assert_eq!(out.content_type.as_deref(), Some("image/jpeg"));

        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_extension_alone_triggers_conversion() {
        let upload = ImageUpload::new(
            png_bytes(),
            Some("IMG_0001.HEIF".to_string()),
            Some("application/octet-stream".to_string()),
        );

        let out = normalize(upload).unwrap();
        assert_eq!(out.filename.as_deref(), Some("IMG_0001.jpg"));
        assert_eq!(out.content_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_content_type_without_filename() {
        let upload = ImageUpload::new(png_bytes(), None, Some("image/heif".to_string()));

        let out = normalize(upload).unwrap();
        assert_eq!(out.filename.as_deref(), Some("upload.jpg"));
    }

    #[test]
    fn test_undecodable_difficult_image_is_invalid() {
        let upload = ImageUpload::new(
            Bytes::from_static(b"\x00\x00\x00\x18ftypheic garbage"),
            Some("broken.heic".to_string()),
            Some("image/heic".to_string()),
        );

        let err = normalize(upload).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn test_async_normalize_matches_sync() {
        let upload = ImageUpload::new(
            png_bytes(),
            Some("selfie.heic".to_string()),
            Some("image/heic".to_string()),
        );

        let out = normalize_upload(upload).await.unwrap();
        assert_eq!(out.filename.as_deref(), Some("selfie.jpg"));
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Jpeg);
    }
}
