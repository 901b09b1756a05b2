//! Thumbnail generation.
//!
//! Every media item gets a 400x300 WebP thumbnail. Raster images are decoded
//! and cover-cropped server side; videos supply a client-extracted frame as a
//! base64 data URL which is normalized through the same pipeline; PDF and SVG
//! get a flat placeholder card.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

pub const THUMBNAIL_WIDTH: u32 = 400;
pub const THUMBNAIL_HEIGHT: u32 = 300;
const WEBP_QUALITY: f32 = 80.0;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid thumbnail data URL")]
    InvalidDataUrl,

    #[error("Thumbnail task failed: {0}")]
    Task(String),
}

/// Generate a cover-cropped WebP thumbnail from raster image bytes.
///
/// Decoding and encoding are CPU-bound; both run off the async pool.
pub async fn generate_thumbnail(data: Vec<u8>) -> Result<Vec<u8>, ThumbnailError> {
    let start = std::time::Instant::now();

    let thumbnail = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ThumbnailError> {
        let img = image::load_from_memory(&data).map_err(|e| ThumbnailError::Decode(e.to_string()))?;
        Ok(encode_webp(&img))
    })
    .await
    .map_err(|e| ThumbnailError::Task(e.to_string()))??;

    tracing::debug!(
        size_bytes = thumbnail.len(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Thumbnail generated"
    );

    Ok(thumbnail)
}

/// Generate a thumbnail from a `data:image/*;base64,` URL.
///
/// Used for video uploads, where the client extracts a representative frame.
/// The decoded frame is re-encoded server side so client bytes never land in
/// storage as-is.
pub async fn thumbnail_from_data_url(data_url: &str) -> Result<Vec<u8>, ThumbnailError> {
    let payload = decode_data_url(data_url)?;
    generate_thumbnail(payload).await
}

/// Flat placeholder card for formats we do not rasterize (PDF, SVG).
pub fn placeholder_thumbnail(label: &str) -> Vec<u8> {
    let color = match label {
        "pdf" => image::Rgba([190, 60, 60, 255]),
        "svg" => image::Rgba([60, 110, 190, 255]),
        _ => image::Rgba([115, 115, 125, 255]),
    };

    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        THUMBNAIL_WIDTH,
        THUMBNAIL_HEIGHT,
        color,
    ));

    encode_webp(&img)
}

fn encode_webp(img: &DynamicImage) -> Vec<u8> {
    // resize_to_fill scales to cover the target box and center-crops.
    let resized = img.resize_to_fill(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Lanczos3);
    let (width, height) = (resized.width(), resized.height());
    let rgba = resized.to_rgba8();

    let encoder = webp::Encoder::from_rgba(&rgba, width, height);
    encoder.encode(WEBP_QUALITY).to_vec()
}

/// Decode a `data:image/*;base64,` URL into raw bytes.
fn decode_data_url(data_url: &str) -> Result<Vec<u8>, ThumbnailError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(ThumbnailError::InvalidDataUrl)?;
    let (media_type, payload) = rest
        .split_once(";base64,")
        .ok_or(ThumbnailError::InvalidDataUrl)?;

    if !media_type.starts_with("image/") {
        return Err(ThumbnailError::InvalidDataUrl);
    }

    BASE64
        .decode(payload)
        .map_err(|_| ThumbnailError::InvalidDataUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn test_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([10, 200, 30, 255]),
        ));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn thumbnail_is_cover_cropped_webp() {
        let thumbnail = generate_thumbnail(test_png(800, 800)).await.unwrap();

        assert_eq!(&thumbnail[0..4], b"RIFF");
        assert_eq!(&thumbnail[8..12], b"WEBP");

        let decoded = image::load_from_memory(&thumbnail).unwrap();
        assert_eq!(decoded.width(), THUMBNAIL_WIDTH);
        assert_eq!(decoded.height(), THUMBNAIL_HEIGHT);
    }

    #[tokio::test]
    async fn small_images_are_upscaled_to_target() {
        let thumbnail = generate_thumbnail(test_png(20, 10)).await.unwrap();
        let decoded = image::load_from_memory(&thumbnail).unwrap();
        assert_eq!(decoded.width(), THUMBNAIL_WIDTH);
        assert_eq!(decoded.height(), THUMBNAIL_HEIGHT);
    }

    #[tokio::test]
    async fn garbage_bytes_fail_to_decode() {
        let result = generate_thumbnail(vec![0x00, 0x01, 0x02, 0x03]).await;
        assert!(matches!(result, Err(ThumbnailError::Decode(_))));
    }

    #[tokio::test]
    async fn data_url_roundtrip() {
        let png = test_png(640, 480);
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(&png));

        let thumbnail = thumbnail_from_data_url(&data_url).await.unwrap();
        let decoded = image::load_from_memory(&thumbnail).unwrap();
        assert_eq!(decoded.width(), THUMBNAIL_WIDTH);
        assert_eq!(decoded.height(), THUMBNAIL_HEIGHT);
    }

    #[tokio::test]
    async fn malformed_data_urls_rejected() {
        for url in [
            "not-a-data-url",
            "data:image/png,rawpayload",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png;base64,!!!not-base64!!!",
        ] {
            let result = thumbnail_from_data_url(url).await;
            assert!(
                matches!(result, Err(ThumbnailError::InvalidDataUrl)),
                "url {url:?}"
            );
        }
    }

    #[test]
    fn placeholder_dimensions() {
        let card = placeholder_thumbnail("pdf");
        let decoded = image::load_from_memory(&card).unwrap();
        assert_eq!(decoded.width(), THUMBNAIL_WIDTH);
        assert_eq!(decoded.height(), THUMBNAIL_HEIGHT);
    }

    #[test]
    fn placeholder_labels_get_distinct_colors() {
        assert_ne!(placeholder_thumbnail("pdf"), placeholder_thumbnail("svg"));
    }
}
