//! Content verification via magic bytes.
//!
//! Declared content types are never trusted; the first bytes of the uploaded
//! object decide what it really is. Container formats sharing the ISO BMFF
//! `ftyp` box (MP4, QuickTime, HEIC) are disambiguated by brand.
//!
//! Reference: https://en.wikipedia.org/wiki/List_of_file_signatures

/// How many leading bytes the verifier needs to make a decision.
pub const SNIFF_LENGTH: usize = 512;

/// Outcome of checking a buffer against a declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    /// What the bytes actually look like, when recognizable.
    pub detected: Option<&'static str>,
}

/// Formats that all start with an ISO BMFF `ftyp` box.
const CONTAINER_TYPES: [&str; 4] = [
    "video/mp4",
    "video/quicktime",
    "image/heic",
    "image/heif",
];

/// Major brand of the `ftyp` box, if the buffer starts with one.
fn ftyp_brand(buffer: &[u8]) -> Option<[u8; 4]> {
    if buffer.len() >= 12 && &buffer[4..8] == b"ftyp" {
        buffer[8..12].try_into().ok()
    } else {
        None
    }
}

/// Map a known `ftyp` major brand to its content type.
fn classify_brand(brand: [u8; 4]) -> Option<&'static str> {
    match &brand {
        b"isom" | b"iso2" | b"mp41" | b"mp42" | b"avc1" | b"M4V " => Some("video/mp4"),
        b"qt  " | b"moov" => Some("video/quicktime"),
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"mif1" | b"msf1" => Some("image/heic"),
        _ => None,
    }
}

fn is_webp(buffer: &[u8]) -> bool {
    buffer.len() >= 12 && &buffer[0..4] == b"RIFF" && &buffer[8..12] == b"WEBP"
}

/// SVG has no binary signature; probe the leading bytes as text.
fn looks_like_svg(buffer: &[u8]) -> bool {
    let probe_len = buffer.len().min(100);
    let text = String::from_utf8_lossy(&buffer[..probe_len]);
    text.contains("<svg") || (text.contains("<?xml") && text.contains("svg"))
}

/// Detect the content type of a buffer from its leading bytes.
pub fn detect_content_type(buffer: &[u8]) -> Option<&'static str> {
    if buffer.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if buffer.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if buffer.starts_with(b"GIF87a") || buffer.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if is_webp(buffer) {
        return Some("image/webp");
    }
    if buffer.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    // EBML header (WebM / Matroska)
    if buffer.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("video/webm");
    }
    if let Some(brand) = ftyp_brand(buffer) {
        return classify_brand(brand);
    }
    if looks_like_svg(buffer) {
        return Some("image/svg+xml");
    }
    None
}

/// Verify that a buffer's magic bytes match the declared content type.
///
/// An unrecognized buffer is always invalid; forged declared types fail with
/// the detected type reported so the caller can surface it.
pub fn verify_content_type(buffer: &[u8], declared_content_type: &str) -> Verification {
    let declared = declared_content_type.to_lowercase();

    if CONTAINER_TYPES.contains(&declared.as_str()) {
        if let Some(brand) = ftyp_brand(buffer) {
            if let Some(detected) = classify_brand(brand) {
                let valid = match detected {
                    "video/mp4" => declared == "video/mp4",
                    "video/quicktime" => declared == "video/quicktime",
                    "image/heic" => declared == "image/heic" || declared == "image/heif",
                    _ => false,
                };
                return Verification {
                    valid,
                    detected: Some(detected),
                };
            }

            // Unknown brand: tolerate for video containers only. Encoders
            // emit a long tail of brands we do not enumerate.
            if declared == "video/mp4" {
                return Verification {
                    valid: true,
                    detected: Some("video/mp4"),
                };
            }
            if declared == "video/quicktime" {
                return Verification {
                    valid: true,
                    detected: Some("video/quicktime"),
                };
            }
        }
    }

    if declared == "image/webp" && is_webp(buffer) {
        return Verification {
            valid: true,
            detected: Some("image/webp"),
        };
    }

    if declared == "image/svg+xml" && looks_like_svg(buffer) {
        return Verification {
            valid: true,
            detected: Some("image/svg+xml"),
        };
    }

    let detected = detect_content_type(buffer);
    Verification {
        valid: detected == Some(declared.as_str()),
        detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

    fn ftyp(brand: &[u8; 4]) -> Vec<u8> {
        let mut buf = vec![0x00, 0x00, 0x00, 0x18];
        buf.extend_from_slice(b"ftyp");
        buf.extend_from_slice(brand);
        buf.extend_from_slice(&[0x00; 8]);
        buf
    }

    #[test]
    fn jpeg_accepted_as_jpeg() {
        let v = verify_content_type(JPEG, "image/jpeg");
        assert!(v.valid);
        assert_eq!(v.detected, Some("image/jpeg"));
    }

    #[test]
    fn png_declared_as_jpeg_rejected_with_detection() {
        let v = verify_content_type(PNG, "image/jpeg");
        assert!(!v.valid);
        assert_eq!(v.detected, Some("image/png"));
    }

    #[test]
    fn declared_type_is_case_insensitive() {
        assert!(verify_content_type(PNG, "IMAGE/PNG").valid);
    }

    #[test]
    fn gif_variants() {
        assert!(verify_content_type(b"GIF87a.......", "image/gif").valid);
        assert!(verify_content_type(b"GIF89a.......", "image/gif").valid);
        assert!(!verify_content_type(b"GIF88a.......", "image/gif").valid);
    }

    #[test]
    fn webp_needs_riff_and_webp_markers() {
        let mut buf = b"RIFF\x24\x00\x00\x00WEBPVP8 ".to_vec();
        assert!(verify_content_type(&buf, "image/webp").valid);

        buf[8..12].copy_from_slice(b"WAVE");
        assert!(!verify_content_type(&buf, "image/webp").valid);
    }

    #[test]
    fn pdf_signature() {
        let v = verify_content_type(b"%PDF-1.7\n...", "application/pdf");
        assert!(v.valid);
        assert_eq!(v.detected, Some("application/pdf"));
    }

    #[test]
    fn webm_ebml_header() {
        let buf = [0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81];
        assert!(verify_content_type(&buf, "video/webm").valid);
    }

    #[test]
    fn svg_with_xml_declaration() {
        let buf = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        assert!(verify_content_type(buf, "image/svg+xml").valid);
    }

    #[test]
    fn svg_without_svg_tag_rejected() {
        let buf = br#"<?xml version="1.0"?><root></root>"#;
        assert!(!verify_content_type(buf, "image/svg+xml").valid);
    }

    #[test]
    fn mp4_brands() {
        for brand in [b"isom", b"iso2", b"mp41", b"mp42", b"avc1", b"M4V "] {
            let v = verify_content_type(&ftyp(brand), "video/mp4");
            assert!(v.valid, "brand {:?}", brand);
            assert_eq!(v.detected, Some("video/mp4"));
        }
    }

    #[test]
    fn quicktime_brand_rejected_as_mp4() {
        let v = verify_content_type(&ftyp(b"qt  "), "video/mp4");
        assert!(!v.valid);
        assert_eq!(v.detected, Some("video/quicktime"));
    }

    #[test]
    fn heic_brands_accepted_for_heic_and_heif() {
        for brand in [b"heic", b"heix", b"hevc", b"hevx", b"mif1", b"msf1"] {
            assert!(verify_content_type(&ftyp(brand), "image/heic").valid);
            assert!(verify_content_type(&ftyp(brand), "image/heif").valid);
        }
    }

    #[test]
    fn heic_brand_rejected_as_video() {
        assert!(!verify_content_type(&ftyp(b"heic"), "video/mp4").valid);
    }

    #[test]
    fn unknown_brand_tolerated_for_video_only() {
        let buf = ftyp(b"xxxx");
        assert!(verify_content_type(&buf, "video/mp4").valid);
        assert!(verify_content_type(&buf, "video/quicktime").valid);
        assert!(!verify_content_type(&buf, "image/heic").valid);
    }

    #[test]
    fn empty_and_short_buffers_rejected() {
        assert!(!verify_content_type(&[], "image/jpeg").valid);
        assert!(!verify_content_type(&[0xFF], "image/jpeg").valid);
    }

    #[test]
    fn unrecognized_bytes_have_no_detection() {
        let v = verify_content_type(&[0x00, 0x01, 0x02, 0x03], "image/jpeg");
        assert!(!v.valid);
        assert_eq!(v.detected, None);
    }
}
