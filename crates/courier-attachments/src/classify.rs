//! Content classification from actual bytes.
//!
//! The caller-asserted MIME string is never trusted for classification; the
//! sniffer looks at magic numbers and container structure.  Classification
//! fails open: anything unrecognized or corrupt degrades to
//! [`ContentType::Invalid`] or [`ContentType::File`] instead of aborting the
//! pipeline.

use image::GenericImageView;
use serde::{Deserialize, Serialize};
use tracing::debug;

use courier_shared::constants::{
    BLURHASH_COMPONENTS_X, BLURHASH_COMPONENTS_Y, BLURHASH_MAX_EDGE,
};

/// Resolved content classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentType {
    /// A raster image that decoded successfully.  The blurhash is omitted
    /// when the frame is too degenerate to summarize.
    Image { blurhash: Option<String> },
    Video,
    Audio,
    /// Recognized (or at least plausible) non-media content.
    File,
    /// Content that claimed to be visual but is not, or a sniffed image
    /// that failed to decode.  Still produces a usable attachment.
    Invalid,
}

impl ContentType {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentType::Image { .. } => "image",
            ContentType::Video => "video",
            ContentType::Audio => "audio",
            ContentType::File => "file",
            ContentType::Invalid => "invalid",
        }
    }

    /// Image and video attachments can be thumbnailed; nothing else can.
    pub fn is_visual(&self) -> bool {
        matches!(self, ContentType::Image { .. } | ContentType::Video)
    }
}

/// Broad category detected from magic numbers alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SniffedKind {
    Image,
    Video,
    Audio,
    Other,
}

/// Sniff the leading bytes of a plaintext stream.
pub(crate) fn sniff(head: &[u8]) -> SniffedKind {
    match infer::get(head) {
        Some(kind) => match kind.matcher_type() {
            infer::MatcherType::Image => SniffedKind::Image,
            infer::MatcherType::Video => SniffedKind::Video,
            infer::MatcherType::Audio => SniffedKind::Audio,
            _ => SniffedKind::Other,
        },
        None => SniffedKind::Other,
    }
}

/// Whether the caller asserted a visual MIME type.  Used as the tie-break
/// for unrecognized bytes: declared-visual content that does not sniff as
/// visual is `Invalid` rather than a generic file.
pub(crate) fn asserted_visual(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
        || mime_type.starts_with("video/")
        || mime_type.starts_with("audio/")
}

/// Classify content whose magic numbers did not match any visual format.
pub(crate) fn classify_non_visual(mime_type: &str) -> ContentType {
    if asserted_visual(mime_type) {
        debug!(mime_type, "declared visual content did not sniff as visual");
        ContentType::Invalid
    } else {
        ContentType::File
    }
}

/// Classify content that sniffed as an image, given the full plaintext.
///
/// A decode failure means the payload cannot be rendered and degrades to
/// `Invalid`; it is never an error.
pub(crate) fn classify_image(bytes: &[u8]) -> ContentType {
    match image::load_from_memory(bytes) {
        Ok(img) => ContentType::Image {
            blurhash: blurhash_summary(&img),
        },
        Err(e) => {
            debug!(error = %e, "sniffed image failed to decode");
            ContentType::Invalid
        }
    }
}

/// Compact visual summary of a decoded frame, for placeholder rendering.
///
/// Encodes a downscaled copy so cost stays bounded by the frame's pixel
/// dimensions, not the source byte size.
pub(crate) fn blurhash_summary(img: &image::DynamicImage) -> Option<String> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let small = img.thumbnail(BLURHASH_MAX_EDGE, BLURHASH_MAX_EDGE);
    let rgba = small.to_rgba8();
    let (sw, sh) = rgba.dimensions();

    blurhash::encode(
        BLURHASH_COMPONENTS_X,
        BLURHASH_COMPONENTS_Y,
        sw,
        sh,
        rgba.as_raw(),
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_png(width: u32, height: u32) -> Vec<u8> {
        use image::{ImageBuffer, Rgb};
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 31 % 256) as u8, (y * 17 % 256) as u8, 128])
        });
        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_sniff_png() {
        assert_eq!(sniff(&test_png(16, 16)), SniffedKind::Image);
    }

    #[test]
    fn test_sniff_wav() {
        // Minimal RIFF/WAVE header.
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&36u32.to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        assert_eq!(sniff(&wav), SniffedKind::Audio);
    }

    #[test]
    fn test_sniff_unrecognized() {
        assert_eq!(sniff(b"plain old text, nothing magic"), SniffedKind::Other);
        assert_eq!(sniff(b""), SniffedKind::Other);
    }

    #[test]
    fn test_classify_image_with_blurhash() {
        match classify_image(&test_png(32, 24)) {
            ContentType::Image { blurhash } => {
                assert!(blurhash.is_some());
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_image_is_invalid() {
        let mut png = test_png(16, 16);
        // Keep the magic bytes, destroy the body.
        for b in png.iter_mut().skip(16) {
            *b = 0;
        }
        assert_eq!(classify_image(&png), ContentType::Invalid);
    }

    #[test]
    fn test_non_visual_tie_break() {
        assert_eq!(classify_non_visual("image/png"), ContentType::Invalid);
        assert_eq!(classify_non_visual("application/pdf"), ContentType::File);
        assert_eq!(classify_non_visual("text/plain"), ContentType::File);
    }

    #[test]
    fn test_visual_kinds() {
        assert!(ContentType::Image { blurhash: None }.is_visual());
        assert!(ContentType::Video.is_visual());
        assert!(!ContentType::Audio.is_visual());
        assert!(!ContentType::File.is_visual());
        assert!(!ContentType::Invalid.is_visual());
    }
}
