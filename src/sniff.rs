//! Content classification by magic numbers.
//!
//! Filename extensions and client-declared content types are trivially
//! spoofable, so acceptance decisions are made from the leading bytes of
//! the content itself.

use serde::{Deserialize, Serialize};

/// How many leading bytes classification may inspect
pub const SNIFF_WINDOW: usize = 512;

/// Media types the sniffer can recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Jpeg,
    Png,
    Webp,
    Gif,
    Pdf,
    /// Anything the magic-number table does not recognize
    Unknown,
}

impl MediaType {
    /// Canonical MIME string for this media type
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Webp => "image/webp",
            MediaType::Gif => "image/gif",
            MediaType::Pdf => "application/pdf",
            MediaType::Unknown => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime())
    }
}

/// Classify content from its leading bytes.
///
/// Pure function of the bytes given, up to [`SNIFF_WINDOW`]. Input shorter
/// than any signature simply fails to match that signature; short input is
/// never an error.
pub fn classify(head: &[u8]) -> MediaType {
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return MediaType::Jpeg;
    }
    if head.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return MediaType::Png;
    }
    // RIFF container with a WEBP fourcc at offset 8
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return MediaType::Webp;
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return MediaType::Gif;
    }
    if head.starts_with(b"%PDF-") {
        return MediaType::Pdf;
    }
    MediaType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEAD: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    #[test]
    fn classifies_known_signatures() {
        assert_eq!(classify(&[0xFF, 0xD8, 0xFF, 0xE0]), MediaType::Jpeg);
        assert_eq!(classify(PNG_HEAD), MediaType::Png);
        assert_eq!(classify(b"RIFF\x24\x00\x00\x00WEBPVP8 "), MediaType::Webp);
        assert_eq!(classify(b"GIF89a\x01\x00"), MediaType::Gif);
        assert_eq!(classify(b"%PDF-1.7\n"), MediaType::Pdf);
        assert_eq!(classify(b"hello world"), MediaType::Unknown);
    }

    #[test]
    fn classification_is_content_only() {
        // The same bytes classify identically no matter what a filename
        // claims; classification never sees the name at all.
        let verdict = classify(PNG_HEAD);
        for _claimed in ["photo.png", "photo.txt", "photo"] {
            assert_eq!(classify(PNG_HEAD), verdict);
        }
    }

    #[test]
    fn short_input_is_classifiable() {
        assert_eq!(classify(&[]), MediaType::Unknown);
        assert_eq!(classify(&[0xFF]), MediaType::Unknown);
        assert_eq!(classify(b"%PDF-"), MediaType::Pdf);
    }

    #[test]
    fn truncated_riff_is_not_webp() {
        assert_eq!(classify(b"RIFF\x24\x00"), MediaType::Unknown);
    }
}
