//! Media type detection from leading signature bytes.

/// Media formats expected in a download bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Jpeg,
    Png,
    Gif,
    WebP,
    Mp4,
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

impl MediaKind {
    /// Identify `data` by its signature, if it is one of the known kinds.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(MediaKind::Jpeg);
        }
        if data.starts_with(PNG_SIGNATURE) {
            return Some(MediaKind::Png);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(MediaKind::Gif);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(MediaKind::WebP);
        }
        // ISO base media: box size, then the "ftyp" box type
        if data.len() >= 8 && &data[4..8] == b"ftyp" {
            return Some(MediaKind::Mp4);
        }
        None
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Png => "image/png",
            MediaKind::Gif => "image/gif",
            MediaKind::WebP => "image/webp",
            MediaKind::Mp4 => "video/mp4",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_images() {
        assert_eq!(MediaKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]), Some(MediaKind::Jpeg));
        assert_eq!(MediaKind::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), Some(MediaKind::Png));
        assert_eq!(MediaKind::sniff(b"GIF89a\x01\x00"), Some(MediaKind::Gif));
        assert_eq!(MediaKind::sniff(b"RIFF\x24\0\0\0WEBPVP8 "), Some(MediaKind::WebP));
    }

    #[test]
    fn test_sniff_video() {
        assert_eq!(MediaKind::sniff(b"\0\0\0\x20ftypisom\0\0\x02\0"), Some(MediaKind::Mp4));
    }

    #[test]
    fn test_sniff_rejects_other_data() {
        assert_eq!(MediaKind::sniff(b""), None);
        assert_eq!(MediaKind::sniff(b"hello world"), None);
        assert_eq!(MediaKind::sniff(&[0xFF, 0xD8]), None);
        assert_eq!(MediaKind::sniff(b"RIFF\0\0\0\0WAVE"), None);
    }

    #[test]
    fn test_metadata() {
        assert_eq!(MediaKind::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(MediaKind::Mp4.mime_type(), "video/mp4");
    }
}
