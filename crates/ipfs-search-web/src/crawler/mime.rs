//! Media type detection from the first bytes of an object

/// Bytes fetched to detect an object's type
pub const HEAD_BYTES: usize = 128;

const OCTET_STREAM: &str = "application/octet-stream";

/// Leading byte signatures of common binary formats
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"ID3", "audio/mpeg"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (b"\x1a\x45\xdf\xa3", "video/webm"),
];

/// Detects the media type of an object
///
/// Content signatures win over the file name; the file name is consulted for
/// everything else before falling back to a text check.
pub fn sniff(head: &[u8], filename: &str) -> String {
    if let Some((_, mime)) = SIGNATURES.iter().find(|(sig, _)| head.starts_with(sig)) {
        return mime.to_string();
    }

    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return "video/mp4".to_string();
    }

    if head.len() >= 12 && head.starts_with(b"RIFF") {
        match &head[8..12] {
            b"WEBP" => return "image/webp".to_string(),
            b"WAVE" => return "audio/wav".to_string(),
            b"AVI " => return "video/x-msvideo".to_string(),
            _ => {}
        }
    }

    if !filename.is_empty() {
        if let Some(mime) = mime_guess::from_path(filename).first_raw() {
            return mime.to_string();
        }
    }

    if !is_text(head) {
        return OCTET_STREAM.to_string();
    }

    if is_html(head) {
        "text/html".to_string()
    } else {
        "text/plain".to_string()
    }
}

/// UTF-8 without NUL bytes; a character cut off at the end still counts
fn is_text(head: &[u8]) -> bool {
    if head.is_empty() || head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none(),
    }
}

fn is_html(head: &[u8]) -> bool {
    let text = String::from_utf8_lossy(head).to_ascii_lowercase();
    let text = text.trim_start();
    text.starts_with("<!doctype html") || text.starts_with("<html") || text.contains("<head")
}
