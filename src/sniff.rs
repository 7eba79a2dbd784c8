//! Content type detection from leading bytes. Only used for log output.

/// Number of leading bytes inspected.
pub const SNIFF_LEN: usize = 512;

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"-----BEGIN ", "application/x-pem-file"),
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x30\x82", "application/pkix-cert"),
    (b"{", "application/json"),
    (b"<?xml", "text/xml; charset=utf-8"),
];

/// Guesses a MIME type for `content`, looking at no more than [SNIFF_LEN]
/// bytes. Unknown leading bytes fall back to the extension of `file_name`,
/// then to `text/plain` for printable UTF-8 and `application/octet-stream`.
pub fn content_type(file_name: &str, content: &[u8]) -> &'static str {
    let head = &content[..content.len().min(SNIFF_LEN)];
    let trimmed = trim_leading_whitespace(head);
    let matched = SIGNATURES.iter().find(|(sig, _)| {
        // binary signatures must match at offset zero
        let data = if sig[0].is_ascii_graphic() { trimmed } else { head };
        data.starts_with(sig)
    });
    if let Some(&(_, mime)) = matched {
        return mime;
    }
    if let Some(mime) = mime_guess::from_path(file_name).first_raw() {
        return mime;
    }
    if looks_like_text(head) {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    &data[start..]
}

fn looks_like_text(data: &[u8]) -> bool {
    let text = match std::str::from_utf8(data) {
        Ok(text) => text,
        // a multi-byte sequence cut at the sniff boundary
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&data[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
        Err(_) => return false,
    };
    text.chars()
        .all(|c| !c.is_control() || c.is_ascii_whitespace())
}
