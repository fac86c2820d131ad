//! Charset sniffing for page snapshots.
//!
//! Hosts hand over snapshots as raw bytes (saved pages, serialized frames).
//! The declared charset is taken from the first `<meta>` declaration found in
//! the leading bytes and the snapshot is decoded to UTF-8 before parsing.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// How far into the snapshot a charset declaration is searched for.
const SNIFF_WINDOW: usize = 2048;

/// `<meta charset=...>` or `<meta http-equiv="Content-Type" content="...; charset=...">`
#[allow(clippy::expect_used)]
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+?charset\s*=\s*["']?([A-Za-z0-9_:.-]+)"#).expect("META_CHARSET regex")
});

/// Detect the declared character encoding of a snapshot, defaulting to UTF-8.
///
/// A UTF-8 byte order mark wins over any declaration.
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return UTF_8;
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_WINDOW)]);
    META_CHARSET
        .captures(&head)
        .and_then(|c| c.get(1))
        .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
        .unwrap_or(UTF_8)
}

/// Decode snapshot bytes to a UTF-8 string.
///
/// Invalid sequences are replaced with U+FFFD rather than failing the scan.
///
/// # Examples
///
/// ```
/// use artifact_sync::encoding::decode_snapshot;
///
/// let page = decode_snapshot(b"<html><body><pre>let x = 1;</pre></body></html>");
/// assert!(page.contains("let x = 1;"));
/// ```
#[must_use]
pub fn decode_snapshot(bytes: &[u8]) -> String {
    let encoding = detect_encoding(bytes);
    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "snapshot contained invalid byte sequences");
    }
    decoded.into_owned()
}
