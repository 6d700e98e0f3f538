//! Filename resolution and cross-platform sanitization
//!
//! When a caller does not name the file, the name comes from the response's
//! `Content-Disposition` header (RFC 5987/2231 extended form first, then
//! quoted, then unquoted) and falls back to the last URL path segment.
//! Whatever name ends up in use is sanitized before it touches the
//! filesystem, so Windows, Linux and macOS all accept it.

/// Name used when nothing usable survives resolution or sanitization.
pub const FALLBACK_FILENAME: &str = "downloaded_file";

/// Characters rejected by at least one supported filesystem, plus the two
/// path separators.
const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Cap below the usual 255-byte filesystem limit, leaving room for the
/// `.tmp` suffix the transfer appends.
const MAX_FILENAME_LEN: usize = 200;

/// Resolve a filename from the `Content-Disposition` header, falling back to
/// the final URL path segment with its query string stripped.
pub fn extract_filename(content_disposition: Option<&str>, url: &str) -> String {
    if let Some(header) = content_disposition {
        // RFC 5987/2231 extended form: filename*=UTF-8''percent-encoded
        if let Some(value) = disposition_param(header, "filename*") {
            let encoded = value
                .rsplit_once('\'')
                .map(|(_, v)| v)
                .unwrap_or(value.as_str());
            let name = urlencoding::decode(encoded)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| encoded.to_string());
            if !name.is_empty() {
                log::info!("Resolved filename from extended Content-Disposition: {}", name);
                return name;
            }
        }

        // Quoted or bare filename=...
        if let Some(value) = disposition_param(header, "filename") {
            let name = value.trim_matches(|c| c == '"' || c == '\'');
            if !name.is_empty() {
                log::info!("Resolved filename from Content-Disposition: {}", name);
                return name.to_string();
            }
        }
    }

    let name = url
        .rsplit('/')
        .next()
        .unwrap_or("")
        .split('?')
        .next()
        .unwrap_or("");

    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        log::info!("Resolved filename from URL: {}", name);
        name.to_string()
    }
}

/// Make a filename safe for the local filesystem.
///
/// Decoding happens before the directory strip so an encoded separator
/// cannot smuggle a path component through. Applies to caller-supplied and
/// header-resolved names alike.
pub fn sanitize_filename(filename: &str) -> String {
    let decoded = urlencoding::decode(filename)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| filename.to_string());

    // Base name only, on either separator
    let base = decoded.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .filter(|c| *c as u32 >= 32)
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();

    // Windows rejects trailing dots and spaces
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c == ' ');

    if trimmed.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    if trimmed.chars().count() > MAX_FILENAME_LEN {
        truncate_preserving_extension(trimmed, MAX_FILENAME_LEN)
    } else {
        trimmed.to_string()
    }
}

fn truncate_preserving_extension(name: &str, max_len: usize) -> String {
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    };

    let ext_len = ext.chars().count();
    if ext_len >= max_len {
        return name.chars().take(max_len).collect();
    }

    let mut out: String = stem.chars().take(max_len - ext_len).collect();
    out.push_str(ext);
    out
}

/// Case-insensitive lookup of one `key=value` parameter in a
/// semicolon-separated header value. Semicolons inside a quoted value do
/// not end the parameter.
fn disposition_param(header: &str, key: &str) -> Option<String> {
    for part in split_params(header) {
        if let Some((k, v)) = part.trim().split_once('=') {
            if k.trim().eq_ignore_ascii_case(key) {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

/// Split a header value on semicolons that are outside quoted spans.
fn split_params(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;

    for (i, c) in header.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ';' => {
                parts.push(&header[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }

    parts.push(&header[start..]);
    parts
}
