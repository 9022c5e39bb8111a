//! UTF-8-safe string helpers
//!
//! Extracted listing text is almost entirely multi-byte (CJK), so every cut
//! must land on a character boundary.

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// Never panics on multi-byte input.
///
/// # Examples
/// ```
/// # use listing_harvest::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("希望工作地台北市", 5), "希望工作地");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Collapse runs of whitespace (including newlines from rendered markup)
/// into single spaces and trim the ends.
///
/// Card text flattened by `innerText` keeps layout line breaks; anchors are
/// searched on the collapsed form so that `希望工作地\n:\n台北市` and
/// `希望工作地: 台北市` segment identically.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Build a filesystem-safe file stem for a saved asset.
///
/// Replaces the characters Windows rejects (`<>:"/\|?*`) and spaces with
/// underscores, then runs `sanitize_filename` for reserved names and
/// control characters. Falls back to `fallback` when nothing usable remains.
#[must_use]
pub fn asset_file_stem(name: Option<&str>, fallback: &str) -> String {
    let raw = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(fallback);
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | ' ' => '_',
            other => other,
        })
        .collect();
    let cleaned = sanitize_filename::sanitize(safe_truncate_chars(&replaced, 64));
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}
