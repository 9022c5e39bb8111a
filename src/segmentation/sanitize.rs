//! Cell-safe text cleaning
//!
//! Every extracted value passes through [`sanitize`] before it is stored, so
//! checkpoints can be opened in a spreadsheet without formula injection or
//! stray control characters breaking rows.

use regex::Regex;
use std::sync::LazyLock;

use crate::utils::{MAX_FIELD_CHARS, safe_truncate_chars};

/// Marker prepended to values a spreadsheet would evaluate.
pub const ESCAPE_MARKER: char = '\'';

/// Leading characters that make a spreadsheet treat a cell as a formula.
const FORMULA_LEADERS: [char; 5] = ['=', '+', '-', '@', '('];

static EMBEDDED_FORMULA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=\w+\(|=\w+[+\-/*]|@\w+\(").expect("EMBEDDED_FORMULA: hardcoded regex is valid")
});

/// Clean one extracted value.
///
/// In order: drop C0/C1 control characters and the invisible separators
/// U+2028, U+2029 and U+FEFF; fold smart dashes and quotes to ASCII; drop
/// square and curly brackets; prefix [`ESCAPE_MARKER`] when the value starts
/// with a formula character or embeds a formula call; cut to
/// [`MAX_FIELD_CHARS`] characters.
///
/// `sanitize(&sanitize(x)) == sanitize(x)` holds for every input: none of the
/// removed or folded characters can be produced by the later steps, and a
/// value already led by the marker is never escaped again.
///
/// # Examples
/// ```
/// # use listing_harvest::segmentation::sanitize;
/// assert_eq!(sanitize("=SUM(A1:A3)"), "'=SUM(A1:A3)");
/// assert_eq!(sanitize("“台北市”\u{2028}"), "\"台北市\"");
/// assert_eq!(sanitize(&sanitize("-5年")), "'-5年");
/// ```
#[must_use]
pub fn sanitize(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}' => {}
            '\u{2028}' | '\u{2029}' | '\u{FEFF}' => {}
            '[' | ']' | '{' | '}' => {}
            '\u{2013}' | '\u{2014}' => cleaned.push('-'),
            '\u{2018}' | '\u{2019}' => cleaned.push('\''),
            '\u{201C}' | '\u{201D}' => cleaned.push('"'),
            other => cleaned.push(other),
        }
    }

    if needs_escape(&cleaned) {
        cleaned.insert(0, ESCAPE_MARKER);
    }

    match cleaned.char_indices().nth(MAX_FIELD_CHARS) {
        Some(_) => safe_truncate_chars(&cleaned, MAX_FIELD_CHARS).to_string(),
        None => cleaned,
    }
}

/// Sanitize an optional field, keeping `None` as `None`.
#[must_use]
pub fn sanitize_opt(input: Option<&str>) -> Option<String> {
    input.map(sanitize)
}

fn needs_escape(text: &str) -> bool {
    match text.chars().next() {
        None | Some(ESCAPE_MARKER) => false,
        Some(first) if FORMULA_LEADERS.contains(&first) => true,
        Some(_) => EMBEDDED_FORMULA.is_match(text),
    }
}
