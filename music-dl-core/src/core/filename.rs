use regex::Regex;
use std::sync::LazyLock;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const ALLOWED_PUNCTUATION: &[char] = &[' ', '-', '_', '.', ',', '(', ')'];

/// Maps a metadata string onto the `[A-Za-z0-9 \-_.,()]` filename alphabet.
///
/// Disallowed characters become `_`, whitespace runs collapse to a single
/// space and the result is trimmed.
pub fn sanitize_filename(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(&c) {
                c
            } else {
                '_'
            }
        })
        .collect();

    WS_RE.replace_all(&mapped, " ").trim().to_string()
}

pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(&c)
}
