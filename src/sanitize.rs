//! Filesystem-safe file names.

/// Longest name [`sanitize_filename`] will return, in characters.
pub const MAX_FILENAME_CHARS: usize = 200;

/// Returned when nothing usable is left of the input.
pub const FALLBACK_FILENAME: &str = "unnamed";

const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Map an arbitrary display name to a file name that is legal on both
/// Windows and Unix.
///
/// Illegal characters, control characters and whitespace become `-`, runs of
/// `-` collapse to one, leading/trailing dots and hyphens are stripped and the
/// result is capped at [`MAX_FILENAME_CHARS`]. Never returns an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if ILLEGAL.contains(&c) || c.is_control() || c.is_whitespace() {
            '-'
        } else {
            c
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    let trimmed = trim_edges(&out);
    let truncated: String = trimmed.chars().take(MAX_FILENAME_CHARS).collect();
    // Truncation can expose a trailing dot again.
    let result = trim_edges(&truncated);

    if result.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        result.to_string()
    }
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c| c == '.' || c == '-')
}
