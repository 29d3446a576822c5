//! Character-based windows over UTF-8 text
//!
//! Match offsets are byte offsets from `regex`; every window here is
//! measured in characters and always lands on char boundaries.

/// Byte offset `n` characters before `start`, clipped to 0
pub fn back_chars(text: &str, start: usize, n: usize) -> usize {
    if n == 0 {
        return start;
    }
    text[..start]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset `n` characters after `end`, clipped to the text length
pub fn forward_chars(text: &str, end: usize, n: usize) -> usize {
    text[end..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len())
}

/// Up to `n` characters immediately before `start`
pub fn before(text: &str, start: usize, n: usize) -> &str {
    &text[back_chars(text, start, n)..start]
}

/// Up to `n` characters immediately after `end`
pub fn after(text: &str, end: usize, n: usize) -> &str {
    &text[end..forward_chars(text, end, n)]
}

/// `radius` characters on each side of `start..end`, clipped to the text
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    &text[back_chars(text, start, radius)..forward_chars(text, end, radius)]
}
