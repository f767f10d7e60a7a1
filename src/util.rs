//! Small string helpers shared by the protocol and the index.

/// Truncate `s` to at most `max_bytes`, backing off to a UTF-8 boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Owned variant of [`truncate_str`].
pub fn truncate_string(mut s: String, max_bytes: usize) -> String {
    let len = truncate_str(&s, max_bytes).len();
    s.truncate(len);
    s
}
