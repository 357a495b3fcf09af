//! Plaintext framing.
//!
//! The upstream encoder can leave non-JSON bytes before the first `{` and
//! after the last `}`. These helpers isolate the JSON object and decide
//! whether a decrypted text plausibly came from the right key.

/// Slice from the first `{` to the last `}` inclusive.
pub fn strip_framing(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    // Both delimiters are ASCII, so these are char boundaries.
    Some(&text[start..=end])
}

/// Structural sniff: a `{...}` span exists and holds no control characters
/// other than whitespace. Framing outside the span is ignored.
pub fn looks_like_json_object(text: &str) -> bool {
    match strip_framing(text) {
        Some(span) => span.chars().all(|c| !c.is_control() || c.is_whitespace()),
        None => false,
    }
}
