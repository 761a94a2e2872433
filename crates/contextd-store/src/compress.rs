//! Head-and-tail truncation of long content before embedding.

use std::borrow::Cow;

/// Default compression threshold in characters.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1000;

/// Inserted between the kept head and tail.
pub const TRUNCATION_MARKER: &str = "\n... [content truncated] ...\n";

/// Returns the text to embed for `content`.
///
/// Content longer than `threshold` characters is reduced to its first and
/// last `threshold / 2` characters joined by [`TRUNCATION_MARKER`]. Shorter
/// content is returned unchanged.
pub fn compress_for_embedding(content: &str, threshold: usize) -> Cow<'_, str> {
    let length = content.chars().count();
    if length <= threshold {
        return Cow::Borrowed(content);
    }

    let half = threshold / 2;
    let head_end = content
        .char_indices()
        .nth(half)
        .map(|(i, _)| i)
        .unwrap_or(content.len());
    let tail_start = content
        .char_indices()
        .nth(length - half)
        .map(|(i, _)| i)
        .unwrap_or(content.len());

    Cow::Owned(format!(
        "{}{}{}",
        &content[..head_end],
        TRUNCATION_MARKER,
        &content[tail_start..]
    ))
}
