//! Extraction of `<tag>value</tag>` fields from free-form model output.
//!
//! The first opening marker wins, then the first closing marker after it.
//! Nested tags are not recognised.

/// Return the text strictly between the first `<tag>` and the first
/// `</tag>` that follows it.
///
/// Returns `None` when either marker is missing or they appear in the wrong
/// order. Never panics on malformed input.
///
/// # Example
/// ```
/// use ask_llm::extract_tag;
///
/// assert_eq!(extract_tag("a<tag>B</tag>c", "tag"), Some("B"));
/// assert_eq!(extract_tag("no tags here", "tag"), None);
/// ```
pub fn extract_tag<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;

    Some(&text[start..end])
}
