//! Fixed-size character chunking of fetched page text.

/// Split `text` into consecutive slices of at most `chunk_size` characters.
///
/// Sizes count `char`s, not bytes or tokens, so slices always fall on
/// UTF-8 boundaries. Empty or whitespace-only text yields no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<&str> {
    if text.trim().is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);

    tracing::debug!(
        "Chunked {} chars into {} chunks (size: {})",
        text.chars().count(),
        chunks.len(),
        chunk_size
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_exact_multiple() {
        let text = "a".repeat(300);
        let chunks = chunk_text(&text, 100);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 100));
    }

    #[test]
    fn test_chunk_text_remainder() {
        let chunks = chunk_text("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_chunk_text_shorter_than_size() {
        assert_eq!(chunk_text("short page", 8000), vec!["short page"]);
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text(" \n\t ", 100).is_empty());
    }

    #[test]
    fn test_chunk_text_counts_chars_not_bytes() {
        let chunks = chunk_text("éééé", 2);
        assert_eq!(chunks, vec!["éé", "éé"]);
    }

    #[test]
    fn test_chunks_reassemble_to_input() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(7);
        assert_eq!(chunk_text(&text, 13).concat(), text);
    }
}
