/// Splits text into fixed-size contiguous chunks, measured in characters.
///
/// No overlap; the last chunk may be shorter. Empty text yields zero chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == chunk_size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_ceil_l_over_c_chunks() {
        let text = "a".repeat(2500);

        let chunks = chunk_text(&text, 1000);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.iter().map(String::len).collect::<Vec<_>>(), vec![1000, 1000, 500]);
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let text = "b".repeat(2000);

        let chunks = chunk_text(&text, 1000);

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 1000));
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("hello", 1000);

        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn empty_text_yields_zero_chunks() {
        assert!(chunk_text("", 1000).is_empty());
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Four multi-byte characters, chunk size two characters.
        let chunks = chunk_text("éééé", 2);

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() == 2));
    }

    #[test]
    fn reassembly_round_trips() {
        let text = "The quick brown fox jumps over the lazy dog".repeat(40);

        let chunks = chunk_text(&text, 100);

        assert_eq!(chunks.concat(), text);
    }
}
