/// Cut `text` to at most `max_chars` characters without splitting a code point
///
/// Returns the kept text and whether anything was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (text[..byte_index].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// The first `count` whitespace-separated words, with "..." when more followed
pub fn first_words(text: &str, count: usize) -> String {
    let mut words = text.split_whitespace();
    let kept = words.by_ref().take(count).collect::<Vec<_>>().join(" ");
    if !kept.is_empty() && words.next().is_some() {
        format!("{kept}...")
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), ("short".to_string(), false));
        assert_eq!(truncate_chars("exactly", 7), ("exactly".to_string(), false));
        assert_eq!(truncate_chars("truncate me", 8), ("truncate".to_string(), true));
        // Multi-byte characters count once
        assert_eq!(truncate_chars("ééééé", 3), ("ééé".to_string(), true));
    }

    #[test]
    fn test_first_words() {
        assert_eq!(first_words("one two three", 7), "one two three");
        assert_eq!(
            first_words("one two three four five six seven eight", 7),
            "one two three four five six seven..."
        );
        assert_eq!(first_words("   ", 7), "");
    }
}
