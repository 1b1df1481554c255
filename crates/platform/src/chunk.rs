//! Fixed-width message chunking under the platform's hard size cap.

/// Hard per-message cap imposed by the platform.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Room reserved for a `"(i/N)\n"` pagination prefix on every chunk.
const PAGINATION_ALLOWANCE: usize = 10;

/// Maximum chunk body length under the default allowance.
pub const MAX_CHUNK_LEN: usize = MAX_MESSAGE_LEN - PAGINATION_ALLOWANCE;

/// Chunk `text` so every framed chunk fits under [`MAX_MESSAGE_LEN`].
///
/// The default allowance covers prefixes up to three-digit chunk counts;
/// beyond that the body width shrinks to make room for the wider prefix,
/// re-chunking until the count and prefix agree.
pub fn chunk_message(text: &str) -> Vec<String> {
    let mut max_chars = MAX_CHUNK_LEN;
    loop {
        let chunks = chunk_text(text, max_chars);
        let prefix = prefix_len(chunks.len());
        if chunks.len() <= 1 || prefix <= MAX_MESSAGE_LEN - max_chars {
            return chunks;
        }
        max_chars = MAX_MESSAGE_LEN - prefix;
    }
}

/// Width of the widest `"(i/N)\n"` prefix for `total` chunks.
fn prefix_len(total: usize) -> usize {
    format!("({total}/{total})\n").len()
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Splitting is semantic-agnostic (the platform limit is character-based),
/// and lossless: concatenating the chunks reproduces `text` exactly. Empty
/// input yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 || text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Prefix each chunk with `"(i/N)\n"` when there is more than one.
pub fn paginate(chunks: Vec<String>) -> Vec<String> {
    let total = chunks.len();
    if total <= 1 {
        return chunks;
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("({}/{})\n{}", i + 1, total, chunk))
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("hello", 10), vec!["hello"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 10).is_empty());
    }

    #[test]
    fn chunk_count_is_ceiling_of_length_over_max() {
        let text = "a".repeat(25);
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn concatenation_reproduces_input_exactly() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(100);
        let chunks = chunk_text(&text, MAX_CHUNK_LEN);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn splits_on_char_boundaries() {
        let text = "héllo wörld".repeat(3);
        let chunks = chunk_text(&text, 4);
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 4);
        }
    }

    #[test]
    fn single_chunk_gets_no_prefix() {
        let paged = paginate(vec!["only".into()]);
        assert_eq!(paged, vec!["only"]);
    }

    #[test]
    fn multiple_chunks_get_numbered_prefixes() {
        let paged = paginate(vec!["one".into(), "two".into(), "three".into()]);
        assert_eq!(paged[0], "(1/3)\none");
        assert_eq!(paged[1], "(2/3)\ntwo");
        assert_eq!(paged[2], "(3/3)\nthree");
    }

    #[test]
    fn prefixed_chunks_stay_under_hard_cap() {
        let text = "x".repeat(MAX_CHUNK_LEN * 3);
        let paged = paginate(chunk_message(&text));
        for chunk in &paged {
            assert!(chunk.chars().count() <= MAX_MESSAGE_LEN);
        }
    }

    #[test]
    fn four_digit_chunk_counts_still_fit_the_hard_cap() {
        // Enough text for well over a thousand chunks, where the default
        // allowance no longer covers the "(i/N)\n" prefix.
        let text = "y".repeat(MAX_CHUNK_LEN * 1200);
        let bodies = chunk_message(&text);
        assert!(bodies.len() > 1000);
        assert_eq!(bodies.concat(), text);

        let paged = paginate(bodies);
        for chunk in &paged {
            assert!(chunk.chars().count() <= MAX_MESSAGE_LEN);
        }
    }
}
