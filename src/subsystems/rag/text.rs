//! Tokenizer and sliding-window chunker used by the retriever.

use std::sync::LazyLock;

use regex::Regex;

/// Lowercase word runs: ASCII letters, digits and Spanish accented letters.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9áéíóúüñ]+").expect("token pattern is valid"));

/// Default chunk width in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 120;

/// Lowercase `text` and return its word tokens in order.
///
/// Punctuation and whitespace only separate tokens and are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Split `text` into windows of `size` characters advancing by
/// `size - overlap` (at least 1).
///
/// Whitespace runs are collapsed to single spaces first. The last window
/// may be shorter than `size`; windowing stops once a window reaches the
/// end of the text.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = normalized.chars().collect();
    if chars.is_empty() || size == 0 {
        return Vec::new();
    }

    let stride = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += stride;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo the overlap: first chunk whole, then each later chunk minus its
    /// first `overlap` characters.
    fn reassemble(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, c) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(c);
            } else {
                out.extend(c.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        assert_eq!(
            tokenize("¿Cuáles son los requisitos para la BECA?"),
            vec!["cuáles", "son", "los", "requisitos", "para", "la", "beca"]
        );
    }

    #[test]
    fn tokenize_keeps_digits_and_enye() {
        assert_eq!(tokenize("Año 2024: señal-7"), vec!["año", "2024", "señal", "7"]);
    }

    #[test]
    fn tokenize_empty_and_punctuation_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("¡¿...?! -- ;").is_empty());
    }

    #[test]
    fn chunk_collapses_whitespace() {
        assert_eq!(chunk("  uno \n\n dos \t tres  ", 800, 120), vec!["uno dos tres"]);
    }

    #[test]
    fn chunk_empty_text() {
        assert!(chunk("   \n ", 10, 2).is_empty());
    }

    #[test]
    fn chunk_windows_and_short_tail() {
        let text = "abcdefghij"; // 10 chars
        let chunks = chunk(text, 4, 1);
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
        let chunks = chunk(text, 4, 0);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunk_overlap_not_smaller_than_size_still_terminates() {
        let chunks = chunk("abcdef", 3, 5);
        assert_eq!(chunks, vec!["abc", "bcd", "cde", "def"]);
    }

    #[test]
    fn chunk_counts_characters_not_bytes() {
        let chunks = chunk("áéíóú", 2, 0);
        assert_eq!(chunks, vec!["áé", "íó", "ú"]);
    }

    #[test]
    fn chunk_reassembles_to_normalized_text() {
        let base = "La postulación a la beca de alimentación requiere  \n certificado de alumno regular. ";
        let text = base.repeat(40);
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        for (size, overlap) in [(800, 120), (100, 0), (37, 36), (5, 1), (1, 0)] {
            let chunks = chunk(&text, size, overlap);
            assert!(chunks.iter().all(|c| c.chars().count() <= size));
            assert_eq!(reassemble(&chunks, overlap), normalized, "size={size} overlap={overlap}");
        }
    }
}
