//! Canonical text form shared by the catalog index and the matcher.
//!
//! Canonical tokens are lowercase, with Spanish diacritics folded to their
//! base letter. A token is a maximal run of alphanumeric characters; `%` is
//! kept as a token of its own so percentages survive normalization.

/// A token of canonical text with byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    /// Canonical form
    pub text: String,
    /// Byte offset of the first character in the source
    pub start: usize,
    /// Byte offset one past the last character in the source
    pub end: usize,
}

/// Fold one lowercase character to its canonical base letter.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Append the canonical form of `c` to `out`.
fn push_folded(c: char, out: &mut String) {
    for lower in c.to_lowercase() {
        out.push(fold_diacritic(lower));
    }
}

/// Split text into canonical tokens, preserving source offsets.
pub fn tokenize(source: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (offset, c) in source.char_indices() {
        if c.is_alphanumeric() {
            if current.is_empty() {
                start = offset;
            }
            push_folded(c, &mut current);
            continue;
        }

        if !current.is_empty() {
            tokens.push(RawToken {
                text: std::mem::take(&mut current),
                start,
                end: offset,
            });
        }

        if c == '%' {
            tokens.push(RawToken {
                text: "%".to_string(),
                start: offset,
                end: offset + c.len_utf8(),
            });
        }
    }

    if !current.is_empty() {
        tokens.push(RawToken {
            text: current,
            start,
            end: source.len(),
        });
    }

    tokens
}

/// Canonical phrase: tokens joined by single spaces.
pub fn canonical_phrase(source: &str) -> String {
    tokenize(source)
        .into_iter()
        .map(|t| t.text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of canonical tokens in a phrase.
pub fn phrase_len(source: &str) -> usize {
    tokenize(source).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_accents_and_case() {
        assert_eq!(canonical_phrase("Sanción ADMINISTRATIVA"), "sancion administrativa");
        assert_eq!(canonical_phrase("Petróleos de Venezuela, S.A."), "petroleos de venezuela s a");
    }

    #[test]
    fn test_percent_is_a_token() {
        let tokens = tokenize("participación del 49%.");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["participacion", "del", "49", "%"]);
    }

    #[test]
    fn test_offsets_point_into_source() {
        let source = "La  expropiación   forzosa";
        for token in tokenize(source) {
            assert_eq!(canonical_phrase(&source[token.start..token.end]), token.text);
        }
    }

    #[test]
    fn test_canonical_is_idempotent() {
        let once = canonical_phrase("  Ley Orgánica de Hidrocarburos ");
        assert_eq!(canonical_phrase(&once), once);
    }
}
