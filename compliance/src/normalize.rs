//! Text normalization.
//!
//! Turns raw legal text into a canonical token stream (lowercase, Spanish
//! diacritics folded) where every token keeps its byte offsets into the
//! original text, plus an n-gram view used for keyword lookup.

use std::ops::Range;

use constitution::text::{canonical_phrase, tokenize, RawToken};

use crate::types::{EngineError, MatchedSpan, Result};

/// A contiguous run of tokens in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NGram {
    /// Index of the first token
    pub start: usize,
    /// Number of tokens
    pub len: usize,
    /// Tokens joined by single spaces
    pub phrase: String,
}

/// A cue compiled to canonical tokens.
///
/// All words but the last match exactly; the last word matches as a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    label: String,
    words: Vec<String>,
}

impl Cue {
    /// Compile a cue phrase. Returns `None` for phrases with no tokens.
    pub fn new(phrase: &str) -> Option<Self> {
        let words: Vec<String> = tokenize(phrase).into_iter().map(|t| t.text).collect();
        if words.is_empty() {
            return None;
        }
        Some(Self {
            label: words.join(" "),
            words,
        })
    }

    /// Compile a list of cue phrases, skipping empty ones.
    pub fn compile(phrases: &[String]) -> Vec<Cue> {
        phrases.iter().filter_map(|p| Cue::new(p)).collect()
    }

    /// Canonical label of the cue.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of tokens in the cue.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the cue has no tokens (never true for a compiled cue).
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn matches_at(&self, tokens: &[RawToken], at: usize) -> bool {
        let Some(last) = self.words.len().checked_sub(1) else {
            return false;
        };
        if at + self.words.len() > tokens.len() {
            return false;
        }
        self.words.iter().enumerate().all(|(i, word)| {
            let token = &tokens[at + i].text;
            if i == last {
                token.starts_with(word.as_str())
            } else {
                token == word
            }
        })
    }
}

/// Normalized view of an input text.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    source: String,
    tokens: Vec<RawToken>,
    ngrams: Vec<NGram>,
}

impl NormalizedText {
    /// Normalize `source`, building n-grams of up to `max_ngram` tokens.
    ///
    /// Empty or whitespace-only text is rejected.
    pub fn new(source: &str, max_ngram: usize) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(EngineError::InputError("text is empty".to_string()));
        }

        let tokens = tokenize(source);
        if tokens.is_empty() {
            return Err(EngineError::InputError(
                "text contains no words".to_string(),
            ));
        }

        let max_ngram = max_ngram.max(1);
        let mut ngrams = Vec::with_capacity(tokens.len() * max_ngram);
        for start in 0..tokens.len() {
            let mut phrase = String::new();
            for len in 1..=max_ngram.min(tokens.len() - start) {
                if len > 1 {
                    phrase.push(' ');
                }
                phrase.push_str(&tokens[start + len - 1].text);
                ngrams.push(NGram {
                    start,
                    len,
                    phrase: phrase.clone(),
                });
            }
        }

        tracing::debug!(
            tokens = tokens.len(),
            ngrams = ngrams.len(),
            "Normalized text"
        );

        Ok(Self {
            source: source.to_string(),
            tokens,
            ngrams,
        })
    }

    /// The original text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Canonical token stream.
    pub fn tokens(&self) -> &[RawToken] {
        &self.tokens
    }

    /// N-gram view, ordered by start token then length.
    pub fn ngrams(&self) -> &[NGram] {
        &self.ngrams
    }

    /// Canonical form of the whole text.
    pub fn canonical(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Literal span covering tokens in `range`.
    pub fn span(&self, range: Range<usize>) -> MatchedSpan {
        let range = self.clamp(range);
        if range.is_empty() {
            return MatchedSpan {
                text: String::new(),
                start: 0,
                end: 0,
            };
        }
        let start = self.tokens[range.start].start;
        let end = self.tokens[range.end - 1].end;
        MatchedSpan {
            text: self.source[start..end].to_string(),
            start,
            end,
        }
    }

    /// Token range extended by `radius` tokens on each side.
    pub fn window(&self, range: Range<usize>, radius: usize) -> Range<usize> {
        self.clamp(range.start.saturating_sub(radius)..range.end.saturating_add(radius))
    }

    /// Original text covered by a token range.
    pub fn slice(&self, range: Range<usize>) -> &str {
        let range = self.clamp(range);
        if range.is_empty() {
            return "";
        }
        &self.source[self.tokens[range.start].start..self.tokens[range.end - 1].end]
    }

    /// Token positions inside `range` where `cue` starts and fits entirely.
    pub fn cue_positions(&self, cue: &Cue, range: Range<usize>) -> Vec<usize> {
        let range = self.clamp(range);
        let tokens = &self.tokens[..range.end];
        (range.start..range.end)
            .filter(|&at| cue.matches_at(tokens, at))
            .collect()
    }

    /// Whether any cue occurs inside `range`.
    pub fn any_cue<'c>(&self, cues: &'c [Cue], range: Range<usize>) -> Option<&'c Cue> {
        cues.iter()
            .find(|cue| !self.cue_positions(cue, range.clone()).is_empty())
    }

    /// Token positions where an exact canonical phrase starts.
    pub fn phrase_positions(&self, phrase: &str) -> Vec<usize> {
        let canonical = canonical_phrase(phrase);
        let len = canonical.split(' ').filter(|w| !w.is_empty()).count();
        if len == 0 {
            return Vec::new();
        }
        self.ngrams
            .iter()
            .filter(|g| g.len == len && g.phrase == canonical)
            .map(|g| g.start)
            .collect()
    }

    /// Full token range of the text.
    pub fn full_range(&self) -> Range<usize> {
        0..self.tokens.len()
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.tokens.len());
        range.start.min(end)..end
    }
}
