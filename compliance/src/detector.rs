//! Conflict detector.
//!
//! Finds keyword occurrences for every article through the knowledge base's
//! keyword index, scores clusters of nearby occurrences and emits a
//! candidate for each article whose best cluster clears the article's
//! threshold. Long keyword lists raise the threshold, except on eternity
//! clauses and State reservations, where one hit is enough.
//!
//! Score of a cluster = Σ over distinct keywords of `w_k × m`, where `w_k`
//! is 1 when the keyword has an unexcepted occurrence in the cluster and
//! `1 - negation_discount` otherwise, and `m` is `1 + proximity_bonus` when
//! two or more distinct keywords fall inside the proximity window.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use constitution::{ArticleNumber, KnowledgeBase};

use crate::config::DetectorConfig;
use crate::normalize::NormalizedText;
use crate::types::MatchedSpan;

/// One keyword occurrence in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Occurrence {
    keyword: usize,
    start: usize,
    end: usize,
    excepted: bool,
}

/// An article flagged by the detector, before severity classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictCandidate {
    /// Flagged article
    pub article: ArticleNumber,
    /// Token range of the best-scoring cluster
    pub tokens: Range<usize>,
    /// Literal span of the best-scoring cluster
    pub span: MatchedSpan,
    /// Distinct keywords in the cluster, in catalog spelling
    pub matched_keywords: Vec<String>,
    /// Cluster score
    pub score: f64,
    /// Threshold the score cleared
    pub threshold: f64,
    /// Token index of the article's first occurrence in the text
    pub first_match: usize,
    /// Whether every keyword in the cluster was excepted
    pub fully_excepted: bool,
}

/// Keyword-based conflict detector.
pub struct ConflictDetector<'a> {
    kb: &'a KnowledgeBase,
    config: &'a DetectorConfig,
}

impl<'a> ConflictDetector<'a> {
    /// Create a detector over a knowledge base.
    pub fn new(kb: &'a KnowledgeBase, config: &'a DetectorConfig) -> Self {
        Self { kb, config }
    }

    /// Detect candidate conflicts, ordered by first match in the text
    /// (article number on ties).
    pub fn detect(&self, text: &NormalizedText) -> Vec<ConflictCandidate> {
        let markers = self.marker_ends(text);
        let occurrences = self.occurrences(text, &markers);

        let mut candidates: Vec<ConflictCandidate> = occurrences
            .into_iter()
            .filter_map(|(article, occs)| self.evaluate(text, article, occs))
            .collect();

        candidates.sort_by(|a, b| {
            a.first_match
                .cmp(&b.first_match)
                .then(a.article.cmp(&b.article))
        });

        tracing::debug!(candidates = candidates.len(), "Conflict detection finished");
        candidates
    }

    /// End token positions of every exception marker in the text.
    fn marker_ends(&self, text: &NormalizedText) -> Vec<usize> {
        let mut ends: Vec<usize> = self
            .config
            .negation_markers
            .iter()
            .flat_map(|marker| {
                let len = constitution::text::phrase_len(marker);
                text.phrase_positions(marker)
                    .into_iter()
                    .map(move |start| start + len)
            })
            .collect();
        ends.sort_unstable();
        ends.dedup();
        ends
    }

    /// Keyword occurrences grouped by article.
    fn occurrences(
        &self,
        text: &NormalizedText,
        marker_ends: &[usize],
    ) -> BTreeMap<ArticleNumber, Vec<Occurrence>> {
        let max_len = self.kb.max_keyword_len().min(self.config.ngram_cap);
        let lookback = self.config.negation_lookback;
        let mut by_article: BTreeMap<ArticleNumber, Vec<Occurrence>> = BTreeMap::new();

        for gram in text.ngrams().iter().filter(|g| g.len <= max_len) {
            for hit in self.kb.keyword_hits(&gram.phrase) {
                let excepted = marker_ends
                    .iter()
                    .any(|&end| end <= gram.start && gram.start - end <= lookback);
                by_article.entry(hit.article).or_default().push(Occurrence {
                    keyword: hit.keyword,
                    start: gram.start,
                    end: gram.start + gram.len,
                    excepted,
                });
            }
        }

        for occs in by_article.values_mut() {
            occs.sort_by_key(|o| (o.start, o.end, o.keyword));
        }
        by_article
    }

    /// Score the best cluster of an article and emit it if it clears the
    /// threshold.
    fn evaluate(
        &self,
        text: &NormalizedText,
        number: ArticleNumber,
        occs: Vec<Occurrence>,
    ) -> Option<ConflictCandidate> {
        let article = self.kb.get_article(number).ok()?;
        let threshold = self.config.threshold(article);
        let first_match = occs.first()?.start;

        let mut best: Option<(f64, usize, usize)> = None;
        for anchor in 0..occs.len() {
            let limit = occs[anchor].start + self.config.proximity_window;
            let end = occs[anchor..]
                .iter()
                .position(|o| o.start > limit)
                .map_or(occs.len(), |p| anchor + p);
            let score = self.cluster_score(&occs[anchor..end]);
            if best.map_or(true, |(s, _, _)| score > s) {
                best = Some((score, anchor, end));
            }
        }

        let (score, anchor, end) = best?;
        if score <= threshold {
            tracing::trace!(
                article = %number,
                score,
                threshold,
                "Below threshold"
            );
            return None;
        }

        let cluster = &occs[anchor..end];
        let start_tok = cluster.iter().map(|o| o.start).min()?;
        let end_tok = cluster.iter().map(|o| o.end).max()?;
        let keywords: BTreeSet<usize> = cluster.iter().map(|o| o.keyword).collect();
        let fully_excepted = cluster.iter().all(|o| o.excepted);

        Some(ConflictCandidate {
            article: number,
            tokens: start_tok..end_tok,
            span: text.span(start_tok..end_tok),
            matched_keywords: keywords
                .into_iter()
                .filter_map(|k| article.keywords.get(k).cloned())
                .collect(),
            score,
            threshold,
            first_match,
            fully_excepted,
        })
    }

    fn cluster_score(&self, cluster: &[Occurrence]) -> f64 {
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        let mitigated = 1.0 - self.config.negation_discount;
        for occ in cluster {
            let w = if occ.excepted { mitigated } else { 1.0 };
            let slot = weights.entry(occ.keyword).or_insert(w);
            if w > *slot {
                *slot = w;
            }
        }

        let multiplier = if weights.len() >= 2 {
            1.0 + self.config.proximity_bonus
        } else {
            1.0
        };
        weights.values().sum::<f64>() * multiplier
    }
}
