//! Read-only knowledge base of constitutional articles.
//!
//! Articles live in an arena sorted by number. Lookup by number, by keyword
//! phrase and by subject tag go through indexes built once at load time;
//! nothing mutates the store afterwards, so it can be shared behind an `Arc`
//! without locks.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::source::compute_hash;
use crate::text::{canonical_phrase, phrase_len};
use crate::types::*;

/// Error types for knowledge base operations.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeBaseError {
    /// Unknown article or instrument rule
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up ("article", "majority rule")
        kind: &'static str,
        /// Identifier that was requested
        id: String,
    },

    /// The catalog failed validation
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// The catalog could not be parsed
    #[error("Catalog YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The catalog could not be read
    #[error("Catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for knowledge base operations.
pub type Result<T> = std::result::Result<T, KnowledgeBaseError>;

/// One entry of the keyword index: keyword `keyword` of article `article`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRef {
    /// Article the keyword belongs to
    pub article: ArticleNumber,
    /// Position of the keyword in the article's keyword list
    pub keyword: usize,
}

/// Summary counts over the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    /// Number of articles
    pub total_articles: usize,
    /// Articles flagged as eternity clauses
    pub eternity_clauses: usize,
    /// Articles whose matter requires an organic law
    pub organic_law_articles: usize,
    /// Articles reserving something to the State
    pub state_reservations: usize,
    /// Article count per subject tag
    pub by_tag: BTreeMap<SubjectTag, usize>,
    /// Number of instrument rules
    pub instrument_rules: usize,
}

/// The constitutional knowledge base.
#[derive(Debug)]
pub struct KnowledgeBase {
    meta: CatalogMeta,
    /// Arena, sorted by article number
    articles: Vec<ConstitutionalArticle>,
    /// Canonical keyword phrases, parallel to `articles`
    canonical_keywords: Vec<Vec<String>>,
    by_number: BTreeMap<ArticleNumber, usize>,
    keyword_index: HashMap<String, Vec<KeywordRef>>,
    tag_index: BTreeMap<SubjectTag, Vec<usize>>,
    rules: BTreeMap<InstrumentType, MajorityRule>,
    max_keyword_len: usize,
    fingerprint: String,
}

impl KnowledgeBase {
    /// Validate a catalog and build the store with all of its indexes.
    pub fn from_catalog(catalog: Catalog) -> Result<Self> {
        catalog.validate()?;
        let fingerprint = compute_hash(&catalog.canonical_bytes()?);

        let Catalog {
            meta,
            mut articles,
            majority_rules,
        } = catalog;
        articles.sort_by_key(|a| a.number);

        let mut by_number = BTreeMap::new();
        let mut keyword_index: HashMap<String, Vec<KeywordRef>> = HashMap::new();
        let mut tag_index: BTreeMap<SubjectTag, Vec<usize>> = BTreeMap::new();
        let mut canonical_keywords = Vec::with_capacity(articles.len());
        let mut max_keyword_len = 0;

        for (idx, article) in articles.iter().enumerate() {
            by_number.insert(article.number, idx);

            let mut phrases = Vec::with_capacity(article.keywords.len());
            for (kw_idx, keyword) in article.keywords.iter().enumerate() {
                let phrase = canonical_phrase(keyword);
                max_keyword_len = max_keyword_len.max(phrase_len(&phrase));
                keyword_index.entry(phrase.clone()).or_default().push(KeywordRef {
                    article: article.number,
                    keyword: kw_idx,
                });
                phrases.push(phrase);
            }
            canonical_keywords.push(phrases);

            for tag in &article.tags {
                let slot = tag_index.entry(*tag).or_default();
                if slot.last() != Some(&idx) {
                    slot.push(idx);
                }
            }
        }

        for article in &articles {
            for related in &article.related {
                if !by_number.contains_key(related) {
                    tracing::warn!(
                        article = %article.number,
                        related = %related,
                        "Cross-reference to an article outside the catalog"
                    );
                }
            }
        }

        let rules = majority_rules
            .into_iter()
            .map(|entry| (entry.instrument, entry.rule))
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(
            catalog = %meta.name,
            version = %meta.version,
            articles = articles.len(),
            rules = rules.len(),
            fingerprint = %fingerprint,
            "Knowledge base loaded"
        );

        Ok(Self {
            meta,
            articles,
            canonical_keywords,
            by_number,
            keyword_index,
            tag_index,
            rules,
            max_keyword_len,
            fingerprint,
        })
    }

    /// Build the store from the bundled CRBV catalog.
    pub fn bundled() -> Result<Self> {
        Self::from_catalog(Catalog::from_yaml(crate::catalog::BUNDLED_CRBV)?)
    }

    /// Catalog provenance.
    pub fn meta(&self) -> &CatalogMeta {
        &self.meta
    }

    /// All articles in number order.
    pub fn articles(&self) -> &[ConstitutionalArticle] {
        &self.articles
    }

    /// Look up an article by number.
    pub fn get_article(&self, number: impl Into<ArticleNumber>) -> Result<&ConstitutionalArticle> {
        let number = number.into();
        self.by_number
            .get(&number)
            .map(|&idx| &self.articles[idx])
            .ok_or_else(|| KnowledgeBaseError::NotFound {
                kind: "article",
                id: number.to_string(),
            })
    }

    /// Articles for a subject tag name, or whose keywords contain the query.
    ///
    /// A query equal to a tag name ("civil_rights") returns that tag's
    /// articles. Any other query is normalized and matched as a substring of
    /// each article's normalized keywords.
    pub fn articles_matching(&self, tag_or_keyword: &str) -> Vec<&ConstitutionalArticle> {
        if let Some(tag) = SubjectTag::from_name(tag_or_keyword) {
            return self.by_tag(tag);
        }

        let query = canonical_phrase(tag_or_keyword);
        if query.is_empty() {
            return Vec::new();
        }

        self.articles
            .iter()
            .zip(&self.canonical_keywords)
            .filter(|(_, phrases)| phrases.iter().any(|p| p.contains(&query)))
            .map(|(article, _)| article)
            .collect()
    }

    /// Majority rule for an instrument.
    pub fn majority_rule(&self, instrument: InstrumentType) -> Result<&MajorityRule> {
        self.rules
            .get(&instrument)
            .ok_or_else(|| KnowledgeBaseError::NotFound {
                kind: "majority rule",
                id: instrument.to_string(),
            })
    }

    /// Articles flagged as eternity clauses.
    pub fn eternity_clauses(&self) -> Vec<&ConstitutionalArticle> {
        self.articles
            .iter()
            .filter(|a| a.is_eternity_clause)
            .collect()
    }

    /// Articles carrying a subject tag, in number order.
    pub fn by_tag(&self, tag: SubjectTag) -> Vec<&ConstitutionalArticle> {
        self.tag_index
            .get(&tag)
            .map(|idxs| idxs.iter().map(|&i| &self.articles[i]).collect())
            .unwrap_or_default()
    }

    /// Full-text search over titles, texts and keywords.
    pub fn search(&self, query: &str) -> Vec<&ConstitutionalArticle> {
        let query = canonical_phrase(query);
        if query.is_empty() {
            return Vec::new();
        }

        self.articles
            .iter()
            .zip(&self.canonical_keywords)
            .filter(|(article, phrases)| {
                canonical_phrase(&article.title).contains(&query)
                    || canonical_phrase(&article.text).contains(&query)
                    || phrases.iter().any(|p| p.contains(&query))
            })
            .map(|(article, _)| article)
            .collect()
    }

    /// Summary counts.
    pub fn statistics(&self) -> CatalogStatistics {
        CatalogStatistics {
            total_articles: self.articles.len(),
            eternity_clauses: self.articles.iter().filter(|a| a.is_eternity_clause).count(),
            organic_law_articles: self
                .articles
                .iter()
                .filter(|a| a.requires_organic_law)
                .count(),
            state_reservations: self.articles.iter().filter(|a| a.state_reservation).count(),
            by_tag: self
                .tag_index
                .iter()
                .map(|(tag, idxs)| (*tag, idxs.len()))
                .collect(),
            instrument_rules: self.rules.len(),
        }
    }

    /// Index entries whose canonical keyword equals `phrase` exactly.
    ///
    /// `phrase` must already be in canonical form.
    pub fn keyword_hits(&self, phrase: &str) -> &[KeywordRef] {
        self.keyword_index
            .get(phrase)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Canonical keyword phrases of an article, parallel to its keyword list.
    pub fn canonical_keywords(&self, number: ArticleNumber) -> &[String] {
        self.by_number
            .get(&number)
            .map(|&idx| self.canonical_keywords[idx].as_slice())
            .unwrap_or(&[])
    }

    /// Token length of the longest keyword phrase.
    pub fn max_keyword_len(&self) -> usize {
        self.max_keyword_len
    }

    /// SHA-256 of the canonical catalog, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}
