//! Core types for the compliance engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use constitution::{ArticleNumber, ConstitutionalArticle, KnowledgeBaseError, VoteBase};

/// Severity tier of a conflict finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Drafting concern
    Low,
    /// Formal or competence defect
    Medium,
    /// Restriction of a constitutional right
    High,
    /// Touches an eternity clause or a State reservation
    Critical,
}

impl Severity {
    /// All tiers, most severe first.
    pub fn descending() -> [Severity; 4] {
        [Self::Critical, Self::High, Self::Medium, Self::Low]
    }

    /// Upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal span of the analyzed text, with byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedSpan {
    /// Text exactly as it appears in the input
    pub text: String,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

/// Copy of the article flags a severity decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFlags {
    /// Article is an eternity clause
    pub is_eternity_clause: bool,
    /// Matter must be regulated by organic law
    pub requires_organic_law: bool,
    /// Article reserves something to the State
    pub state_reservation: bool,
    /// Article belongs to a rights chapter
    pub rights_tagged: bool,
}

impl From<&ConstitutionalArticle> for ArticleFlags {
    fn from(article: &ConstitutionalArticle) -> Self {
        Self {
            is_eternity_clause: article.is_eternity_clause,
            requires_organic_law: article.requires_organic_law,
            state_reservation: article.state_reservation,
            rights_tagged: article.is_rights_tagged(),
        }
    }
}

/// Identifier of the severity rule that classified a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityRuleId {
    /// Eternity-clause article
    EternityClause,
    /// State reservation with transfer or reduction language
    StateReservationTransfer,
    /// Rights restricted without due-process qualifier
    RightsRestriction,
    /// Organic-law matter in a lower instrument
    OrganicLawReserve,
    /// No other rule applied
    Residual,
}

/// A likely conflict between the text and a constitutional article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictFinding {
    /// Referenced article
    pub article: ArticleNumber,
    /// Title of the referenced article
    pub article_title: String,
    /// Article flags at classification time
    pub flags: ArticleFlags,
    /// Literal span that triggered the finding
    pub span: MatchedSpan,
    /// Keywords matched inside the span
    pub matched_keywords: Vec<String>,
    /// Detector score
    pub score: f64,
    /// Severity tier
    pub severity: Severity,
    /// Rule that set the severity
    pub rule: SeverityRuleId,
    /// Human-readable rationale
    pub rationale: String,
}

/// The five compliance tests, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestId {
    /// Constitutional supremacy (eternity clauses, State reservations)
    Supremacy,
    /// Non-regression of constitutional rights
    RightsImpact,
    /// Rank of the instrument versus the matter it regulates
    Competence,
    /// Procedural safeguards for sanctions
    DueProcess,
    /// Justification of restrictions
    PublicInterest,
}

impl TestId {
    /// All tests in canonical order.
    pub fn all() -> [TestId; 5] {
        [
            Self::Supremacy,
            Self::RightsImpact,
            Self::Competence,
            Self::DueProcess,
            Self::PublicInterest,
        ]
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Supremacy => "Constitutional Supremacy",
            Self::RightsImpact => "Rights Impact",
            Self::Competence => "Competence",
            Self::DueProcess => "Due Process",
            Self::PublicInterest => "Public Interest",
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Evidence backing a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Evidence {
    /// A conflict finding against an article
    Finding(ArticleNumber),
    /// A cue phrase found (or missing) in the text
    Cue(String),
}

/// Outcome of one compliance test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestVerdict {
    /// Which test
    pub test: TestId,
    /// Whether the text passed
    pub passed: bool,
    /// Confidence in the verdict (0.0 - 1.0)
    pub confidence: f64,
    /// Evidence for the verdict
    pub evidence: Vec<Evidence>,
    /// Articles invoked by the test
    pub articles: Vec<ArticleNumber>,
    /// One-line explanation
    pub summary: String,
}

/// Aggregate risk level of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// No findings, no failures
    None,
    /// Only low findings
    Low,
    /// A medium finding or one failed test
    Medium,
    /// A high finding or two failed tests
    High,
    /// A critical finding or failed supremacy test
    Critical,
}

impl RiskLevel {
    /// Upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composition of a voting body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyComposition {
    /// Total membership
    pub total: u32,
    /// Members present (defaults to total)
    #[serde(default)]
    pub present: Option<u32>,
}

impl BodyComposition {
    /// Composition with every member present.
    pub fn full(total: u32) -> Self {
        Self {
            total,
            present: None,
        }
    }

    /// Composition with an explicit attendance.
    pub fn with_present(total: u32, present: u32) -> Self {
        Self {
            total,
            present: Some(present),
        }
    }

    /// Members present, defaulting to the full membership.
    pub fn present_count(&self) -> u32 {
        self.present.unwrap_or(self.total)
    }

    /// Size of the population a majority is computed over.
    pub fn base_count(&self, base: VoteBase) -> u32 {
        match base {
            VoteBase::Present => self.present_count(),
            VoteBase::Total => self.total,
        }
    }

    /// Reject empty bodies and attendance above membership.
    pub fn validate(&self) -> Result<()> {
        if self.total == 0 {
            return Err(EngineError::InputError(
                "body composition has zero members".to_string(),
            ));
        }
        if self.present_count() > self.total {
            return Err(EngineError::InputError(format!(
                "{} members present exceeds total membership of {}",
                self.present_count(),
                self.total
            )));
        }
        Ok(())
    }
}

/// Error types for the compliance engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed request (empty text, bad composition)
    #[error("Input error: {0}")]
    InputError(String),

    /// Unknown article or instrument rule
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up
        kind: &'static str,
        /// Identifier that was requested
        id: String,
    },

    /// Knowledge base could not be loaded
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(KnowledgeBaseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<KnowledgeBaseError> for EngineError {
    fn from(err: KnowledgeBaseError) -> Self {
        match err {
            KnowledgeBaseError::NotFound { kind, id } => EngineError::NotFound { kind, id },
            other => EngineError::KnowledgeBase(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orderings() {
        assert!(Severity::Critical > Severity::High);
        assert!(RiskLevel::None < RiskLevel::Low);
        let mut ids = vec![TestId::PublicInterest, TestId::Supremacy, TestId::DueProcess];
        ids.sort();
        assert_eq!(
            ids,
            vec![TestId::Supremacy, TestId::DueProcess, TestId::PublicInterest]
        );
    }

    #[test]
    fn test_composition_validation() {
        assert!(BodyComposition::full(277).validate().is_ok());
        assert!(matches!(
            BodyComposition::full(0).validate(),
            Err(EngineError::InputError(_))
        ));
        assert!(BodyComposition::with_present(100, 101).validate().is_err());
        assert_eq!(BodyComposition::full(165).present_count(), 165);
        let partial = BodyComposition::with_present(277, 200);
        assert_eq!(partial.base_count(VoteBase::Present), 200);
        assert_eq!(partial.base_count(VoteBase::Total), 277);
    }

    #[test]
    fn test_not_found_is_preserved() {
        let err: EngineError = KnowledgeBaseError::NotFound {
            kind: "article",
            id: "Art. 9".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::NotFound { kind: "article", .. }));
    }

    #[test]
    fn test_evidence_serialization() {
        let json = serde_json::to_string(&Evidence::Finding(ArticleNumber(303))).unwrap();
        assert_eq!(json, r#"{"type":"finding","value":303}"#);
    }
}
