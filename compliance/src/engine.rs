//! Compliance engine.
//!
//! Runs one analysis end to end: normalize, classify the instrument, detect
//! conflicts, classify their severity, run the test battery, aggregate risk
//! and, when a body composition is supplied, assess feasibility.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use constitution::{CatalogSource, InstrumentType, KnowledgeBase};

use crate::battery::{BatteryInput, TestBattery};
use crate::config::EngineConfig;
use crate::detector::{ConflictCandidate, ConflictDetector};
use crate::feasibility::{
    FeasibilityCalculator, FeasibilityContext, FeasibilityQuery, FeasibilityScorecard,
};
use crate::instrument::{self, InstrumentClassification};
use crate::normalize::NormalizedText;
use crate::report::ComplianceReport;
use crate::risk::RiskAggregator;
use crate::severity::SeverityClassifier;
use crate::types::{BodyComposition, ConflictFinding, Result};

/// A request to analyze a legal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Proposed legal text
    pub text: String,
    /// Declared instrument type (inferred when absent)
    #[serde(default)]
    pub instrument: Option<InstrumentType>,
    /// Voting body composition (feasibility is skipped when absent)
    #[serde(default)]
    pub composition: Option<BodyComposition>,
    /// Feasibility context
    #[serde(default)]
    pub context: FeasibilityContext,
}

impl AnalysisRequest {
    /// Request for a text with nothing declared.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            instrument: None,
            composition: None,
            context: FeasibilityContext::default(),
        }
    }

    /// Declare the instrument type.
    pub fn with_instrument(mut self, instrument: InstrumentType) -> Self {
        self.instrument = Some(instrument);
        self
    }

    /// Supply the voting body composition.
    pub fn with_composition(mut self, composition: BodyComposition) -> Self {
        self.composition = Some(composition);
        self
    }

    /// Supply projected favorable votes.
    pub fn with_projected_votes(mut self, votes: u32) -> Self {
        self.context.projected_votes = Some(votes);
        self
    }

    /// Replace the feasibility context.
    pub fn with_context(mut self, context: FeasibilityContext) -> Self {
        self.context = context;
        self
    }
}

/// The compliance engine.
///
/// Holds the shared knowledge base and the compiled pipeline stages. An
/// engine is immutable; analyses on the same engine are independent.
pub struct ComplianceEngine {
    kb: Arc<KnowledgeBase>,
    config: EngineConfig,
    classifier: SeverityClassifier,
    battery: TestBattery,
    risk: RiskAggregator,
}

impl ComplianceEngine {
    /// Create an engine over a knowledge base.
    pub fn new(kb: Arc<KnowledgeBase>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let classifier = SeverityClassifier::new(&config.severity)?;
        let battery = TestBattery::new(&config.battery);
        let risk = RiskAggregator::new(&config.risk);

        info!(
            catalog = %kb.meta().name,
            version = %kb.meta().version,
            fingerprint = %kb.fingerprint(),
            "Compliance engine ready"
        );

        Ok(Self {
            kb,
            config,
            classifier,
            battery,
            risk,
        })
    }

    /// Engine over the bundled catalog with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Arc::new(KnowledgeBase::bundled()?), EngineConfig::default())
    }

    /// Engine over a catalog loaded from a source.
    pub async fn from_source(source: &dyn CatalogSource, config: EngineConfig) -> Result<Self> {
        let kb = source.knowledge_base().await?;
        Self::new(Arc::new(kb), config)
    }

    /// Shared knowledge base.
    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.kb
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze a text.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<ComplianceReport> {
        let text = NormalizedText::new(&request.text, self.config.detector.ngram_cap)?;
        if let Some(composition) = &request.composition {
            composition.validate()?;
        }

        let instrument = instrument::classify(&text, request.instrument);
        let candidates = ConflictDetector::new(&self.kb, &self.config.detector).detect(&text);
        let findings = self.classify(&text, candidates, &instrument)?;

        let verdicts = self.battery.run(&BatteryInput {
            text: &text,
            findings: &findings,
            kb: &self.kb,
            instrument: &instrument,
        });
        let risk = self.risk.assess(&findings, &verdicts);

        let feasibility = match &request.composition {
            Some(composition) => {
                let mut context = request.context.clone();
                context.subject_requires_organic |=
                    findings.iter().any(|f| f.flags.requires_organic_law);
                Some(self.feasibility(
                    &FeasibilityQuery::new(instrument.instrument, *composition)
                        .with_context(context),
                )?)
            }
            None => None,
        };

        info!(
            instrument = %instrument.instrument,
            findings = findings.len(),
            failed_tests = verdicts.iter().filter(|v| !v.passed).count(),
            risk = %risk.level,
            nullity = risk.nullity_probability,
            "Analysis complete"
        );

        Ok(ComplianceReport::assemble(
            instrument,
            findings,
            verdicts,
            risk,
            self.kb.fingerprint().to_string(),
            feasibility,
        ))
    }

    /// Assess the feasibility of adopting an instrument.
    pub fn feasibility(&self, query: &FeasibilityQuery) -> Result<FeasibilityScorecard> {
        FeasibilityCalculator::new(&self.kb, &self.config.feasibility).assess(query)
    }

    fn classify(
        &self,
        text: &NormalizedText,
        candidates: Vec<ConflictCandidate>,
        instrument: &InstrumentClassification,
    ) -> Result<Vec<ConflictFinding>> {
        let declared = instrument.effective();
        let mut findings = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let article = self.kb.get_article(candidate.article)?;
            let context = self.classifier.context(text, candidate.tokens.clone());
            let classification = self.classifier.classify(article, &context, declared);

            let mut rationale = classification.rationale;
            if candidate.fully_excepted {
                rationale.push_str(" Every match falls inside an exception clause.");
            }

            debug!(
                article = %candidate.article,
                score = candidate.score,
                severity = %classification.severity,
                "Finding classified"
            );

            findings.push(ConflictFinding {
                article: candidate.article,
                article_title: article.title.clone(),
                flags: article.into(),
                span: candidate.span,
                matched_keywords: candidate.matched_keywords,
                score: candidate.score,
                severity: classification.severity,
                rule: classification.rule,
                rationale,
            });
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EngineError, RiskLevel, Severity};

    #[test]
    fn test_empty_text_is_input_error() {
        let engine = ComplianceEngine::with_defaults().unwrap();
        let result = engine.analyze(&AnalysisRequest::new("  "));
        assert!(matches!(result, Err(EngineError::InputError(_))));
    }

    #[test]
    fn test_bad_composition_is_input_error() {
        let engine = ComplianceEngine::with_defaults().unwrap();
        let request = AnalysisRequest::new("Ley de Aguas")
            .with_composition(BodyComposition::with_present(10, 20));
        assert!(matches!(
            engine.analyze(&request),
            Err(EngineError::InputError(_))
        ));
    }

    #[test]
    fn test_clean_text() {
        let engine = ComplianceEngine::with_defaults().unwrap();
        let report = engine
            .analyze(
                &AnalysisRequest::new("Se crea el registro nacional de artesanos.")
                    .with_instrument(InstrumentType::Resolution),
            )
            .unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.risk_level, RiskLevel::None);
        assert_eq!(report.compliance_percentage, 100);
        assert!(report.feasibility.is_none());
        assert_eq!(report.knowledge_base_hash, engine.knowledge_base().fingerprint());
    }

    #[test]
    fn test_eternity_clause_is_critical() {
        let engine = ComplianceEngine::with_defaults().unwrap();
        let report = engine
            .analyze(&AnalysisRequest::new(
                "Ley de Seguridad. Se restablece la pena de muerte para delitos graves.",
            ))
            .unwrap();
        let finding = report.findings.iter().find(|f| f.article.get() == 43).unwrap();
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(report.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.detector.negation_discount = 2.0;
        let kb = Arc::new(KnowledgeBase::bundled().unwrap());
        assert!(matches!(
            ComplianceEngine::new(kb, config),
            Err(EngineError::ConfigError(_))
        ));
    }
}
