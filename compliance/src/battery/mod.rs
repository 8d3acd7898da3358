//! Compliance test battery.
//!
//! Five independent tests run over the same read-only input. No test reads
//! another's verdict, so the battery can fan out across the rayon pool; the
//! verdicts are merged back in canonical [`TestId`] order.

pub mod competence;
pub mod due_process;
pub mod public_interest;
pub mod rights;
pub mod supremacy;

pub use competence::CompetenceTest;
pub use due_process::DueProcessTest;
pub use public_interest::PublicInterestTest;
pub use rights::RightsImpactTest;
pub use supremacy::SupremacyTest;

use rayon::prelude::*;

use constitution::KnowledgeBase;

use crate::config::BatteryConfig;
use crate::instrument::InstrumentClassification;
use crate::normalize::NormalizedText;
use crate::types::{ConflictFinding, Evidence, TestId, TestVerdict};

/// Everything a test may read.
pub struct BatteryInput<'a> {
    /// Normalized input text
    pub text: &'a NormalizedText,
    /// Classified findings
    pub findings: &'a [ConflictFinding],
    /// Knowledge base
    pub kb: &'a KnowledgeBase,
    /// Instrument classification
    pub instrument: &'a InstrumentClassification,
}

/// Trait for an independent compliance test.
pub trait ComplianceTest: Send + Sync {
    /// Which test this is
    fn id(&self) -> TestId;

    /// Run the test
    fn run(&self, input: &BatteryInput<'_>) -> TestVerdict;
}

/// The fixed battery of compliance tests.
pub struct TestBattery {
    tests: Vec<Box<dyn ComplianceTest>>,
    parallel: bool,
}

impl TestBattery {
    /// The five standard tests.
    pub fn new(config: &BatteryConfig) -> Self {
        let tests: Vec<Box<dyn ComplianceTest>> = vec![
            Box::new(SupremacyTest),
            Box::new(RightsImpactTest::new(config)),
            Box::new(CompetenceTest),
            Box::new(DueProcessTest::new(config)),
            Box::new(PublicInterestTest::new(config)),
        ];
        Self {
            tests,
            parallel: config.parallel,
        }
    }

    /// Run every test and return the verdicts in canonical order.
    pub fn run(&self, input: &BatteryInput<'_>) -> Vec<TestVerdict> {
        let mut verdicts: Vec<TestVerdict> = if self.parallel {
            self.tests.par_iter().map(|t| t.run(input)).collect()
        } else {
            self.tests.iter().map(|t| t.run(input)).collect()
        };
        verdicts.sort_by_key(|v| v.test);

        let failed = verdicts.iter().filter(|v| !v.passed).count();
        tracing::debug!(
            tests = verdicts.len(),
            failed,
            parallel = self.parallel,
            "Test battery finished"
        );
        verdicts
    }
}

/// Evidence entries for a set of findings.
pub(crate) fn finding_evidence<'a>(
    findings: impl IntoIterator<Item = &'a ConflictFinding>,
) -> (Vec<Evidence>, Vec<constitution::ArticleNumber>) {
    let mut evidence = Vec::new();
    let mut articles = Vec::new();
    for finding in findings {
        evidence.push(Evidence::Finding(finding.article));
        if !articles.contains(&finding.article) {
            articles.push(finding.article);
        }
    }
    (evidence, articles)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use constitution::{ArticleNumber, KnowledgeBase};

    use crate::types::{ConflictFinding, MatchedSpan, Severity, SeverityRuleId};

    /// A finding against a catalog article with the given severity.
    pub fn finding(kb: &KnowledgeBase, number: u16, severity: Severity) -> ConflictFinding {
        let article = kb.get_article(number).unwrap();
        ConflictFinding {
            article: ArticleNumber(number),
            article_title: article.title.clone(),
            flags: article.into(),
            span: MatchedSpan {
                text: article.keywords[0].clone(),
                start: 0,
                end: article.keywords[0].len(),
            },
            matched_keywords: vec![article.keywords[0].clone()],
            score: 1.0,
            severity,
            rule: SeverityRuleId::Residual,
            rationale: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::classify;
    use crate::types::Severity;

    fn run(parallel: bool) -> Vec<TestVerdict> {
        let kb = KnowledgeBase::bundled().unwrap();
        let config = BatteryConfig {
            parallel,
            ..BatteryConfig::default()
        };
        let text = NormalizedText::new(
            "Se impondrá multa sin procedimiento previo. Se prohíben las reuniones públicas.",
            6,
        )
        .unwrap();
        let findings = vec![fixtures::finding(&kb, 53, Severity::High)];
        let instrument = classify(&text, None);
        let input = BatteryInput {
            text: &text,
            findings: &findings,
            kb: &kb,
            instrument: &instrument,
        };
        TestBattery::new(&config).run(&input)
    }

    #[test]
    fn test_verdicts_in_canonical_order() {
        let verdicts = run(true);
        let ids: Vec<TestId> = verdicts.iter().map(|v| v.test).collect();
        assert_eq!(ids, TestId::all().to_vec());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        assert_eq!(run(true), run(false));
    }

    #[test]
    fn test_confidence_in_unit_range() {
        for verdict in run(false) {
            assert!((0.0..=1.0).contains(&verdict.confidence), "{:?}", verdict);
        }
    }
}
