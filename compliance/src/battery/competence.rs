//! Competence test.
//!
//! Every MEDIUM or HIGH finding implies the rank of instrument needed to
//! regulate the matter: organic when the article reserves it to an organic
//! law, statutory otherwise. The test fails when the instrument's authority
//! tier does not dominate one of those implied tiers.

use constitution::AuthorityTier;

use crate::battery::{finding_evidence, BatteryInput, ComplianceTest};
use crate::types::{ConflictFinding, Severity, TestId, TestVerdict};

/// Competence test.
pub struct CompetenceTest;

/// Tier a finding requires of the regulating instrument.
fn implied_tier(finding: &ConflictFinding) -> AuthorityTier {
    if finding.flags.requires_organic_law {
        AuthorityTier::Organic
    } else {
        AuthorityTier::Statutory
    }
}

impl ComplianceTest for CompetenceTest {
    fn id(&self) -> TestId {
        TestId::Competence
    }

    fn run(&self, input: &BatteryInput<'_>) -> TestVerdict {
        let tier = input.instrument.instrument.authority_tier();
        let outranked: Vec<_> = input
            .findings
            .iter()
            .filter(|f| matches!(f.severity, Severity::Medium | Severity::High))
            .filter(|f| !tier.dominates(&implied_tier(f)))
            .collect();

        // An inferred instrument type weakens either verdict.
        let confidence = 0.5 + 0.45 * input.instrument.confidence;
        let (evidence, articles) = finding_evidence(outranked.iter().copied());

        if outranked.is_empty() {
            return TestVerdict {
                test: self.id(),
                passed: true,
                confidence,
                evidence,
                articles,
                summary: format!(
                    "{} has sufficient rank for the matters it regulates",
                    input.instrument.instrument.legal_name()
                ),
            };
        }

        let required = outranked
            .iter()
            .map(|f| implied_tier(f))
            .max()
            .unwrap_or(AuthorityTier::Statutory);
        TestVerdict {
            test: self.id(),
            passed: false,
            confidence,
            evidence,
            articles,
            summary: format!(
                "{} ({:?} tier) cannot regulate matter requiring the {:?} tier",
                input.instrument.instrument.legal_name(),
                tier,
                required
            ),
        }
    }
}
