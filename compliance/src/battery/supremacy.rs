//! Constitutional supremacy test.
//!
//! Fails iff any finding is CRITICAL (eternity clause or State reservation
//! reduced or transferred).

use crate::battery::{finding_evidence, BatteryInput, ComplianceTest};
use crate::types::{Severity, TestId, TestVerdict};

/// Supremacy test.
pub struct SupremacyTest;

impl ComplianceTest for SupremacyTest {
    fn id(&self) -> TestId {
        TestId::Supremacy
    }

    fn run(&self, input: &BatteryInput<'_>) -> TestVerdict {
        let critical: Vec<_> = input
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .collect();
        let (evidence, articles) = finding_evidence(critical.iter().copied());

        if critical.is_empty() {
            let high = input
                .findings
                .iter()
                .filter(|f| f.severity == Severity::High)
                .count();
            return TestVerdict {
                test: self.id(),
                passed: true,
                confidence: (0.95 - 0.05 * high as f64).max(0.7),
                evidence,
                articles,
                summary: "No finding touches an eternity clause or a State reservation".to_string(),
            };
        }

        TestVerdict {
            test: self.id(),
            passed: false,
            confidence: (0.85 + 0.05 * critical.len() as f64).min(0.99),
            evidence,
            summary: format!(
                "{} provision(s) conflict with unamendable or reserved constitutional matter",
                articles.len()
            ),
            articles,
        }
    }
}
