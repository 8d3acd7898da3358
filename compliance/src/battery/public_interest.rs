//! Public interest test.
//!
//! Compares justification phrases against restrictive-scope phrases. The
//! text fails when the ratio falls below the configured floor; a text that
//! restricts nothing passes.

use crate::battery::{BatteryInput, ComplianceTest};
use crate::config::BatteryConfig;
use crate::normalize::{Cue, NormalizedText};
use crate::types::{Evidence, TestId, TestVerdict};

/// Public interest test.
pub struct PublicInterestTest {
    justification: Vec<Cue>,
    restrictive: Vec<Cue>,
    ratio_floor: f64,
}

impl PublicInterestTest {
    /// Create the test from battery configuration.
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            justification: Cue::compile(&config.justification_cues),
            restrictive: Cue::compile(&config.restrictive_scope_cues),
            ratio_floor: config.public_interest_ratio_floor,
        }
    }

    /// Total occurrences of the cues, plus the labels of cues found.
    fn count(text: &NormalizedText, cues: &[Cue]) -> (usize, Vec<String>) {
        let mut total = 0;
        let mut found = Vec::new();
        for cue in cues {
            let n = text.cue_positions(cue, text.full_range()).len();
            if n > 0 {
                total += n;
                found.push(cue.label().to_string());
            }
        }
        (total, found)
    }
}

impl ComplianceTest for PublicInterestTest {
    fn id(&self) -> TestId {
        TestId::PublicInterest
    }

    fn run(&self, input: &BatteryInput<'_>) -> TestVerdict {
        let (restrictions, restrictive_cues) = Self::count(input.text, &self.restrictive);
        let (justifications, justification_cues) = Self::count(input.text, &self.justification);

        let evidence: Vec<Evidence> = restrictive_cues
            .into_iter()
            .chain(justification_cues)
            .map(Evidence::Cue)
            .collect();

        if restrictions == 0 {
            return TestVerdict {
                test: self.id(),
                passed: true,
                confidence: 0.9,
                evidence,
                articles: Vec::new(),
                summary: "Text restricts nothing that needs justification".to_string(),
            };
        }

        let ratio = justifications as f64 / restrictions as f64;
        let passed = ratio >= self.ratio_floor;
        let confidence = if passed {
            0.5 + 0.5 * ratio.min(1.0)
        } else if self.ratio_floor > 0.0 {
            0.5 + 0.5 * (1.0 - ratio / self.ratio_floor)
        } else {
            0.5
        };

        TestVerdict {
            test: self.id(),
            passed,
            confidence: confidence.clamp(0.0, 1.0),
            evidence,
            articles: Vec::new(),
            summary: format!(
                "{} justification(s) for {} restriction(s) (ratio {:.2}, floor {:.2})",
                justifications, restrictions, ratio, self.ratio_floor
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentClassification;
    use constitution::{InstrumentType, KnowledgeBase};

    fn verdict(text: &str) -> TestVerdict {
        let kb = KnowledgeBase::bundled().unwrap();
        let text = NormalizedText::new(text, 6).unwrap();
        let instrument = InstrumentClassification::declared(InstrumentType::OrdinaryLaw);
        PublicInterestTest::new(&BatteryConfig::default()).run(&BatteryInput {
            text: &text,
            findings: &[],
            kb: &kb,
            instrument: &instrument,
        })
    }

    #[test]
    fn test_unjustified_restrictions_fail() {
        let v = verdict("Se prohíbe la venta ambulante. Se restringe el horario. Se limita el aforo.");
        assert!(!v.passed);
    }

    #[test]
    fn test_justified_restriction_passes() {
        let v = verdict(
            "Por razones de salud pública se restringe el aforo, en forma proporcional y necesaria.",
        );
        assert!(v.passed);
        assert!(v.confidence >= 0.5);
    }

    #[test]
    fn test_no_restriction_passes() {
        let v = verdict("Se crea el registro nacional de artesanos.");
        assert!(v.passed);
        assert_eq!(v.summary, "Text restricts nothing that needs justification");
    }
}
