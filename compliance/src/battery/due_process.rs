//! Due process test.
//!
//! Fails when the text sets up sanctions or procedures without a single
//! procedural safeguard (notice, hearing, appeal, defense).

use crate::battery::{BatteryInput, ComplianceTest};
use crate::config::BatteryConfig;
use crate::normalize::Cue;
use crate::types::{Evidence, TestId, TestVerdict};
use constitution::ArticleNumber;

/// Article guaranteeing due process.
const DUE_PROCESS_ARTICLE: ArticleNumber = ArticleNumber(49);

/// Due process test.
pub struct DueProcessTest {
    triggers: Vec<Cue>,
    safeguards: Vec<(String, Vec<Cue>)>,
}

impl DueProcessTest {
    /// Create the test from battery configuration.
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            triggers: Cue::compile(&config.sanction_triggers),
            safeguards: config
                .safeguards
                .iter()
                .map(|c| (c.name.clone(), Cue::compile(&c.cues)))
                .collect(),
        }
    }
}

impl ComplianceTest for DueProcessTest {
    fn id(&self) -> TestId {
        TestId::DueProcess
    }

    fn run(&self, input: &BatteryInput<'_>) -> TestVerdict {
        let range = input.text.full_range();
        let triggers: Vec<&Cue> = self
            .triggers
            .iter()
            .filter(|cue| !input.text.cue_positions(cue, range.clone()).is_empty())
            .collect();

        if triggers.is_empty() {
            return TestVerdict {
                test: self.id(),
                passed: true,
                confidence: 0.95,
                evidence: Vec::new(),
                articles: Vec::new(),
                summary: "Text sets up no sanction or procedure".to_string(),
            };
        }

        let covered: Vec<(&str, &Cue)> = self
            .safeguards
            .iter()
            .filter_map(|(name, cues)| {
                input
                    .text
                    .any_cue(cues, range.clone())
                    .map(|cue| (name.as_str(), cue))
            })
            .collect();

        let mut evidence: Vec<Evidence> = triggers
            .iter()
            .map(|cue| Evidence::Cue(cue.label().to_string()))
            .collect();
        evidence.extend(
            covered
                .iter()
                .map(|(_, cue)| Evidence::Cue(cue.label().to_string())),
        );

        if covered.is_empty() {
            return TestVerdict {
                test: self.id(),
                passed: false,
                confidence: 0.9,
                evidence,
                articles: vec![DUE_PROCESS_ARTICLE],
                summary: "Sanctions or procedures without notice, hearing, appeal or defense"
                    .to_string(),
            };
        }

        let categories = self.safeguards.len().max(1) as f64;
        let missing: Vec<&str> = self
            .safeguards
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !covered.iter().any(|(c, _)| c == name))
            .collect();

        TestVerdict {
            test: self.id(),
            passed: true,
            confidence: 0.5 + 0.5 * covered.len() as f64 / categories,
            evidence,
            articles: vec![DUE_PROCESS_ARTICLE],
            summary: if missing.is_empty() {
                "All procedural safeguards present".to_string()
            } else {
                format!("Safeguards present; missing: {}", missing.join(", "))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentClassification;
    use crate::normalize::NormalizedText;
    use constitution::{InstrumentType, KnowledgeBase};

    fn verdict(text: &str) -> TestVerdict {
        let kb = KnowledgeBase::bundled().unwrap();
        let text = NormalizedText::new(text, 6).unwrap();
        let instrument = InstrumentClassification::declared(InstrumentType::OrdinaryLaw);
        DueProcessTest::new(&BatteryConfig::default()).run(&BatteryInput {
            text: &text,
            findings: &[],
            kb: &kb,
            instrument: &instrument,
        })
    }

    #[test]
    fn test_sanction_without_safeguards_fails() {
        let v = verdict("La autoridad impondrá multas de inmediato a los infractores.");
        assert!(!v.passed);
        assert_eq!(v.articles, vec![DUE_PROCESS_ARTICLE]);
        assert!(v.evidence.contains(&Evidence::Cue("multa".to_string())));
    }

    #[test]
    fn test_any_safeguard_passes() {
        let v = verdict(
            "La sanción se impondrá previa notificación al interesado, quien podrá interponer recurso de reconsideración.",
        );
        assert!(v.passed);
        assert!(v.summary.contains("hearing"));
        assert!(v.confidence > 0.5 && v.confidence < 1.0);
    }

    #[test]
    fn test_no_trigger_passes() {
        let v = verdict("Se crea el Consejo Nacional de Cultura.");
        assert!(v.passed);
        assert!(v.evidence.is_empty());
    }
}
