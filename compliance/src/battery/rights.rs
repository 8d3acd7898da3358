//! Rights impact (non-regression) test.
//!
//! Fails when a rights-tagged article has a HIGH finding and the text shows
//! no cue that a comparably protective prior regime is preserved. Otherwise
//! passes with confidence equal to the share of rights-tagged articles left
//! untouched.

use std::collections::BTreeSet;

use crate::battery::{finding_evidence, BatteryInput, ComplianceTest};
use crate::config::BatteryConfig;
use crate::normalize::Cue;
use crate::types::{Evidence, Severity, TestId, TestVerdict};

/// Rights impact test.
pub struct RightsImpactTest {
    prior_regime: Vec<Cue>,
}

impl RightsImpactTest {
    /// Create the test from battery configuration.
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            prior_regime: Cue::compile(&config.prior_regime_cues),
        }
    }
}

impl ComplianceTest for RightsImpactTest {
    fn id(&self) -> TestId {
        TestId::RightsImpact
    }

    fn run(&self, input: &BatteryInput<'_>) -> TestVerdict {
        let restricted: Vec<_> = input
            .findings
            .iter()
            .filter(|f| f.severity == Severity::High && f.flags.rights_tagged)
            .collect();
        let prior_regime = input
            .text
            .any_cue(&self.prior_regime, input.text.full_range());

        if !restricted.is_empty() && prior_regime.is_none() {
            let (evidence, articles) = finding_evidence(restricted.iter().copied());
            return TestVerdict {
                test: self.id(),
                passed: false,
                confidence: 0.85,
                evidence,
                summary: format!(
                    "{} right(s) restricted with no sign of an equally protective prior regime",
                    articles.len()
                ),
                articles,
            };
        }

        let touched: BTreeSet<_> = input
            .findings
            .iter()
            .filter(|f| f.flags.rights_tagged)
            .map(|f| f.article)
            .collect();
        let rights_articles = input
            .kb
            .articles()
            .iter()
            .filter(|a| a.is_rights_tagged())
            .count();
        let confidence = if rights_articles == 0 {
            1.0
        } else {
            rights_articles.saturating_sub(touched.len()) as f64 / rights_articles as f64
        };

        let (mut evidence, articles) = finding_evidence(restricted.iter().copied());
        if let Some(cue) = prior_regime {
            evidence.push(Evidence::Cue(cue.label().to_string()));
        }

        TestVerdict {
            test: self.id(),
            passed: true,
            confidence,
            evidence,
            articles,
            summary: match prior_regime {
                Some(_) if !restricted.is_empty() => {
                    "Restrictions are offset by a preserved prior regime".to_string()
                }
                _ => "No regressive restriction of constitutional rights".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::fixtures::finding;
    use crate::instrument::InstrumentClassification;
    use crate::normalize::NormalizedText;
    use constitution::{InstrumentType, KnowledgeBase};

    fn verdict(text: &str, severities: &[(u16, Severity)]) -> TestVerdict {
        let kb = KnowledgeBase::bundled().unwrap();
        let text = NormalizedText::new(text, 6).unwrap();
        let findings: Vec<_> = severities
            .iter()
            .map(|(n, s)| finding(&kb, *n, *s))
            .collect();
        let instrument = InstrumentClassification::declared(InstrumentType::OrdinaryLaw);
        RightsImpactTest::new(&BatteryConfig::default()).run(&BatteryInput {
            text: &text,
            findings: &findings,
            kb: &kb,
            instrument: &instrument,
        })
    }

    #[test]
    fn test_fails_on_high_rights_finding() {
        let v = verdict("Se prohíben las reuniones.", &[(53, Severity::High)]);
        assert!(!v.passed);
        assert_eq!(v.evidence, vec![Evidence::Finding(53.into())]);
    }

    #[test]
    fn test_prior_regime_cue_rescues() {
        let v = verdict(
            "Se prohíben las reuniones nocturnas; se mantiene el régimen vigente de permisos.",
            &[(53, Severity::High)],
        );
        assert!(v.passed);
        assert!(v.evidence.iter().any(|e| matches!(e, Evidence::Cue(_))));
    }

    #[test]
    fn test_confidence_is_share_of_untouched_rights() {
        let clean = verdict("Sin cambios.", &[]);
        assert!(clean.passed);
        assert_eq!(clean.confidence, 1.0);

        let touched = verdict("Sin cambios.", &[(53, Severity::Low), (57, Severity::Medium)]);
        assert!(touched.passed);
        assert!(touched.confidence < 1.0 && touched.confidence > 0.9);
    }

    #[test]
    fn test_high_finding_on_non_rights_article_is_ignored() {
        let v = verdict("texto", &[(302, Severity::High)]);
        assert!(v.passed);
    }
}
