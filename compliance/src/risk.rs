//! Risk aggregation.
//!
//! Folds findings and verdicts into one risk level, a nullity probability,
//! a compliance percentage and an ordered list of recommendations. Every
//! output is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use constitution::ArticleNumber;

use crate::config::RiskConfig;
use crate::types::{ConflictFinding, RiskLevel, Severity, SeverityRuleId, TestId, TestVerdict};

/// Number of findings per severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Critical findings
    pub critical: usize,
    /// High findings
    pub high: usize,
    /// Medium findings
    pub medium: usize,
    /// Low findings
    pub low: usize,
}

impl SeverityCounts {
    /// Count findings by severity.
    pub fn from_findings(findings: &[ConflictFinding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    /// Count for one tier.
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// Total number of findings.
    pub fn total(&self) -> usize {
        Severity::descending().iter().map(|s| self.get(*s)).sum()
    }
}

/// What produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RecommendationSource {
    /// A finding against an article
    Finding(ArticleNumber),
    /// A failed compliance test
    Test(TestId),
}

/// A corrective action for the drafters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Priority of the action
    pub priority: Severity,
    /// What produced it
    pub source: RecommendationSource,
    /// Action text
    pub text: String,
}

/// Constitutional change route a critical finding calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmendmentRoute {
    /// Enmienda (Art. 340)
    Amendment,
    /// Reforma constitucional (Art. 342)
    Reform,
    /// Asamblea Nacional Constituyente (Art. 347)
    ConstituentAssembly,
}

impl AmendmentRoute {
    /// Legal name of the route.
    pub fn legal_name(&self) -> &'static str {
        match self {
            Self::Amendment => "Enmienda Constitucional (Art. 340)",
            Self::Reform => "Reforma Constitucional (Art. 342)",
            Self::ConstituentAssembly => "Asamblea Nacional Constituyente (Art. 347)",
        }
    }
}

/// Aggregated risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Aggregate level
    pub level: RiskLevel,
    /// Probability of annulment on review (0 - 100)
    pub nullity_probability: u8,
    /// Compliance percentage (0 - 100)
    pub compliance_percentage: u8,
    /// Findings per severity
    pub severity_counts: SeverityCounts,
    /// Ordered, deduplicated recommendations
    pub recommendations: Vec<Recommendation>,
    /// Constitutional change route, if any finding demands one
    pub amendment_route: Option<AmendmentRoute>,
    /// Expected outcome of a constitutional review
    pub review_outlook: String,
}

/// Aggregates findings and verdicts into a [`RiskAssessment`].
pub struct RiskAggregator {
    config: RiskConfig,
}

impl RiskAggregator {
    /// Create an aggregator.
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Assess findings and verdicts.
    pub fn assess(&self, findings: &[ConflictFinding], verdicts: &[TestVerdict]) -> RiskAssessment {
        let counts = SeverityCounts::from_findings(findings);
        let level = Self::level(&counts, verdicts);
        let assessment = RiskAssessment {
            level,
            nullity_probability: self.nullity(level, &counts),
            compliance_percentage: self.compliance(&counts),
            severity_counts: counts,
            recommendations: Self::recommendations(findings, verdicts),
            amendment_route: Self::amendment_route(findings),
            review_outlook: review_outlook(level).to_string(),
        };

        tracing::debug!(
            level = %assessment.level,
            nullity = assessment.nullity_probability,
            compliance = assessment.compliance_percentage,
            recommendations = assessment.recommendations.len(),
            "Risk aggregated"
        );
        assessment
    }

    /// Aggregate risk level.
    pub fn level(counts: &SeverityCounts, verdicts: &[TestVerdict]) -> RiskLevel {
        let supremacy_failed = verdicts
            .iter()
            .any(|v| v.test == TestId::Supremacy && !v.passed);
        let other_failures = verdicts
            .iter()
            .filter(|v| v.test != TestId::Supremacy && !v.passed)
            .count();

        if counts.critical > 0 || supremacy_failed {
            RiskLevel::Critical
        } else if counts.high > 0 || other_failures >= 2 {
            RiskLevel::High
        } else if counts.medium > 0 || other_failures == 1 {
            RiskLevel::Medium
        } else if counts.low > 0 {
            RiskLevel::Low
        } else {
            RiskLevel::None
        }
    }

    fn nullity(&self, level: RiskLevel, counts: &SeverityCounts) -> u8 {
        let base = &self.config.nullity_base;
        let base = match level {
            RiskLevel::None => base.none,
            RiskLevel::Low => base.low,
            RiskLevel::Medium => base.medium,
            RiskLevel::High => base.high,
            RiskLevel::Critical => base.critical,
        } as u64;
        let total = base
            + self.config.nullity_per_critical as u64 * counts.critical as u64
            + self.config.nullity_per_high as u64 * counts.high as u64;
        total.min(100) as u8
    }

    fn compliance(&self, counts: &SeverityCounts) -> u8 {
        let weights = &self.config.compliance_penalties;
        let penalty: u64 = Severity::descending()
            .iter()
            .map(|s| weights.get(*s) as u64 * counts.get(*s) as u64)
            .sum();
        100u64.saturating_sub(penalty) as u8
    }

    /// Recommendations ordered by priority, then emission order (findings
    /// before tests). Duplicate texts keep their first occurrence.
    fn recommendations(findings: &[ConflictFinding], verdicts: &[TestVerdict]) -> Vec<Recommendation> {
        let mut emitted: Vec<Recommendation> = findings
            .iter()
            .map(|f| Recommendation {
                priority: f.severity,
                source: RecommendationSource::Finding(f.article),
                text: finding_template(f),
            })
            .collect();
        emitted.extend(
            verdicts
                .iter()
                .filter(|v| !v.passed)
                .map(|v| Recommendation {
                    priority: test_priority(v.test),
                    source: RecommendationSource::Test(v.test),
                    text: test_template(v.test).to_string(),
                }),
        );

        // Stable sort keeps emission order within a priority.
        emitted.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut seen = std::collections::HashSet::new();
        emitted.retain(|r| seen.insert(r.text.clone()));
        emitted
    }

    fn amendment_route(findings: &[ConflictFinding]) -> Option<AmendmentRoute> {
        findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .map(|f| {
                if f.flags.is_eternity_clause {
                    AmendmentRoute::ConstituentAssembly
                } else if f.flags.state_reservation {
                    AmendmentRoute::Reform
                } else {
                    AmendmentRoute::Amendment
                }
            })
            .max()
    }
}

fn finding_template(finding: &ConflictFinding) -> String {
    let article = format!("Art. {} ({})", finding.article, finding.article_title);
    match (finding.severity, finding.rule) {
        (Severity::Critical, SeverityRuleId::EternityClause) => format!(
            "{}: the provision touches a fundamental principle and cannot be adopted without a National Constituent Assembly; remove it.",
            article
        ),
        (Severity::Critical, SeverityRuleId::StateReservationTransfer) => format!(
            "{}: withdraw the transfer or reduction of State ownership; the reservation can only change through constitutional reform.",
            article
        ),
        (Severity::Critical, _) => format!(
            "{}: the provision cannot stand without a constitutional change; remove or redraft it.",
            article
        ),
        (Severity::High, _) => format!(
            "{}: tie the restriction to a judicial order, prior hearing and right of defense, or narrow its scope.",
            article
        ),
        (Severity::Medium, SeverityRuleId::OrganicLawReserve) => format!(
            "{}: redraft as an organic law and secure the qualified majority it requires.",
            article
        ),
        (Severity::Medium, _) => format!(
            "{}: verify the instrument has rank to regulate this matter.",
            article
        ),
        (Severity::Low, _) => format!(
            "{}: review the wording that refers to this article.",
            article
        ),
    }
}

fn test_priority(test: TestId) -> Severity {
    match test {
        TestId::Supremacy => Severity::Critical,
        TestId::RightsImpact | TestId::DueProcess => Severity::High,
        TestId::Competence | TestId::PublicInterest => Severity::Medium,
    }
}

fn test_template(test: TestId) -> &'static str {
    match test {
        TestId::Supremacy => {
            "Remove every provision that contradicts the Constitution before submitting the text."
        }
        TestId::RightsImpact => {
            "Preserve the prior level of protection: state that existing rights are maintained and apply the pro persona principle."
        }
        TestId::Competence => {
            "Adopt the text through an instrument of sufficient rank, or cite the law that delegates the competence."
        }
        TestId::DueProcess => {
            "Add procedural safeguards: prior notification, hearing, right of defense and an appeal route before any sanction."
        }
        TestId::PublicInterest => {
            "State the public-interest purpose of each restriction and show it is suitable, necessary and proportionate."
        }
    }
}

/// Expected outcome of a review by the Constitutional Chamber.
pub fn review_outlook(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::None => "Constitutionality expected to be upheld; minimal litigation risk.",
        RiskLevel::Low => "Likely upheld; a constitutional challenge has low odds of success.",
        RiskLevel::Medium => {
            "Outcome uncertain; depends on the facts and the quality of the argumentation."
        }
        RiskLevel::High => {
            "Significant risk of an adverse ruling; a constitutional challenge is likely to succeed."
        }
        RiskLevel::Critical => {
            "The Constitutional Chamber is likely to declare the text unconstitutional."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::fixtures::finding;
    use constitution::KnowledgeBase;

    fn verdict(test: TestId, passed: bool) -> TestVerdict {
        TestVerdict {
            test,
            passed,
            confidence: 0.9,
            evidence: Vec::new(),
            articles: Vec::new(),
            summary: String::new(),
        }
    }

    fn passing() -> Vec<TestVerdict> {
        TestId::all().iter().map(|t| verdict(*t, true)).collect()
    }

    #[test]
    fn test_clean_text_has_no_risk() {
        let risk = RiskAggregator::new(&RiskConfig::default()).assess(&[], &passing());
        assert_eq!(risk.level, RiskLevel::None);
        assert_eq!(risk.nullity_probability, 5);
        assert_eq!(risk.compliance_percentage, 100);
        assert!(risk.recommendations.is_empty());
        assert_eq!(risk.amendment_route, None);
    }

    #[test]
    fn test_level_ladder() {
        let none = SeverityCounts::default();
        let mut verdicts = passing();
        assert_eq!(RiskAggregator::level(&none, &verdicts), RiskLevel::None);

        let low = SeverityCounts { low: 2, ..none };
        assert_eq!(RiskAggregator::level(&low, &verdicts), RiskLevel::Low);

        verdicts[3].passed = false;
        assert_eq!(RiskAggregator::level(&low, &verdicts), RiskLevel::Medium);

        verdicts[4].passed = false;
        assert_eq!(RiskAggregator::level(&none, &verdicts), RiskLevel::High);

        verdicts[0].passed = false;
        assert_eq!(RiskAggregator::level(&none, &verdicts), RiskLevel::Critical);
    }

    #[test]
    fn test_critical_finding_scores() {
        let kb = KnowledgeBase::bundled().unwrap();
        let findings = vec![
            finding(&kb, 303, Severity::Critical),
            finding(&kb, 53, Severity::High),
        ];
        let risk = RiskAggregator::new(&RiskConfig::default()).assess(&findings, &passing());
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(risk.nullity_probability, 85 + 5 + 3);
        assert_eq!(risk.compliance_percentage, 40);
        assert_eq!(risk.severity_counts.total(), 2);
        assert_eq!(risk.amendment_route, Some(AmendmentRoute::Reform));
    }

    #[test]
    fn test_bounds_are_clamped() {
        let kb = KnowledgeBase::bundled().unwrap();
        let findings: Vec<_> = [303, 302, 43, 116]
            .iter()
            .map(|n| finding(&kb, *n, Severity::Critical))
            .collect();
        let risk = RiskAggregator::new(&RiskConfig::default()).assess(&findings, &passing());
        assert_eq!(risk.nullity_probability, 100);
        assert_eq!(risk.compliance_percentage, 0);
    }

    #[test]
    fn test_eternity_clause_needs_constituent_assembly() {
        let kb = KnowledgeBase::bundled().unwrap();
        let eternal = kb.eternity_clauses()[0].number;
        let findings = vec![
            finding(&kb, 303, Severity::Critical),
            finding(&kb, eternal.get(), Severity::Critical),
        ];
        let risk = RiskAggregator::new(&RiskConfig::default()).assess(&findings, &passing());
        assert_eq!(risk.amendment_route, Some(AmendmentRoute::ConstituentAssembly));
    }

    #[test]
    fn test_recommendations_ordered_and_deduplicated() {
        let kb = KnowledgeBase::bundled().unwrap();
        let findings = vec![
            finding(&kb, 53, Severity::Low),
            finding(&kb, 89, Severity::Medium),
        ];
        let mut verdicts = passing();
        verdicts[3].passed = false;
        verdicts.push(verdict(TestId::DueProcess, false));

        let risk = RiskAggregator::new(&RiskConfig::default()).assess(&findings, &verdicts);
        let priorities: Vec<Severity> = risk.recommendations.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            vec![Severity::High, Severity::Medium, Severity::Low]
        );
        assert_eq!(
            risk.recommendations[0].source,
            RecommendationSource::Test(TestId::DueProcess)
        );
        assert!(risk.recommendations[0].text.starts_with("Add procedural safeguards"));
    }

    #[test]
    fn test_nullity_monotone_in_level() {
        let aggregator = RiskAggregator::new(&RiskConfig::default());
        let counts = SeverityCounts::default();
        let levels = [
            RiskLevel::None,
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ];
        let values: Vec<u8> = levels.iter().map(|l| aggregator.nullity(*l, &counts)).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }
}
