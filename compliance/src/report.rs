//! Compliance report.

use serde::{Deserialize, Serialize};

use crate::feasibility::FeasibilityScorecard;
use crate::instrument::InstrumentClassification;
use crate::risk::{AmendmentRoute, Recommendation, RiskAssessment, SeverityCounts};
use crate::types::{ConflictFinding, RiskLevel, TestId, TestVerdict};

/// Result of one analysis. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// How the instrument type was determined
    pub instrument: InstrumentClassification,
    /// Findings in order of first match in the text
    pub findings: Vec<ConflictFinding>,
    /// Verdicts in canonical test order
    pub verdicts: Vec<TestVerdict>,
    /// Aggregate risk level
    pub risk_level: RiskLevel,
    /// Probability of annulment on review (0 - 100)
    pub nullity_probability: u8,
    /// Compliance percentage (0 - 100)
    pub compliance_percentage: u8,
    /// Ordered recommendations
    pub recommendations: Vec<Recommendation>,
    /// Findings per severity
    pub severity_counts: SeverityCounts,
    /// Constitutional change route, if required
    pub amendment_route: Option<AmendmentRoute>,
    /// Expected outcome of a constitutional review
    pub review_outlook: String,
    /// Fingerprint of the knowledge base used
    pub knowledge_base_hash: String,
    /// Feasibility of adoption, when a composition was supplied
    pub feasibility: Option<FeasibilityScorecard>,
}

impl ComplianceReport {
    pub(crate) fn assemble(
        instrument: InstrumentClassification,
        findings: Vec<ConflictFinding>,
        verdicts: Vec<TestVerdict>,
        risk: RiskAssessment,
        knowledge_base_hash: String,
        feasibility: Option<FeasibilityScorecard>,
    ) -> Self {
        Self {
            instrument,
            findings,
            verdicts,
            risk_level: risk.level,
            nullity_probability: risk.nullity_probability,
            compliance_percentage: risk.compliance_percentage,
            recommendations: risk.recommendations,
            severity_counts: risk.severity_counts,
            amendment_route: risk.amendment_route,
            review_outlook: risk.review_outlook,
            knowledge_base_hash,
            feasibility,
        }
    }

    /// Verdict of one test.
    pub fn verdict(&self, test: TestId) -> Option<&TestVerdict> {
        self.verdicts.iter().find(|v| v.test == test)
    }

    /// Tests that failed.
    pub fn failed_tests(&self) -> Vec<TestId> {
        self.verdicts
            .iter()
            .filter(|v| !v.passed)
            .map(|v| v.test)
            .collect()
    }

    /// Whether the text needs a constitutional change to stand.
    pub fn requires_constitutional_change(&self) -> bool {
        self.amendment_route.is_some()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
