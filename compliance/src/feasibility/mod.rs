//! Majority and feasibility calculator.
//!
//! Given an instrument, a body composition and an optional vote projection,
//! computes the quorum and vote thresholds, walks the adoption stages until
//! publication or rejection, lists known blockers and, when the projection
//! falls short, ranks fallback instruments.
//!
//! Vote thresholds are pure integer functions of body size and rule:
//! simple and absolute majorities are `base / 2 + 1`, qualified majorities
//! are `ceil(numerator × base / denominator)`.

pub mod blockers;
pub mod fallback;
mod timeline;

use serde::{Deserialize, Serialize};

use constitution::{InstrumentType, KnowledgeBase, MajorityRule, VoteBase};

use crate::config::FeasibilityConfig;
use crate::types::{BodyComposition, EngineError, Result};

/// Adoption stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Submission of the draft
    Initiative,
    /// First plenary discussion
    FirstDiscussion,
    /// Second plenary discussion
    SecondDiscussion,
    /// Third plenary discussion (constitutional reform)
    ThirdDiscussion,
    /// Enactment (sanción)
    Enactment,
    /// Approving referendum
    Referendum,
    /// Promulgation by the Executive
    Promulgation,
    /// Publication in the official gazette
    Publication,
    /// The process stops
    Rejected,
}

impl Stage {
    /// Whether the body votes at this stage.
    pub fn is_voting(&self) -> bool {
        matches!(
            self,
            Self::FirstDiscussion | Self::SecondDiscussion | Self::ThirdDiscussion
        )
    }
}

/// Projected outcome of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage is expected to complete
    Expected,
    /// The process stops at this stage
    Blocked,
}

/// Three-point risk rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskRating {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

/// Assessment of one adoption stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAssessment {
    /// Stage
    pub stage: Stage,
    /// Projected outcome
    pub outcome: StageOutcome,
    /// Risk of failing at this stage
    pub risk: RiskRating,
    /// Body or officer responsible
    pub responsible_body: String,
    /// Minimum expected duration in days
    pub min_days: u32,
    /// Maximum expected duration in days
    pub max_days: u32,
    /// What happens at the stage
    pub note: String,
}

/// Kind of blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerKind {
    /// Political failure mode
    Political,
    /// Legal failure mode
    Legal,
}

/// A known way the adoption can fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerFinding {
    /// Political or legal
    pub kind: BlockerKind,
    /// Short name
    pub name: String,
    /// Description
    pub description: String,
    /// Impact rating
    pub rating: RiskRating,
    /// Estimated probability (0.0 - 1.0)
    pub probability: f64,
    /// Suggested mitigation
    pub mitigation: String,
}

/// An alternative instrument for the same policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRoute {
    /// Alternative instrument
    pub instrument: InstrumentType,
    /// Votes the alternative needs from the same body (None for executive acts)
    pub votes_required: Option<u32>,
    /// Lawful under the context and carried by the projection
    pub reachable: bool,
    /// Why the route is or is not available
    pub rationale: String,
}

/// Qualitative feasibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeasibilityLevel {
    /// Below 0.2
    VeryLow,
    /// 0.2 to 0.4
    Low,
    /// 0.4 to 0.6
    Medium,
    /// 0.6 to 0.8
    High,
    /// 0.8 and above
    VeryHigh,
}

impl FeasibilityLevel {
    /// Level for a score in [0, 1].
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::VeryHigh
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    /// Recommended strategy for the level.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::VeryHigh | Self::High => {
                "Proceed with the standard legislative procedure; high probability of success."
            }
            Self::Medium => "Negotiate with minority blocs before submitting to a vote.",
            Self::Low | Self::VeryLow => {
                "Consider alternative routes or redraft the proposal to build broader consensus."
            }
        }
    }
}

/// Facts about the political and legal context of a proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityContext {
    /// Favorable votes expected among members present
    pub projected_votes: Option<u32>,
    /// The subject matter is reserved to organic law
    pub subject_requires_organic: bool,
    /// An enabling law delegating the matter is in force
    pub enabling_law_in_force: bool,
    /// A law exists that a regulation or resolution could develop
    pub base_law_exists: bool,
}

/// Input of a feasibility calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeasibilityQuery {
    /// Instrument to adopt
    pub instrument: InstrumentType,
    /// Voting body composition
    pub composition: BodyComposition,
    /// Context
    #[serde(default)]
    pub context: FeasibilityContext,
}

impl FeasibilityQuery {
    /// Query with an empty context.
    pub fn new(instrument: InstrumentType, composition: BodyComposition) -> Self {
        Self {
            instrument,
            composition,
            context: FeasibilityContext::default(),
        }
    }

    /// Set the projected favorable votes.
    pub fn with_projected_votes(mut self, votes: u32) -> Self {
        self.context.projected_votes = Some(votes);
        self
    }

    /// Replace the context.
    pub fn with_context(mut self, context: FeasibilityContext) -> Self {
        self.context = context;
        self
    }
}

/// Feasibility of adopting an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityScorecard {
    /// Instrument assessed
    pub instrument: InstrumentType,
    /// Majority rule applied
    pub rule: MajorityRule,
    /// Human-readable rule
    pub rule_description: String,
    /// Members required to sit
    pub quorum_required: u32,
    /// Whether attendance reaches quorum (always true for executive acts)
    pub quorum_met: bool,
    /// Population the majority is computed over
    pub vote_base: VoteBase,
    /// Size of that population
    pub base_count: u32,
    /// Favorable votes required
    pub votes_required: u32,
    /// Projected favorable votes, if supplied
    pub projected_votes: Option<u32>,
    /// Ordered stage assessments up to the terminal stage
    pub timeline: Vec<StageAssessment>,
    /// PUBLICATION or REJECTED
    pub terminal_stage: Stage,
    /// Sum of minimum stage durations
    pub total_min_days: u32,
    /// Sum of maximum stage durations
    pub total_max_days: u32,
    /// Known blockers
    pub blockers: Vec<BlockerFinding>,
    /// Ranked fallbacks (empty unless the projection falls short)
    pub fallbacks: Vec<FallbackRoute>,
    /// Score in [0, 1]
    pub feasibility_score: f64,
    /// Qualitative level of the score
    pub feasibility_level: FeasibilityLevel,
    /// Suggested strategy
    pub recommended_strategy: String,
}

/// Computes [`FeasibilityScorecard`]s against the knowledge base's threshold
/// table.
pub struct FeasibilityCalculator<'a> {
    kb: &'a KnowledgeBase,
    config: &'a FeasibilityConfig,
}

impl<'a> FeasibilityCalculator<'a> {
    /// Create a calculator.
    pub fn new(kb: &'a KnowledgeBase, config: &'a FeasibilityConfig) -> Self {
        Self { kb, config }
    }

    /// Votes required to adopt `instrument` with the given composition.
    pub fn votes_required(
        &self,
        instrument: InstrumentType,
        composition: &BodyComposition,
    ) -> Result<u32> {
        composition.validate()?;
        let rule = self.kb.majority_rule(instrument)?;
        Ok(rule.votes_required(composition.base_count(rule.base)))
    }

    /// Members required for a valid session.
    pub fn quorum_required(&self, composition: &BodyComposition) -> Result<u32> {
        composition.validate()?;
        Ok(self.config.quorum.required(composition.total))
    }

    /// Assess a query.
    pub fn assess(&self, query: &FeasibilityQuery) -> Result<FeasibilityScorecard> {
        let composition = &query.composition;
        composition.validate()?;
        let present = composition.present_count();
        let projected = query.context.projected_votes;
        if let Some(votes) = projected {
            if votes > present {
                return Err(EngineError::InputError(format!(
                    "{} projected votes exceed the {} members present",
                    votes, present
                )));
            }
        }

        let rule = self.kb.majority_rule(query.instrument)?.clone();
        let base_count = composition.base_count(rule.base);
        let votes_required = rule.votes_required(base_count);
        let quorum_required = self.config.quorum.required(composition.total);
        // Executive acts are issued without a vote of the body.
        let deliberative = query.instrument.is_deliberative();
        let quorum_met = !deliberative || present >= quorum_required;
        let unreachable = deliberative && votes_required > present;
        let short = deliberative && projected.map_or(false, |v| v < votes_required);

        let mut blockers = blockers::standard_blockers(query.instrument);
        if !quorum_met {
            blockers.push(blockers::quorum_shortfall(present, quorum_required));
        }
        if unreachable {
            blockers.push(blockers::threshold_unreachable(present, votes_required));
        } else if let (true, Some(votes)) = (short, projected) {
            blockers.push(blockers::vote_shortfall(votes, votes_required));
        }

        let (timeline, terminal_stage) = self.walk(
            query.instrument,
            &rule,
            quorum_met,
            unreachable,
            projected.filter(|_| deliberative),
            votes_required,
        );

        let fallbacks = if short || unreachable {
            fallback::fallbacks(self.kb, query.instrument, composition, &query.context)?
        } else {
            Vec::new()
        };

        let estimated = if deliberative {
            projected.unwrap_or(composition.total / 2)
        } else {
            votes_required
        };
        let feasibility_score = self.score(estimated, votes_required, &blockers);
        let feasibility_level = FeasibilityLevel::from_score(feasibility_score);

        let scorecard = FeasibilityScorecard {
            instrument: query.instrument,
            rule_description: rule.describe(),
            vote_base: rule.base,
            rule,
            quorum_required,
            quorum_met,
            base_count,
            votes_required,
            projected_votes: projected,
            total_min_days: timeline.iter().map(|s| s.min_days).sum(),
            total_max_days: timeline.iter().map(|s| s.max_days).sum(),
            timeline,
            terminal_stage,
            blockers,
            fallbacks,
            feasibility_score,
            feasibility_level,
            recommended_strategy: feasibility_level.strategy().to_string(),
        };

        tracing::debug!(
            instrument = %scorecard.instrument,
            votes_required = scorecard.votes_required,
            quorum_required = scorecard.quorum_required,
            terminal = ?scorecard.terminal_stage,
            score = scorecard.feasibility_score,
            "Feasibility assessed"
        );
        Ok(scorecard)
    }

    /// Walk the stage plan, stopping at the first voting stage that fails.
    fn walk(
        &self,
        instrument: InstrumentType,
        rule: &MajorityRule,
        quorum_met: bool,
        unreachable: bool,
        projected: Option<u32>,
        votes_required: u32,
    ) -> (Vec<StageAssessment>, Stage) {
        let mut timeline = Vec::new();
        for plan in timeline::plan(instrument, rule) {
            let mut assessment = StageAssessment {
                stage: plan.stage,
                outcome: StageOutcome::Expected,
                risk: RiskRating::Low,
                responsible_body: plan.responsible.to_string(),
                min_days: plan.min_days,
                max_days: plan.max_days,
                note: plan.description.to_string(),
            };

            if plan.stage.is_voting() {
                let failure = if !quorum_met {
                    Some("quorum not reached".to_string())
                } else if unreachable {
                    Some(format!(
                        "{} votes required exceed attendance",
                        votes_required
                    ))
                } else {
                    projected
                        .filter(|v| *v < votes_required)
                        .map(|v| format!("{} of {} required votes projected", v, votes_required))
                };

                if let Some(reason) = failure {
                    assessment.outcome = StageOutcome::Blocked;
                    assessment.risk = RiskRating::High;
                    assessment.note = format!("{}: {}", plan.description, reason);
                    timeline.push(assessment);
                    return (timeline, Stage::Rejected);
                }
                assessment.risk = if instrument.is_deliberative() {
                    self.margin_risk(projected, votes_required)
                } else {
                    RiskRating::Low
                };
            } else if plan.stage == Stage::Referendum {
                assessment.risk = RiskRating::Medium;
            }
            timeline.push(assessment);
        }
        (timeline, Stage::Publication)
    }

    /// Risk of a vote from the projected margin over the threshold.
    fn margin_risk(&self, projected: Option<u32>, required: u32) -> RiskRating {
        let Some(votes) = projected else {
            return RiskRating::Medium;
        };
        if votes < required {
            return RiskRating::High;
        }
        let margin = (votes - required) as f64 / required.max(1) as f64;
        if margin < self.config.narrow_margin {
            RiskRating::Medium
        } else {
            RiskRating::Low
        }
    }

    /// Vote ratio (capped at 1) minus weighted blocker probabilities,
    /// floored at 0 and rounded to two decimals.
    fn score(&self, estimated: u32, required: u32, blockers: &[BlockerFinding]) -> f64 {
        let base = if required > 0 {
            (estimated as f64 / required as f64).min(1.0)
        } else {
            1.0
        };
        let weights = &self.config.blocker_weights;
        let penalty: f64 = blockers
            .iter()
            .map(|b| {
                b.probability
                    * match b.rating {
                        RiskRating::High => weights.high,
                        RiskRating::Medium => weights.medium,
                        RiskRating::Low => weights.low,
                    }
            })
            .sum();
        ((base - penalty).max(0.0) * 100.0).round() / 100.0
    }
}
