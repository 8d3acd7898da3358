//! Severity classifier.
//!
//! An ordered rule list evaluated top to bottom; the first rule whose
//! condition holds sets the severity. Conditions only read the article, the
//! tokens around the match and the declared instrument, so classification is
//! a pure function of that triple.

use std::ops::Range;

use regex::Regex;

use constitution::{ConstitutionalArticle, InstrumentType};

use crate::config::SeverityConfig;
use crate::normalize::{Cue, NormalizedText};
use crate::types::{EngineError, Result, Severity, SeverityRuleId};

/// Cue sets a condition can look for in the match context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueSet {
    /// Transfer or reduction language
    Transfer,
    /// Restrictive verbs
    Restrictive,
    /// Due-process qualifiers
    DueProcess,
}

/// Condition for rule matching.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCondition {
    /// Always matches
    Always,
    /// Article is an eternity clause
    EternityClause,
    /// Article reserves something to the State
    StateReservation,
    /// Article carries a rights tag
    RightsTagged,
    /// Article's matter requires an organic law
    RequiresOrganicLaw,
    /// Declared instrument differs from the given one (or is undeclared)
    InstrumentIsNot(InstrumentType),
    /// A cue of the set occurs in the context window
    ContextHas(CueSet),
    /// A percentage below the ownership floor occurs in the context window
    MinorityPercentage,
    /// Negation
    Not(Box<RuleCondition>),
    /// Logical AND of conditions
    And(Vec<RuleCondition>),
    /// Logical OR of conditions
    Or(Vec<RuleCondition>),
}

/// A rule in the severity list.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityRule {
    /// Rule identifier
    pub id: SeverityRuleId,
    /// Severity assigned when the condition holds
    pub severity: Severity,
    /// Condition expression
    pub condition: RuleCondition,
}

/// What a condition is evaluated against.
#[derive(Debug, Clone)]
pub struct MatchContext<'a> {
    /// Normalized input text
    pub text: &'a NormalizedText,
    /// Token window around the match
    pub window: Range<usize>,
}

/// Result of classifying one match.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Severity tier
    pub severity: Severity,
    /// Rule that fired
    pub rule: SeverityRuleId,
    /// Human-readable rationale
    pub rationale: String,
}

/// Ordered, first-match-wins severity classifier.
pub struct SeverityClassifier {
    rules: Vec<SeverityRule>,
    transfer: Vec<Cue>,
    restrictive: Vec<Cue>,
    due_process: Vec<Cue>,
    percentage: Regex,
    ownership_floor: f64,
    context_window: usize,
}

impl SeverityClassifier {
    /// Create a classifier with the standard rule list.
    pub fn new(config: &SeverityConfig) -> Result<Self> {
        Self::with_rules(config, Self::standard_rules())
    }

    /// Create a classifier with a custom rule list.
    pub fn with_rules(config: &SeverityConfig, rules: Vec<SeverityRule>) -> Result<Self> {
        let percentage = Regex::new(r"(?i)(\d{1,3}(?:[.,]\d+)?)\s*(?:%|por\s+ciento)")
            .map_err(|e| EngineError::ConfigError(format!("percentage pattern: {}", e)))?;
        Ok(Self {
            rules,
            transfer: Cue::compile(&config.transfer_cues),
            restrictive: Cue::compile(&config.restrictive_cues),
            due_process: Cue::compile(&config.due_process_qualifiers),
            percentage,
            ownership_floor: config.ownership_floor_percent,
            context_window: config.context_window,
        })
    }

    /// The standard rule list, most severe first.
    pub fn standard_rules() -> Vec<SeverityRule> {
        vec![
            SeverityRule {
                id: SeverityRuleId::EternityClause,
                severity: Severity::Critical,
                condition: RuleCondition::EternityClause,
            },
            SeverityRule {
                id: SeverityRuleId::StateReservationTransfer,
                severity: Severity::Critical,
                condition: RuleCondition::And(vec![
                    RuleCondition::StateReservation,
                    RuleCondition::Or(vec![
                        RuleCondition::ContextHas(CueSet::Transfer),
                        RuleCondition::MinorityPercentage,
                    ]),
                ]),
            },
            SeverityRule {
                id: SeverityRuleId::RightsRestriction,
                severity: Severity::High,
                condition: RuleCondition::And(vec![
                    RuleCondition::RightsTagged,
                    RuleCondition::ContextHas(CueSet::Restrictive),
                    RuleCondition::Not(Box::new(RuleCondition::ContextHas(CueSet::DueProcess))),
                ]),
            },
            SeverityRule {
                id: SeverityRuleId::OrganicLawReserve,
                severity: Severity::Medium,
                condition: RuleCondition::And(vec![
                    RuleCondition::RequiresOrganicLaw,
                    RuleCondition::InstrumentIsNot(InstrumentType::OrganicLaw),
                ]),
            },
            SeverityRule {
                id: SeverityRuleId::Residual,
                severity: Severity::Low,
                condition: RuleCondition::Always,
            },
        ]
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[SeverityRule] {
        &self.rules
    }

    /// Context window around a matched token range.
    pub fn context<'a>(&self, text: &'a NormalizedText, matched: Range<usize>) -> MatchContext<'a> {
        MatchContext {
            text,
            window: text.window(matched, self.context_window),
        }
    }

    /// Classify one match. Falls back to LOW when no rule applies.
    pub fn classify(
        &self,
        article: &ConstitutionalArticle,
        context: &MatchContext<'_>,
        declared: Option<InstrumentType>,
    ) -> Classification {
        for rule in &self.rules {
            if self.evaluate(&rule.condition, article, context, declared) {
                tracing::trace!(
                    article = %article.number,
                    rule = ?rule.id,
                    severity = %rule.severity,
                    "Severity rule matched"
                );
                return Classification {
                    severity: rule.severity,
                    rule: rule.id,
                    rationale: self.rationale(rule.id, article, context),
                };
            }
        }

        Classification {
            severity: Severity::Low,
            rule: SeverityRuleId::Residual,
            rationale: self.rationale(SeverityRuleId::Residual, article, context),
        }
    }

    fn evaluate(
        &self,
        condition: &RuleCondition,
        article: &ConstitutionalArticle,
        context: &MatchContext<'_>,
        declared: Option<InstrumentType>,
    ) -> bool {
        match condition {
            RuleCondition::Always => true,
            RuleCondition::EternityClause => article.is_eternity_clause,
            RuleCondition::StateReservation => article.state_reservation,
            RuleCondition::RightsTagged => article.is_rights_tagged(),
            RuleCondition::RequiresOrganicLaw => article.requires_organic_law,
            RuleCondition::InstrumentIsNot(instrument) => declared != Some(*instrument),
            RuleCondition::ContextHas(set) => self.cue_in_context(*set, context).is_some(),
            RuleCondition::MinorityPercentage => self.minority_percentage(context).is_some(),
            RuleCondition::Not(inner) => !self.evaluate(inner, article, context, declared),
            RuleCondition::And(conditions) => conditions
                .iter()
                .all(|c| self.evaluate(c, article, context, declared)),
            RuleCondition::Or(conditions) => conditions
                .iter()
                .any(|c| self.evaluate(c, article, context, declared)),
        }
    }

    fn cues(&self, set: CueSet) -> &[Cue] {
        match set {
            CueSet::Transfer => &self.transfer,
            CueSet::Restrictive => &self.restrictive,
            CueSet::DueProcess => &self.due_process,
        }
    }

    fn cue_in_context<'c>(&'c self, set: CueSet, context: &MatchContext<'_>) -> Option<&'c Cue> {
        context
            .text
            .any_cue(self.cues(set), context.window.clone())
    }

    /// First percentage below the ownership floor in the context window.
    fn minority_percentage(&self, context: &MatchContext<'_>) -> Option<f64> {
        let slice = context.text.slice(context.window.clone());
        self.percentage
            .captures_iter(slice)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
            .find(|pct| *pct < self.ownership_floor)
    }

    fn rationale(
        &self,
        rule: SeverityRuleId,
        article: &ConstitutionalArticle,
        context: &MatchContext<'_>,
    ) -> String {
        match rule {
            SeverityRuleId::EternityClause => format!(
                "{} ({}) is an eternity clause; it cannot be altered by ordinary legislation",
                article.number, article.title
            ),
            SeverityRuleId::StateReservationTransfer => {
                let cue = match self.minority_percentage(context) {
                    Some(pct) => format!("state participation of {}%", pct),
                    None => self
                        .cue_in_context(CueSet::Transfer, context)
                        .map(|c| format!("'{}'", c.label()))
                        .unwrap_or_default(),
                };
                format!(
                    "{} ({}) reserves the matter to the State; the text reduces or transfers it ({})",
                    article.number, article.title, cue
                )
            }
            SeverityRuleId::RightsRestriction => format!(
                "{} ({}) protects a right the text restricts ('{}') without a due-process qualifier",
                article.number,
                article.title,
                self.cue_in_context(CueSet::Restrictive, context)
                    .map(|c| c.label())
                    .unwrap_or_default()
            ),
            SeverityRuleId::OrganicLawReserve => format!(
                "{} ({}) reserves the matter to an organic law",
                article.number, article.title
            ),
            SeverityRuleId::Residual => format!(
                "Text touches {} ({}); review for consistency",
                article.number, article.title
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constitution::KnowledgeBase;

    struct Fixture {
        kb: KnowledgeBase,
        classifier: SeverityClassifier,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                kb: KnowledgeBase::bundled().unwrap(),
                classifier: SeverityClassifier::new(&SeverityConfig::default()).unwrap(),
            }
        }

        fn classify(
            &self,
            number: u16,
            text: &str,
            declared: Option<InstrumentType>,
        ) -> Classification {
            let article = self.kb.get_article(number).unwrap();
            let text = NormalizedText::new(text, 6).unwrap();
            let context = self.classifier.context(&text, text.full_range());
            self.classifier.classify(article, &context, declared)
        }
    }

    #[test]
    fn test_standard_rules_end_with_residual() {
        let f = Fixture::new();
        let rules = f.classifier.rules();
        assert_eq!(rules[0].id, SeverityRuleId::EternityClause);
        let last = rules.last().unwrap();
        assert_eq!(last.id, SeverityRuleId::Residual);
        assert_eq!(last.condition, RuleCondition::Always);
        assert!(rules.windows(2).all(|w| w[0].severity >= w[1].severity));
    }

    #[test]
    fn test_eternity_clause_is_critical() {
        let f = Fixture::new();
        let c = f.classify(43, "Se establece la pena de muerte.", None);
        assert_eq!(c.severity, Severity::Critical);
        assert_eq!(c.rule, SeverityRuleId::EternityClause);
    }

    #[test]
    fn test_minority_state_participation_is_critical() {
        let f = Fixture::new();
        let c = f.classify(
            303,
            "La participación estatal en la empresa mixta será del 49%.",
            Some(InstrumentType::OrdinaryLaw),
        );
        assert_eq!(c.severity, Severity::Critical);
        assert_eq!(c.rule, SeverityRuleId::StateReservationTransfer);
        assert!(c.rationale.contains("49"));

        let majority = f.classify(
            303,
            "La participación estatal en la empresa mixta será del 60%.",
            Some(InstrumentType::OrdinaryLaw),
        );
        assert_eq!(majority.severity, Severity::Low);
    }

    #[test]
    fn test_transfer_language_is_critical() {
        let f = Fixture::new();
        let c = f.classify(302, "Se autoriza la privatización de la actividad petrolera.", None);
        assert_eq!(c.severity, Severity::Critical);
    }

    #[test]
    fn test_restriction_without_due_process_is_high() {
        let f = Fixture::new();
        let c = f.classify(53, "Se prohíben las reuniones públicas.", None);
        assert_eq!(c.severity, Severity::High);

        let qualified = f.classify(
            53,
            "Se prohíben las reuniones públicas salvo orden judicial motivada.",
            None,
        );
        assert_eq!(qualified.severity, Severity::Low);
    }

    #[test]
    fn test_organic_reserve_depends_on_declared_instrument() {
        let f = Fixture::new();
        let text = "Se regulan las relaciones laborales del sector.";
        assert_eq!(
            f.classify(89, text, Some(InstrumentType::OrdinaryLaw)).severity,
            Severity::Medium
        );
        assert_eq!(f.classify(89, text, None).severity, Severity::Medium);
        assert_eq!(
            f.classify(89, text, Some(InstrumentType::OrganicLaw)).severity,
            Severity::Low
        );
    }

    #[test]
    fn test_classification_is_stable() {
        let f = Fixture::new();
        let text = "Se limita la libertad de expresión en los medios de comunicación.";
        let first = f.classify(57, text, Some(InstrumentType::Regulation));
        for _ in 0..5 {
            assert_eq!(f.classify(57, text, Some(InstrumentType::Regulation)), first);
        }
        assert_eq!(first.severity, Severity::High);
    }

    #[test]
    fn test_custom_rules_fall_back_to_low() {
        let kb = KnowledgeBase::bundled().unwrap();
        let classifier = SeverityClassifier::with_rules(
            &SeverityConfig::default(),
            vec![SeverityRule {
                id: SeverityRuleId::RightsRestriction,
                severity: Severity::High,
                condition: RuleCondition::RightsTagged,
            }],
        )
        .unwrap();
        assert_eq!(classifier.rules().len(), 1);
        let text = NormalizedText::new("actividad petrolera", 6).unwrap();
        let context = classifier.context(&text, text.full_range());
        let c = classifier.classify(kb.get_article(302u16).unwrap(), &context, None);
        assert_eq!(c.severity, Severity::Low);
        assert_eq!(c.rule, SeverityRuleId::Residual);
    }
}
