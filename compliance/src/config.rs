//! Configuration for the compliance engine.
//!
//! Every scoring threshold is tunable. The defaults are starting values to be
//! calibrated against a labeled corpus, not authoritative constants.

use serde::{Deserialize, Serialize};

use constitution::{ConstitutionalArticle, Fraction};

use crate::types::{EngineError, Result, Severity};

/// Configuration for a [`ComplianceEngine`](crate::ComplianceEngine).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Conflict detector configuration
    pub detector: DetectorConfig,
    /// Severity classifier configuration
    pub severity: SeverityConfig,
    /// Test battery configuration
    pub battery: BatteryConfig,
    /// Risk aggregation configuration
    pub risk: RiskConfig,
    /// Feasibility calculator configuration
    pub feasibility: FeasibilityConfig,
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.severity.validate()?;
        self.battery.validate()?;
        self.feasibility.validate()?;
        Ok(())
    }
}

fn config_error(reason: impl Into<String>) -> EngineError {
    EngineError::ConfigError(reason.into())
}

fn cues(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Conflict detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Tokens within which distinct keywords count as co-occurring
    pub proximity_window: usize,
    /// Score multiplier bonus for co-occurring keywords
    pub proximity_bonus: f64,
    /// Tokens before a match searched for an exception marker
    pub negation_lookback: usize,
    /// Weight reduction for a keyword whose every occurrence is excepted
    pub negation_discount: f64,
    /// Exception markers
    pub negation_markers: Vec<String>,
    /// Score an article with few keywords must exceed
    pub base_threshold: f64,
    /// Keywords per additional required hit
    pub keywords_per_extra_hit: usize,
    /// Cap on required hits
    pub max_required_hits: usize,
    /// Longest n-gram built from the text
    pub ngram_cap: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            proximity_window: 12,
            proximity_bonus: 0.5,
            negation_lookback: 3,
            negation_discount: 0.6,
            negation_markers: cues(&[
                "salvo",
                "excepto",
                "exceptuando",
                "con excepción de",
                "no aplica",
                "no se aplicará",
            ]),
            base_threshold: 0.75,
            keywords_per_extra_hit: 5,
            max_required_hits: 2,
            ngram_cap: 6,
        }
    }
}

impl DetectorConfig {
    fn validate(&self) -> Result<()> {
        if self.proximity_window == 0 {
            return Err(config_error("detector.proximity_window must be positive"));
        }
        if !(0.0..=1.0).contains(&self.negation_discount) {
            return Err(config_error("detector.negation_discount must be in [0, 1]"));
        }
        if self.proximity_bonus < 0.0 || self.base_threshold <= 0.0 {
            return Err(config_error(
                "detector.proximity_bonus must be >= 0 and base_threshold > 0",
            ));
        }
        if self.keywords_per_extra_hit == 0 || self.max_required_hits == 0 || self.ngram_cap == 0 {
            return Err(config_error(
                "detector.keywords_per_extra_hit, max_required_hits and ngram_cap must be positive",
            ));
        }
        Ok(())
    }

    /// Hits an article with `keyword_count` keywords needs before it is flagged.
    pub fn required_hits(&self, keyword_count: usize) -> usize {
        (1 + keyword_count / self.keywords_per_extra_hit).min(self.max_required_hits)
    }

    /// Score an article must exceed before it is flagged.
    ///
    /// Eternity clauses and State reservations need a single hit whatever
    /// the length of their keyword list.
    pub fn threshold(&self, article: &ConstitutionalArticle) -> f64 {
        let hits = if article.is_eternity_clause || article.state_reservation {
            1
        } else {
            self.required_hits(article.keywords.len())
        };
        self.base_threshold * hits as f64
    }
}

/// Severity classifier configuration.
///
/// Cue lists are matched against canonical tokens; the last word of a cue
/// matches as a prefix, so "privatiz" also covers "privatización".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    /// Tokens on each side of a match inspected for cues
    pub context_window: usize,
    /// Transfer or reduction language against a State reservation
    pub transfer_cues: Vec<String>,
    /// Restrictive verbs against a right
    pub restrictive_cues: Vec<String>,
    /// Due-process qualifiers that neutralize a restriction
    pub due_process_qualifiers: Vec<String>,
    /// State participation below this percentage counts as a reduction
    pub ownership_floor_percent: f64,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            context_window: 15,
            transfer_cues: cues(&[
                "privatiz",
                "enajen",
                "transfier",
                "transfer",
                "vend",
                "venta",
                "cede",
                "cesion",
                "reduc",
                "minoritari",
            ]),
            restrictive_cues: cues(&[
                "limit",
                "restring",
                "restric",
                "suspen",
                "excluy",
                "excluir",
                "exclusion",
                "niega",
                "negar",
                "deneg",
                "prohib",
            ]),
            due_process_qualifiers: cues(&[
                "audiencia previa",
                "orden judicial",
                "debido proceso",
                "derecho a la defensa",
                "recurso de",
                "recurso jerarquico",
                "apelacion",
                "notificacion",
                "sentencia firme",
            ]),
            ownership_floor_percent: 50.0,
        }
    }
}

impl SeverityConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.ownership_floor_percent) {
            return Err(config_error(
                "severity.ownership_floor_percent must be in [0, 100]",
            ));
        }
        Ok(())
    }
}

/// Cue phrases for one category of procedural safeguard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeguardCategory {
    /// Category name ("notice", "hearing", ...)
    pub name: String,
    /// Cue phrases
    pub cues: Vec<String>,
}

/// Test battery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Run the tests on the rayon pool
    pub parallel: bool,
    /// Cues that the text preserves a comparably protective prior regime
    pub prior_regime_cues: Vec<String>,
    /// Sanction and procedure triggers
    pub sanction_triggers: Vec<String>,
    /// Procedural safeguards by category
    pub safeguards: Vec<SafeguardCategory>,
    /// Public-interest justification phrases
    pub justification_cues: Vec<String>,
    /// Restrictive-scope phrases
    pub restrictive_scope_cues: Vec<String>,
    /// Minimum justification/restriction ratio
    pub public_interest_ratio_floor: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            prior_regime_cues: cues(&[
                "regimen vigente",
                "se mantiene",
                "se mantienen",
                "conserva",
                "progresividad",
                "no menoscaba",
                "sin menoscabo",
                "derechos adquiridos",
                "igual o mayor proteccion",
            ]),
            sanction_triggers: cues(&[
                "sancion",
                "multa",
                "procedimiento",
                "infraccion",
                "penalidad",
                "inhabilitacion",
                "clausura",
            ]),
            safeguards: vec![
                SafeguardCategory {
                    name: "notice".to_string(),
                    cues: cues(&["notific", "aviso previo", "citacion"]),
                },
                SafeguardCategory {
                    name: "hearing".to_string(),
                    cues: cues(&["audiencia", "ser oid", "descargo"]),
                },
                SafeguardCategory {
                    name: "appeal".to_string(),
                    cues: cues(&[
                        "recurso de",
                        "recurso jerarquico",
                        "apelacion",
                        "impugn",
                        "reconsideracion",
                    ]),
                },
                SafeguardCategory {
                    name: "defense".to_string(),
                    cues: cues(&["defensa", "alegato", "promover pruebas"]),
                },
            ],
            justification_cues: cues(&[
                "interes publico",
                "interes general",
                "interes social",
                "utilidad publica",
                "proporcional",
                "necesari",
                "justific",
                "finalidad",
                "salud publica",
                "proteccion del ambiente",
            ]),
            restrictive_scope_cues: cues(&[
                "limit",
                "restring",
                "restric",
                "suspen",
                "prohib",
                "excluy",
                "exclusion",
                "deneg",
            ]),
            public_interest_ratio_floor: 0.5,
        }
    }
}

impl BatteryConfig {
    fn validate(&self) -> Result<()> {
        if self.public_interest_ratio_floor < 0.0 {
            return Err(config_error(
                "battery.public_interest_ratio_floor must be >= 0",
            ));
        }
        if self.safeguards.iter().any(|s| s.cues.is_empty()) {
            return Err(config_error("battery.safeguards categories need cues"));
        }
        Ok(())
    }
}

/// Per-severity weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityWeights {
    /// Weight of a critical finding
    pub critical: u32,
    /// Weight of a high finding
    pub high: u32,
    /// Weight of a medium finding
    pub medium: u32,
    /// Weight of a low finding
    pub low: u32,
}

impl SeverityWeights {
    /// Weight of one tier.
    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Nullity probability base per risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullityBase {
    /// NONE
    pub none: u32,
    /// LOW
    pub low: u32,
    /// MEDIUM
    pub medium: u32,
    /// HIGH
    pub high: u32,
    /// CRITICAL
    pub critical: u32,
}

/// Risk aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Nullity probability base per risk level
    pub nullity_base: NullityBase,
    /// Nullity points added per critical finding
    pub nullity_per_critical: u32,
    /// Nullity points added per high finding
    pub nullity_per_high: u32,
    /// Compliance points removed per finding
    pub compliance_penalties: SeverityWeights,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            nullity_base: NullityBase {
                none: 5,
                low: 15,
                medium: 35,
                high: 60,
                critical: 85,
            },
            nullity_per_critical: 5,
            nullity_per_high: 3,
            compliance_penalties: SeverityWeights {
                critical: 40,
                high: 20,
                medium: 10,
                low: 2,
            },
        }
    }
}

/// How quorum is computed from total membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// More than half of the total membership
    StrictMajority,
    /// A fixed fraction of the total membership, rounded up
    Fraction(Fraction),
}

impl QuorumRule {
    /// Members required for a valid session.
    pub fn required(&self, total: u32) -> u32 {
        match self {
            Self::StrictMajority => total / 2 + 1,
            Self::Fraction(fraction) => fraction.ceil_of(total),
        }
    }
}

/// Blocker penalty weights by rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockerWeights {
    /// High-rated blocker weight
    pub high: f64,
    /// Medium-rated blocker weight
    pub medium: f64,
    /// Low-rated blocker weight
    pub low: f64,
}

/// Feasibility calculator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityConfig {
    /// Quorum business rule
    pub quorum: QuorumRule,
    /// Blocker probability weights applied to the feasibility score
    pub blocker_weights: BlockerWeights,
    /// Vote margin (as a fraction of votes required) below which a voting
    /// stage is rated medium risk
    pub narrow_margin: f64,
}

impl Default for FeasibilityConfig {
    fn default() -> Self {
        Self {
            quorum: QuorumRule::StrictMajority,
            blocker_weights: BlockerWeights {
                high: 0.3,
                medium: 0.15,
                low: 0.05,
            },
            narrow_margin: 0.1,
        }
    }
}

impl FeasibilityConfig {
    fn validate(&self) -> Result<()> {
        if let QuorumRule::Fraction(fraction) = self.quorum {
            if !fraction.is_valid() {
                return Err(config_error("feasibility.quorum fraction must be in (0, 1]"));
            }
        }
        if self.narrow_margin < 0.0 {
            return Err(config_error("feasibility.narrow_margin must be >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.detector.proximity_window, 12);
        assert_eq!(config.risk.nullity_base.critical, 85);
        assert!(config.battery.parallel);
        config.validate().unwrap();
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = EngineConfig::default();
        config.battery.parallel = false;
        config.feasibility.quorum = QuorumRule::Fraction(Fraction::new(3, 5));
        let yaml = config.to_yaml().unwrap();
        let parsed = EngineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed = EngineConfig::from_yaml("detector:\n  proximity_window: 8\n").unwrap();
        assert_eq!(parsed.detector.proximity_window, 8);
        assert_eq!(parsed.detector.negation_lookback, 3);
        assert_eq!(parsed.risk, RiskConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        let mut config = EngineConfig::default();
        config.detector.negation_discount = 1.5;
        assert!(matches!(config.validate(), Err(EngineError::ConfigError(_))));

        let mut config = EngineConfig::default();
        config.feasibility.quorum = QuorumRule::Fraction(Fraction::new(0, 3));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_required_hits_grow_with_keywords() {
        let detector = DetectorConfig::default();
        assert_eq!(detector.required_hits(4), 1);
        assert_eq!(detector.required_hits(5), 2);
        assert_eq!(detector.required_hits(40), 2);
    }

    #[test]
    fn test_protected_articles_need_one_hit() {
        let kb = constitution::KnowledgeBase::bundled().unwrap();
        let detector = DetectorConfig {
            keywords_per_extra_hit: 3,
            ..DetectorConfig::default()
        };

        let property = kb.get_article(115u16).unwrap();
        assert!((detector.threshold(property) - 1.5).abs() < 1e-9);

        let pdvsa = kb.get_article(303u16).unwrap();
        assert!(pdvsa.keywords.len() >= 6);
        assert!((detector.threshold(pdvsa) - 0.75).abs() < 1e-9);

        let territory = kb.get_article(13u16).unwrap();
        assert!((detector.threshold(territory) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_quorum_rule() {
        assert_eq!(QuorumRule::StrictMajority.required(277), 139);
        assert_eq!(QuorumRule::Fraction(Fraction::new(2, 3)).required(300), 200);
    }
}
