//! Core types for the constitutional knowledge base.
//!
//! These types model CRBV articles, the subject areas they belong to, the
//! legal instrument hierarchy, and the majority rules each instrument must
//! meet before it can be adopted.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Strongly typed key for a constitutional article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleNumber(pub u16);

impl ArticleNumber {
    /// Raw article number.
    pub fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ArticleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Art. {}", self.0)
    }
}

impl From<u16> for ArticleNumber {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Subject area of a constitutional article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectTag {
    /// Title I principles
    FundamentalPrinciples,
    /// Civil rights (Arts. 43-61)
    CivilRights,
    /// Political rights (Arts. 62-74)
    PoliticalRights,
    /// Social and family rights (Arts. 75-97)
    SocialRights,
    /// Cultural and educational rights
    CulturalRights,
    /// Economic rights (Arts. 112-118)
    EconomicRights,
    /// Environmental rights
    EnvironmentalRights,
    /// Rights of indigenous peoples
    IndigenousRights,
    /// Distribution of public power
    PublicPower,
    /// Legislative branch
    LegislativePower,
    /// Executive branch
    ExecutivePower,
    /// Judicial branch
    JudicialPower,
    /// Socioeconomic regime and state reservations
    SocioeconomicSystem,
    /// Security of the nation and armed forces
    NationalSecurity,
    /// Amendment, reform and constituent assembly
    ConstitutionalReform,
}

impl SubjectTag {
    /// Snake-case name, as used in catalogs and queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FundamentalPrinciples => "fundamental_principles",
            Self::CivilRights => "civil_rights",
            Self::PoliticalRights => "political_rights",
            Self::SocialRights => "social_rights",
            Self::CulturalRights => "cultural_rights",
            Self::EconomicRights => "economic_rights",
            Self::EnvironmentalRights => "environmental_rights",
            Self::IndigenousRights => "indigenous_rights",
            Self::PublicPower => "public_power",
            Self::LegislativePower => "legislative_power",
            Self::ExecutivePower => "executive_power",
            Self::JudicialPower => "judicial_power",
            Self::SocioeconomicSystem => "socioeconomic_system",
            Self::NationalSecurity => "national_security",
            Self::ConstitutionalReform => "constitutional_reform",
        }
    }

    /// Whether the tag denotes a rights chapter.
    pub fn is_rights(&self) -> bool {
        matches!(
            self,
            Self::CivilRights
                | Self::PoliticalRights
                | Self::SocialRights
                | Self::CulturalRights
                | Self::EconomicRights
                | Self::EnvironmentalRights
                | Self::IndigenousRights
        )
    }

    /// All tags in declaration order.
    pub fn all() -> &'static [SubjectTag] {
        &[
            Self::FundamentalPrinciples,
            Self::CivilRights,
            Self::PoliticalRights,
            Self::SocialRights,
            Self::CulturalRights,
            Self::EconomicRights,
            Self::EnvironmentalRights,
            Self::IndigenousRights,
            Self::PublicPower,
            Self::LegislativePower,
            Self::ExecutivePower,
            Self::JudicialPower,
            Self::SocioeconomicSystem,
            Self::NationalSecurity,
            Self::ConstitutionalReform,
        ]
    }

    /// Parse a snake-case tag name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SubjectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An article of the Constitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstitutionalArticle {
    /// Unique article number
    pub number: ArticleNumber,
    /// Short title
    pub title: String,
    /// Enclosing title/chapter label
    pub chapter: String,
    /// Article text (may be abridged)
    pub text: String,
    /// Subject areas (at least one)
    pub tags: Vec<SubjectTag>,
    /// Matching keywords and phrases
    pub keywords: Vec<String>,
    /// Cannot be altered by ordinary legislative means
    #[serde(default)]
    pub is_eternity_clause: bool,
    /// Matter must be regulated by organic law
    #[serde(default)]
    pub requires_organic_law: bool,
    /// Reserves a resource, industry or ownership floor to the State
    #[serde(default)]
    pub state_reservation: bool,
    /// Cross-referenced articles
    #[serde(default)]
    pub related: Vec<ArticleNumber>,
}

impl ConstitutionalArticle {
    /// Whether any of the article's tags is a rights chapter.
    pub fn is_rights_tagged(&self) -> bool {
        self.tags.iter().any(SubjectTag::is_rights)
    }

    /// Whether the article carries the given tag.
    pub fn has_tag(&self, tag: SubjectTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Authority tier of an issuing instrument.
///
/// Higher tiers dominate lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityTier {
    /// Municipal council
    Local = 1,
    /// Ministerial or agency act
    Administrative = 2,
    /// Executive regulation of a law
    Regulatory = 3,
    /// Statute or act with force of statute
    Statutory = 4,
    /// Organic law
    Organic = 5,
    /// Constitutional change
    Constitutional = 6,
}

impl AuthorityTier {
    /// Get the precedence value (higher = more authority)
    pub fn precedence(&self) -> u8 {
        *self as u8
    }

    /// Check if this tier dominates (is at least as high as) another.
    pub fn dominates(&self, other: &Self) -> bool {
        self.precedence() >= other.precedence()
    }
}

/// Legal instrument categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentType {
    /// Ley ordinaria
    OrdinaryLaw,
    /// Ley orgánica
    OrganicLaw,
    /// Ley habilitante
    EnablingLaw,
    /// Decreto con rango, valor y fuerza de ley
    DecreeLaw,
    /// Reglamento
    Regulation,
    /// Resolución
    Resolution,
    /// Ordenanza municipal
    MunicipalOrdinance,
    /// Enmienda constitucional
    Amendment,
    /// Reforma constitucional
    Reform,
}

impl InstrumentType {
    /// All instrument types in declaration order.
    pub fn all() -> &'static [InstrumentType] {
        &[
            Self::OrdinaryLaw,
            Self::OrganicLaw,
            Self::EnablingLaw,
            Self::DecreeLaw,
            Self::Regulation,
            Self::Resolution,
            Self::MunicipalOrdinance,
            Self::Amendment,
            Self::Reform,
        ]
    }

    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrdinaryLaw => "ORDINARY_LAW",
            Self::OrganicLaw => "ORGANIC_LAW",
            Self::EnablingLaw => "ENABLING_LAW",
            Self::DecreeLaw => "DECREE_LAW",
            Self::Regulation => "REGULATION",
            Self::Resolution => "RESOLUTION",
            Self::MunicipalOrdinance => "MUNICIPAL_ORDINANCE",
            Self::Amendment => "AMENDMENT",
            Self::Reform => "REFORM",
        }
    }

    /// Spanish legal name.
    pub fn legal_name(&self) -> &'static str {
        match self {
            Self::OrdinaryLaw => "Ley Ordinaria",
            Self::OrganicLaw => "Ley Orgánica",
            Self::EnablingLaw => "Ley Habilitante",
            Self::DecreeLaw => "Decreto con Rango, Valor y Fuerza de Ley",
            Self::Regulation => "Reglamento",
            Self::Resolution => "Resolución",
            Self::MunicipalOrdinance => "Ordenanza Municipal",
            Self::Amendment => "Enmienda Constitucional",
            Self::Reform => "Reforma Constitucional",
        }
    }

    /// Tier of the authority that issues this instrument.
    pub fn authority_tier(&self) -> AuthorityTier {
        match self {
            Self::Amendment | Self::Reform => AuthorityTier::Constitutional,
            Self::OrganicLaw => AuthorityTier::Organic,
            Self::OrdinaryLaw | Self::EnablingLaw | Self::DecreeLaw => AuthorityTier::Statutory,
            Self::Regulation => AuthorityTier::Regulatory,
            Self::Resolution => AuthorityTier::Administrative,
            Self::MunicipalOrdinance => AuthorityTier::Local,
        }
    }

    /// Whether the instrument is adopted by a deliberative body vote.
    pub fn is_deliberative(&self) -> bool {
        !matches!(self, Self::DecreeLaw | Self::Regulation | Self::Resolution)
    }

    /// Parse an identifier or a common label ("organica", "ORGANIC_LAW", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        let label = crate::text::canonical_phrase(label).replace(' ', "_");
        let found = match label.as_str() {
            "ordinary_law" | "ordinaria" | "ley_ordinaria" => Self::OrdinaryLaw,
            "organic_law" | "organica" | "ley_organica" => Self::OrganicLaw,
            "enabling_law" | "habilitante" | "ley_habilitante" => Self::EnablingLaw,
            "decree_law" | "decreto" | "decreto_ley" => Self::DecreeLaw,
            "regulation" | "reglamento" => Self::Regulation,
            "resolution" | "resolucion" => Self::Resolution,
            "municipal_ordinance" | "ordenanza" | "ordenanza_municipal" => {
                Self::MunicipalOrdinance
            }
            "amendment" | "enmienda" => Self::Amendment,
            "reform" | "reforma" | "reforma_constitucional" => Self::Reform,
            _ => return None,
        };
        Some(found)
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of majority a vote must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MajorityKind {
    /// More than half of the members present
    Simple,
    /// More than half of the total membership
    Absolute,
    /// A fixed fraction of the base population
    Qualified,
}

/// Population a majority fraction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteBase {
    /// Members present at the session
    Present,
    /// Total membership of the body
    Total,
}

/// A qualified-majority fraction such as 2/3 or 3/5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    /// Numerator
    pub numerator: u32,
    /// Denominator (non-zero)
    pub denominator: u32,
}

impl Fraction {
    /// Create a new fraction.
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Whether the fraction is a usable voting share (0 < n/d <= 1).
    pub fn is_valid(&self) -> bool {
        self.denominator > 0 && self.numerator > 0 && self.numerator <= self.denominator
    }

    /// ceil(numerator × base / denominator) in integer arithmetic.
    pub fn ceil_of(&self, base: u32) -> u32 {
        let num = u64::from(self.numerator) * u64::from(base);
        let den = u64::from(self.denominator.max(1));
        num.div_ceil(den) as u32
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Majority rule an instrument must meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityRule {
    /// Majority kind
    pub kind: MajorityKind,
    /// Fraction for qualified majorities
    #[serde(default)]
    pub fraction: Option<Fraction>,
    /// Base population the majority is computed over
    pub base: VoteBase,
    /// Popular referendum additionally required
    #[serde(default)]
    pub requires_referendum: bool,
    /// Number of plenary discussions
    #[serde(default = "default_discussions")]
    pub discussions: u8,
    /// Constitutional basis of the rule
    #[serde(default)]
    pub constitutional_basis: String,
}

fn default_discussions() -> u8 {
    2
}

impl MajorityRule {
    /// Votes required for the given base count.
    ///
    /// Simple and absolute majorities are strict majorities (more than half);
    /// qualified majorities are the ceiling of the fraction of the base.
    pub fn votes_required(&self, base_count: u32) -> u32 {
        match (self.kind, self.fraction) {
            (MajorityKind::Qualified, Some(fraction)) => fraction.ceil_of(base_count),
            _ => base_count / 2 + 1,
        }
    }

    /// Short human-readable description ("Qualified 2/3 of TOTAL").
    pub fn describe(&self) -> String {
        let base = match self.base {
            VoteBase::Present => "members present",
            VoteBase::Total => "total membership",
        };
        match (self.kind, self.fraction) {
            (MajorityKind::Qualified, Some(fraction)) => {
                format!("qualified {} of {}", fraction, base)
            }
            (MajorityKind::Absolute, _) => format!("absolute majority of {}", base),
            _ => format!("simple majority of {}", base),
        }
    }
}

/// One row of the threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRule {
    /// Instrument the rule applies to
    pub instrument: InstrumentType,
    /// The rule
    pub rule: MajorityRule,
}

/// Catalog provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMeta {
    /// Catalog name
    pub name: String,
    /// Catalog version
    pub version: String,
    /// Official gazette reference of the constitutional text
    pub gazette: String,
    /// Publication date of the gazette
    pub published: NaiveDate,
}

/// A raw catalog as supplied by a reference-data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Provenance
    pub meta: CatalogMeta,
    /// Articles
    pub articles: Vec<ConstitutionalArticle>,
    /// Threshold table
    pub majority_rules: Vec<InstrumentRule>,
}
