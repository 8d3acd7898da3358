//! Catalog parsing and validation.
//!
//! A catalog is the raw reference data (articles plus the instrument
//! threshold table) before it is indexed into a [`KnowledgeBase`](crate::KnowledgeBase).
//! Validation runs in full before any index is built.

use std::collections::BTreeSet;

use crate::store::{KnowledgeBaseError, Result};
use crate::text::canonical_phrase;
use crate::types::{Catalog, InstrumentType, MajorityKind};

/// The bundled CRBV catalog (Gaceta Oficial N° 5.908, 2009).
pub const BUNDLED_CRBV: &str = include_str!("../catalog/crbv.yaml");

impl Catalog {
    /// Parse a catalog from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize the catalog to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Canonical byte form used for fingerprinting.
    ///
    /// Articles are ordered by number and rules by instrument so two catalogs
    /// with the same content hash identically.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let mut canonical = self.clone();
        canonical.articles.sort_by_key(|a| a.number);
        canonical.majority_rules.sort_by_key(|r| r.instrument);
        serde_json::to_vec(&canonical)
            .map_err(|e| KnowledgeBaseError::InvalidCatalog(format!("canonical form: {}", e)))
    }

    /// Check the catalog for structural errors.
    pub fn validate(&self) -> Result<()> {
        if self.articles.is_empty() {
            return Err(invalid("catalog has no articles"));
        }

        let mut seen = BTreeSet::new();
        for article in &self.articles {
            if !seen.insert(article.number) {
                return Err(invalid(format!("duplicate article {}", article.number)));
            }
            if article.tags.is_empty() {
                return Err(invalid(format!("{} has no subject tag", article.number)));
            }
            if article.keywords.is_empty() {
                return Err(invalid(format!("{} has no keywords", article.number)));
            }

            let mut phrases = BTreeSet::new();
            for keyword in &article.keywords {
                let phrase = canonical_phrase(keyword);
                if phrase.is_empty() {
                    return Err(invalid(format!(
                        "{} has an empty keyword '{}'",
                        article.number, keyword
                    )));
                }
                if !phrases.insert(phrase) {
                    return Err(invalid(format!(
                        "{} repeats keyword '{}'",
                        article.number, keyword
                    )));
                }
            }
        }

        let mut ruled = BTreeSet::new();
        for entry in &self.majority_rules {
            if !ruled.insert(entry.instrument) {
                return Err(invalid(format!(
                    "duplicate majority rule for {}",
                    entry.instrument
                )));
            }
            if entry.rule.kind == MajorityKind::Qualified
                && !entry.rule.fraction.is_some_and(|f| f.is_valid())
            {
                return Err(invalid(format!(
                    "qualified rule for {} needs a fraction in (0, 1]",
                    entry.instrument
                )));
            }
        }

        if let Some(missing) = InstrumentType::all()
            .iter()
            .find(|instrument| !ruled.contains(*instrument))
        {
            return Err(invalid(format!("no majority rule for {}", missing)));
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> KnowledgeBaseError {
    KnowledgeBaseError::InvalidCatalog(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Fraction, SubjectTag};

    fn bundled() -> Catalog {
        Catalog::from_yaml(BUNDLED_CRBV).unwrap()
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = bundled();
        catalog.validate().unwrap();
        assert!(catalog.articles.len() >= 40);
        assert_eq!(catalog.majority_rules.len(), InstrumentType::all().len());
    }

    #[test]
    fn test_rejects_duplicate_article() {
        let mut catalog = bundled();
        let first = catalog.articles[0].clone();
        catalog.articles.push(first);
        assert!(matches!(
            catalog.validate(),
            Err(KnowledgeBaseError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_rejects_untagged_or_keywordless_article() {
        let mut catalog = bundled();
        catalog.articles[0].tags.clear();
        assert!(catalog.validate().is_err());

        let mut catalog = bundled();
        catalog.articles[0].keywords = vec!["  ".to_string()];
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_rule_and_bad_fraction() {
        let mut catalog = bundled();
        catalog
            .majority_rules
            .retain(|r| r.instrument != InstrumentType::Resolution);
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("RESOLUTION"));

        let mut catalog = bundled();
        for entry in &mut catalog.majority_rules {
            if entry.instrument == InstrumentType::EnablingLaw {
                entry.rule.fraction = Some(Fraction::new(6, 5));
            }
        }
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_canonical_bytes_ignore_order() {
        let catalog = bundled();
        let mut shuffled = catalog.clone();
        shuffled.articles.reverse();
        shuffled.majority_rules.reverse();
        assert_eq!(
            catalog.canonical_bytes().unwrap(),
            shuffled.canonical_bytes().unwrap()
        );
    }

    #[test]
    fn test_yaml_round_trip_keeps_flags() {
        let catalog = bundled();
        let again = Catalog::from_yaml(&catalog.to_yaml().unwrap()).unwrap();
        let art = again
            .articles
            .iter()
            .find(|a| a.number.get() == 303)
            .unwrap();
        assert!(art.state_reservation);
        assert!(!art.is_eternity_clause);
        assert!(art.tags.contains(&SubjectTag::SocioeconomicSystem));
    }
}
