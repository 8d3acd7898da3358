//! Constitutional knowledge base for the CRBV compliance engine
//!
//! This crate holds the static reference data the engine checks legal texts
//! against:
//!
//! - **Articles**: CRBV provisions with subject tags, matching keywords and
//!   the flags (eternity clause, organic-law reserve, state reservation) the
//!   severity rules read
//! - **Threshold table**: the majority rule each legal instrument must meet
//!
//! # Key Components
//!
//! - [`KnowledgeBase`]: Read-only, indexed store of articles and majority rules
//! - [`CatalogSource`]: Trait for loading the catalog (bundled or from a file)
//! - [`MajorityRule`]: Vote arithmetic for simple, absolute and qualified majorities
//!
//! # Example
//!
//! ```ignore
//! use constitution::{BundledCatalog, CatalogSource, InstrumentType};
//!
//! let kb = BundledCatalog.knowledge_base().await?;
//! let rule = kb.majority_rule(InstrumentType::EnablingLaw)?;
//! assert_eq!(rule.votes_required(277), 167);
//! ```

pub mod catalog;
pub mod source;
pub mod store;
pub mod text;
pub mod types;

// Re-export main types
pub use catalog::BUNDLED_CRBV;
pub use source::{compute_hash, BundledCatalog, CatalogSource, YamlFileCatalog};
pub use store::{CatalogStatistics, KeywordRef, KnowledgeBase, KnowledgeBaseError};
pub use types::*;
