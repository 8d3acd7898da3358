//! Reference-data sources for the constitutional catalog.
//!
//! The catalog is maintained outside this crate. A [`CatalogSource`] hands a
//! parsed [`Catalog`] to the store at startup; the bundled source needs no
//! I/O, the file source reads a YAML export from disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::catalog::BUNDLED_CRBV;
use crate::store::{KnowledgeBase, Result};
use crate::types::Catalog;

/// Trait for loading a constitutional catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short description of where the catalog comes from.
    fn describe(&self) -> String;

    /// Load and parse the catalog.
    async fn load(&self) -> Result<Catalog>;

    /// Load the catalog and build a validated knowledge base from it.
    async fn knowledge_base(&self) -> Result<KnowledgeBase> {
        let catalog = self.load().await?;
        tracing::info!(
            source = %self.describe(),
            version = %catalog.meta.version,
            "Loaded constitutional catalog"
        );
        KnowledgeBase::from_catalog(catalog)
    }
}

/// The catalog compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

#[async_trait]
impl CatalogSource for BundledCatalog {
    fn describe(&self) -> String {
        "bundled:crbv".to_string()
    }

    async fn load(&self) -> Result<Catalog> {
        Catalog::from_yaml(BUNDLED_CRBV)
    }
}

/// A catalog exported to a YAML file.
#[derive(Debug, Clone)]
pub struct YamlFileCatalog {
    path: PathBuf,
}

impl YamlFileCatalog {
    /// Create a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the catalog is read from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for YamlFileCatalog {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn load(&self) -> Result<Catalog> {
        tracing::debug!(path = %self.path.display(), "Reading catalog file");
        let yaml = tokio::fs::read_to_string(&self.path).await?;
        Catalog::from_yaml(&yaml)
    }
}

/// Compute SHA256 hash of content.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
