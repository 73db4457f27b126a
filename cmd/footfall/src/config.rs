//! Server configuration.
//!
//! Every field is optional in the YAML file:
//!
//! ```yaml
//! listen: ":8080"
//! dim: 128
//! vector_search: true
//! storage:
//!   kind: redb
//!   path: footfall.redb
//! thresholds:
//!   accept_cosine: 0.30
//!   accept_l2: 0.55
//!   review_cosine: 0.38
//!   review_l2: 0.65
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use footfall_identity::Thresholds;
use footfall_people::{DEFAULT_DIM, ServiceConfig};
use serde::Deserialize;

/// Where records are kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    Memory,
    Redb { path: PathBuf },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Redb {
            path: PathBuf::from("footfall.redb"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: String,
    pub dim: usize,
    pub vector_search: bool,
    pub storage: StorageConfig,
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ":8080".to_string(),
            dim: DEFAULT_DIM,
            vector_search: true,
            storage: StorageConfig::default(),
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            bail!("dim must be positive");
        }
        if let Err(e) = self.thresholds.validate() {
            bail!("thresholds: {e}");
        }
        Ok(())
    }

    pub fn service(&self) -> ServiceConfig {
        ServiceConfig {
            dim: self.dim,
            thresholds: self.thresholds,
            vector_search: self.vector_search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::parse("{}").unwrap();
        assert_eq!(cfg.listen, ":8080");
        assert_eq!(cfg.dim, 128);
        assert!(cfg.vector_search);
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert_eq!(cfg.storage, StorageConfig::default());
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_thresholds_keep_other_defaults() {
        let cfg = Config::parse(
            "dim: 512\nstorage:\n  kind: memory\nthresholds:\n  accept_cosine: 0.25\n",
        )
        .unwrap();
        assert_eq!(cfg.dim, 512);
        assert_eq!(cfg.storage, StorageConfig::Memory);
        assert_eq!(cfg.thresholds.accept_cosine, 0.25);
        assert_eq!(cfg.thresholds.review_l2, 0.65);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = Config::parse("dim: 0").unwrap();
        assert!(cfg.validate().is_err());

        let cfg = Config::parse("thresholds:\n  review_cosine: 0.1\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("footfall.yaml");
        std::fs::write(&path, "listen: 127.0.0.1:9000\nvector_search: false\n").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:9000");
        assert!(!cfg.vector_search);
        assert!(!cfg.service().vector_search);

        assert!(Config::load(&dir.path().join("missing.yaml")).is_err());
    }
}
