//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::calculation::RoundingRule;
use crate::error::{EngineError, EngineResult};
use crate::models::TaxSlab;

use super::types::{BillingSettings, EngineConfig, EngineSettings};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml      # Server and income-tax settings
/// ├── billing.yaml     # Bill layout and charges
/// └── slabs/           # Optional seeded tax slabs
///     └── fy_2025_26.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use utility_payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// for slab in loader.slabs() {
///     println!("{}:\n{}", slab.name, slab.summary());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - engine.yaml or billing.yaml is missing
    /// - Any file contains invalid YAML or an invalid tax band
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let billing = Self::load_yaml::<BillingSettings>(&path.join("billing.yaml"))?;
        let slabs = Self::load_slabs(&path.join("slabs"))?;

        Ok(Self {
            config: EngineConfig::new(settings, billing, slabs),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every slab file in the slabs directory, in file name order.
    ///
    /// A missing directory means no seeded slabs.
    fn load_slabs(slabs_dir: &Path) -> EngineResult<Vec<TaxSlab>> {
        if !slabs_dir.exists() {
            return Ok(Vec::new());
        }

        let slabs_dir_str = slabs_dir.display().to_string();
        let entries = fs::read_dir(slabs_dir).map_err(|_| EngineError::ConfigNotFound {
            path: slabs_dir_str.clone(),
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: slabs_dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .iter()
            .map(|path| Self::load_yaml::<TaxSlab>(path))
            .collect()
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        self.config.settings()
    }

    /// Returns the billing settings.
    pub fn billing(&self) -> &BillingSettings {
        self.config.billing()
    }

    /// Returns the seeded tax slabs.
    pub fn slabs(&self) -> &[TaxSlab] {
        self.config.slabs()
    }

    /// Returns the configured withholding rounding rule.
    pub fn rounding(&self) -> RoundingRule {
        self.config.rounding()
    }
}
