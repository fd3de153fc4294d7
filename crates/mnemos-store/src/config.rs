//! Workspace configuration.
//!
//! One TOML file with a section per engine plus `[store]`. Every section
//! and every field is optional; anything missing takes its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mnemos_core::{CompositionConfig, ConsolidationConfig, DecompositionConfig, SwarmConfig};

use crate::error::{Result, StoreError};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file. `None` leaves the choice to the caller.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MnemosConfig {
    pub store: StoreConfig,
    pub swarm: SwarmConfig,
    pub composition: CompositionConfig,
    pub decomposition: DecompositionConfig,
    pub consolidation: ConsolidationConfig,
}

impl MnemosConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            StoreError::Config(msg) => StoreError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| StoreError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.swarm.validate()?;
        self.composition.validate()?;
        self.decomposition.validate()?;
        self.consolidation.validate()?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StoreError::Config(format!("cannot render config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(MnemosConfig::from_toml_str("").unwrap(), MnemosConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = MnemosConfig::from_toml_str(
            r#"
            [store]
            path = "/tmp/mnemos.db"

            [decomposition]
            burst_threshold = 6.0

            [consolidation]
            decay_far_pairs = false
            "#,
        )
        .unwrap();
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/mnemos.db")));
        assert_eq!(config.decomposition.burst_threshold, 6.0);
        assert!(!config.consolidation.decay_far_pairs);
        assert_eq!(config.swarm, SwarmConfig::default());
        assert_eq!(config.consolidation.steps_per_cycle, 20);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = MnemosConfig::from_toml_str("[composition]\nresonance_threshold = 2.0\n").unwrap_err();
        assert!(matches!(err, StoreError::InvalidParameter(_)));

        let err = MnemosConfig::from_toml_str("[swarm\n").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_render_roundtrip() {
        let mut config = MnemosConfig::default();
        config.swarm.seed = 9;
        let text = config.to_toml_string().unwrap();
        assert_eq!(MnemosConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = MnemosConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
