// SPDX-License-Identifier: MIT

//! Pack configuration
//!
//! Loaded from YAML. Every field has a default so an empty document (or no
//! file at all) yields the stock Flux Continuum setup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::runtime::ContinuumError;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CONTINUUM_CONFIG";

/// Event name the control bridge publishes state changes under
pub const DEFAULT_BRIDGE_EVENT: &str = "impact-bridge-continue";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PackConfig {
    /// Root of every node category, e.g. `Flux-Continuum` -> `Flux-Continuum/Sliders`
    pub category_root: String,
    /// Host event used by the control bridge
    pub bridge_event: String,
    /// Sampler names accepted by the sampler packer
    pub samplers: Vec<String>,
    /// Scheduler names accepted by the sampler packer
    pub schedulers: Vec<String>,
    /// Resolution labels offered by the resolution picker
    pub resolutions: Vec<String>,
    pub default_resolution: String,
}

impl PackConfig {
    pub fn category(&self, leaf: &str) -> String {
        format!("{}/{}", self.category_root, leaf)
    }

    fn validate(&self) -> Result<(), ContinuumError> {
        if self.category_root.trim().is_empty() {
            return Err(ContinuumError::config("category_root must not be empty"));
        }
        if self.bridge_event.trim().is_empty() {
            return Err(ContinuumError::config("bridge_event must not be empty"));
        }
        if !self.resolutions.contains(&self.default_resolution) {
            return Err(ContinuumError::config(format!(
                "default_resolution '{}' is not one of the configured resolutions",
                self.default_resolution
            )));
        }
        Ok(())
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            category_root: "Flux-Continuum".to_string(),
            bridge_event: DEFAULT_BRIDGE_EVENT.to_string(),
            samplers: to_strings(DEFAULT_SAMPLERS),
            schedulers: to_strings(DEFAULT_SCHEDULERS),
            resolutions: to_strings(DEFAULT_RESOLUTIONS),
            default_resolution: "1024x1024 (1.0)".to_string(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const DEFAULT_SAMPLERS: &[&str] = &[
    "euler",
    "euler_cfg_pp",
    "euler_ancestral",
    "heun",
    "heunpp2",
    "dpm_2",
    "dpm_2_ancestral",
    "lms",
    "dpm_fast",
    "dpm_adaptive",
    "dpmpp_2s_ancestral",
    "dpmpp_sde",
    "dpmpp_2m",
    "dpmpp_2m_sde",
    "dpmpp_3m_sde",
    "ddpm",
    "lcm",
    "ipndm",
    "deis",
    "ddim",
    "uni_pc",
    "uni_pc_bh2",
];

const DEFAULT_SCHEDULERS: &[&str] = &[
    "normal",
    "karras",
    "exponential",
    "sgm_uniform",
    "simple",
    "ddim_uniform",
    "beta",
];

const DEFAULT_RESOLUTIONS: &[&str] = &[
    "704x1408 (0.5)",
    "704x1344 (0.52)",
    "768x1344 (0.57)",
    "768x1280 (0.6)",
    "832x1216 (0.68)",
    "832x1152 (0.72)",
    "896x1152 (0.78)",
    "896x1088 (0.82)",
    "960x1088 (0.88)",
    "960x1024 (0.94)",
    "1024x1024 (1.0)",
    "1024x960 (1.07)",
    "1088x960 (1.13)",
    "1088x896 (1.21)",
    "1152x896 (1.29)",
    "1152x832 (1.38)",
    "1216x832 (1.46)",
    "1280x768 (1.67)",
    "1344x768 (1.75)",
    "1344x704 (1.91)",
    "1408x704 (2.0)",
    "1472x704 (2.09)",
    "1536x640 (2.4)",
    "1600x640 (2.5)",
    "1664x576 (2.89)",
    "1728x576 (3.0)",
];

/// Loads `PackConfig` from YAML files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a config file
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PackConfig, ContinuumError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ContinuumError::config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::parse_yaml(&content)
    }

    /// Parse and validate a config document
    pub fn parse_yaml(content: &str) -> Result<PackConfig, ContinuumError> {
        let config: Option<PackConfig> = serde_yaml::from_str(content)?;
        let config = config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Config from an explicit path, else `CONTINUUM_CONFIG`, else defaults
    pub fn resolve(path: Option<&str>) -> Result<PackConfig, ContinuumError> {
        let from_env = std::env::var(CONFIG_ENV).ok();
        match path.or(from_env.as_deref()) {
            Some(path) => {
                log::info!("Loading pack config from {}", path);
                Self::load_config(path)
            }
            None => Ok(PackConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = PackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolutions.len(), 26);
        assert_eq!(config.category("Sliders"), "Flux-Continuum/Sliders");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
category_root: "My-Pack"
bridge_event: "bridge-update"
"#;
        let config = ConfigLoader::parse_yaml(yaml).unwrap();
        assert_eq!(config.category("Utilities"), "My-Pack/Utilities");
        assert_eq!(config.bridge_event, "bridge-update");
        assert_eq!(config.default_resolution, "1024x1024 (1.0)");
        assert!(config.samplers.contains(&"euler".to_string()));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ConfigLoader::parse_yaml("").unwrap();
        assert_eq!(config, PackConfig::default());
    }

    #[test]
    fn test_default_resolution_must_be_listed() {
        let yaml = r#"
resolutions: ["512x512 (1.0)"]
"#;
        let result = ConfigLoader::parse_yaml(yaml);
        assert!(matches!(result, Err(ContinuumError::Config(_))));
    }

    #[test]
    fn test_invalid_yaml_returns_error() {
        let yaml = r#"
samplers:
  nested: [not, a, list
"#;
        assert!(ConfigLoader::parse_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "schedulers: [normal, karras]").unwrap();

        let config = ConfigLoader::load_config(file.path()).unwrap();
        assert_eq!(config.schedulers, vec!["normal", "karras"]);
        assert!(ConfigLoader::load_config("/nonexistent/pack.yaml").is_err());
    }
}
