//! Which features are enabled at startup.
//!
//! Sources, first match wins:
//! 1. a JSON file `{"features": {"deals": true, ...}}`
//! 2. `PIPEDRIVE_FEATURE_<ID>` environment variables
//! 3. everything enabled, written back as the default file

use crate::error::FeatureError;
use crate::features::FeatureRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const FEATURE_CONFIG_PATH_ENV: &str = "FEATURE_CONFIG_PATH";
pub const DEFAULT_FEATURE_CONFIG_PATH: &str = "pipedrive_features.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfigFile {
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

/// Where the feature configuration ended up coming from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Environment,
    Default,
}

#[derive(Debug, Clone)]
pub struct FeatureConfig {
    path: PathBuf,
}

impl FeatureConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path from `FEATURE_CONFIG_PATH`, or the default file name.
    pub fn from_env() -> Self {
        let path = std::env::var(FEATURE_CONFIG_PATH_ENV)
            .unwrap_or_else(|_| DEFAULT_FEATURE_CONFIG_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, registry: &mut FeatureRegistry) -> ConfigSource {
        self.load_with_env(registry, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with_env<F>(&self, registry: &mut FeatureRegistry, env: F) -> ConfigSource
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.load_from_file(registry) {
            return ConfigSource::File;
        }
        if Self::load_from_env(registry, env) {
            return ConfigSource::Environment;
        }
        self.apply_default(registry);
        ConfigSource::Default
    }

    /// Returns true only when the file enabled at least one feature.
    fn load_from_file(&self, registry: &mut FeatureRegistry) -> bool {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Feature config file not found");
            return false;
        }

        let config = match read_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error loading feature config from file");
                return false;
            }
        };

        let mut any_enabled = false;
        for (feature_id, enabled) in &config.features {
            let result = if *enabled {
                registry.enable_feature(feature_id).map(|_| any_enabled = true)
            } else {
                registry.disable_feature(feature_id)
            };
            if result.is_err() {
                warn!(feature = %feature_id, "Feature from config is not registered");
            }
        }

        info!(path = %self.path.display(), "Loaded feature configuration");
        any_enabled
    }

    fn load_from_env<F>(registry: &mut FeatureRegistry, env: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        let feature_ids: Vec<String> = registry.get_all_features().keys().cloned().collect();
        let mut any_enabled = false;

        for feature_id in feature_ids {
            let key = format!("PIPEDRIVE_FEATURE_{}", feature_id.to_uppercase());
            let Some(value) = env(&key) else {
                continue;
            };
            let enabled = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "y" | "on"
            );
            let result = if enabled {
                registry.enable_feature(&feature_id)
            } else {
                registry.disable_feature(&feature_id)
            };
            match result {
                Ok(()) if enabled => {
                    any_enabled = true;
                    info!(feature = %feature_id, env = %key, "Enabled feature from environment");
                }
                Ok(()) => info!(feature = %feature_id, env = %key, "Disabled feature from environment"),
                Err(e) => warn!(feature = %feature_id, error = %e, "Feature from environment is not registered"),
            }
        }

        any_enabled
    }

    fn apply_default(&self, registry: &mut FeatureRegistry) {
        info!("Creating default feature configuration (all features enabled)");
        let feature_ids: Vec<String> = registry.get_all_features().keys().cloned().collect();
        for feature_id in &feature_ids {
            // Registered ids always enable.
            let _ = registry.enable_feature(feature_id);
        }
        if let Err(e) = self.save_config(registry) {
            error!(path = %self.path.display(), error = %e, "Error creating default feature config file");
        }
    }

    /// Current enabled state of every registered feature.
    pub fn snapshot(registry: &FeatureRegistry) -> FeatureConfigFile {
        FeatureConfigFile {
            features: registry
                .get_all_features()
                .keys()
                .map(|id| (id.clone(), registry.is_feature_enabled(id)))
                .collect(),
        }
    }

    pub fn to_json(registry: &FeatureRegistry) -> String {
        serde_json::to_string_pretty(&Self::snapshot(registry)).unwrap_or_default()
    }

    pub fn save_config(&self, registry: &FeatureRegistry) -> Result<(), FeatureError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FeatureError::Io(e.to_string()))?;
        }
        std::fs::write(&self.path, Self::to_json(registry))
            .map_err(|e| FeatureError::Io(e.to_string()))
    }
}

fn read_config(path: &Path) -> Result<FeatureConfigFile, FeatureError> {
    let content = std::fs::read_to_string(path).map_err(|e| FeatureError::Io(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| FeatureError::Parse(e.to_string()))
}
