//! Registry of tool groups ("features") and their enabled state.

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{info, warn};

pub const DEFAULT_FEATURE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl FeatureMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version: DEFAULT_FEATURE_VERSION.to_string(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }
}

/// Summary of one feature, as reported over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStatus {
    pub id: String,
    #[serde(flatten)]
    pub metadata: FeatureMetadata,
    pub enabled: bool,
    pub tool_count: usize,
}

#[derive(Debug, Default)]
pub struct FeatureRegistry {
    features: BTreeMap<String, FeatureMetadata>,
    enabled: BTreeSet<String>,
    tools: BTreeMap<String, BTreeSet<String>>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature. Re-registering replaces its metadata.
    pub fn register_feature(&mut self, id: impl Into<String>, metadata: FeatureMetadata) {
        let id = id.into();
        info!(feature = %id, "Registered feature: {}", metadata.name);
        self.tools.entry(id.clone()).or_default();
        self.features.insert(id, metadata);
    }

    pub fn register_tool(
        &mut self,
        feature_id: &str,
        tool_name: impl Into<String>,
    ) -> Result<(), FeatureError> {
        let tools = self
            .tools
            .get_mut(feature_id)
            .ok_or_else(|| FeatureError::UnknownFeature(feature_id.to_string()))?;
        tools.insert(tool_name.into());
        Ok(())
    }

    /// Enable a feature together with its registered dependencies.
    pub fn enable_feature(&mut self, id: &str) -> Result<(), FeatureError> {
        let metadata = self
            .features
            .get(id)
            .cloned()
            .ok_or_else(|| FeatureError::UnknownFeature(id.to_string()))?;

        if !self.enabled.insert(id.to_string()) {
            return Ok(());
        }
        info!(feature = %id, "Enabled feature: {}", metadata.name);

        for dependency in &metadata.dependencies {
            if self.features.contains_key(dependency) {
                self.enable_feature(dependency)?;
            } else {
                warn!(
                    feature = %id,
                    dependency = %dependency,
                    "Feature dependency is not registered"
                );
            }
        }
        Ok(())
    }

    pub fn disable_feature(&mut self, id: &str) -> Result<(), FeatureError> {
        if !self.features.contains_key(id) {
            return Err(FeatureError::UnknownFeature(id.to_string()));
        }
        if self.enabled.remove(id) {
            info!(feature = %id, "Disabled feature");
        }
        Ok(())
    }

    pub fn is_feature_enabled(&self, id: &str) -> bool {
        self.enabled.contains(id)
    }

    pub fn get_feature_metadata(&self, id: &str) -> Option<&FeatureMetadata> {
        self.features.get(id)
    }

    pub fn get_all_features(&self) -> &BTreeMap<String, FeatureMetadata> {
        &self.features
    }

    pub fn get_enabled_features(&self) -> BTreeMap<String, FeatureMetadata> {
        self.features
            .iter()
            .filter(|(id, _)| self.enabled.contains(*id))
            .map(|(id, metadata)| (id.clone(), metadata.clone()))
            .collect()
    }

    /// Names of every tool that belongs to an enabled feature.
    pub fn get_enabled_tools(&self) -> BTreeSet<String> {
        self.tools
            .iter()
            .filter(|(feature, _)| self.enabled.contains(*feature))
            .flat_map(|(_, tools)| tools.iter().cloned())
            .collect()
    }

    /// Tool count for one feature, or across all features.
    pub fn get_tool_count(&self, feature_id: Option<&str>) -> usize {
        match feature_id {
            Some(id) => self.tools.get(id).map_or(0, BTreeSet::len),
            None => self.tools.values().map(BTreeSet::len).sum(),
        }
    }

    pub fn feature_for_tool(&self, tool_name: &str) -> Option<&str> {
        self.tools
            .iter()
            .find(|(_, tools)| tools.contains(tool_name))
            .map(|(feature, _)| feature.as_str())
    }

    pub fn statuses(&self) -> Vec<FeatureStatus> {
        self.features
            .iter()
            .map(|(id, metadata)| FeatureStatus {
                id: id.clone(),
                metadata: metadata.clone(),
                enabled: self.enabled.contains(id),
                tool_count: self.get_tool_count(Some(id)),
            })
            .collect()
    }
}

impl fmt::Display for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FeatureRegistry: {}/{} features enabled, {} tools registered",
            self.enabled.len(),
            self.features.len(),
            self.get_tool_count(None)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        registry.register_feature("persons", FeatureMetadata::new("Persons", "Person tools"));
        registry.register_feature(
            "deals",
            FeatureMetadata::new("Deals", "Deal tools").with_dependencies(&["persons", "missing"]),
        );
        registry.register_tool("persons", "get_person_from_pipedrive").unwrap();
        registry.register_tool("deals", "get_deal_from_pipedrive").unwrap();
        registry.register_tool("deals", "list_deals_from_pipedrive").unwrap();
        registry
    }

    #[test]
    fn test_metadata_defaults() {
        let metadata = FeatureMetadata::new("Deals", "Deal tools");
        assert_eq!(metadata.version, "1.0.0");
        assert!(metadata.dependencies.is_empty());
    }

    #[test]
    fn test_register_tool_requires_feature() {
        let mut registry = registry();
        assert_eq!(
            registry.register_tool("leads", "x"),
            Err(FeatureError::UnknownFeature("leads".to_string()))
        );
    }

    #[test]
    fn test_enable_propagates_to_dependencies() {
        let mut registry = registry();
        registry.enable_feature("deals").unwrap();
        assert!(registry.is_feature_enabled("deals"));
        assert!(registry.is_feature_enabled("persons"));
        assert_eq!(registry.get_enabled_tools().len(), 3);
        assert!(registry.enable_feature("leads").is_err());
    }

    #[test]
    fn test_disable_hides_tools() {
        let mut registry = registry();
        registry.enable_feature("deals").unwrap();
        registry.disable_feature("persons").unwrap();
        let tools = registry.get_enabled_tools();
        assert!(!tools.contains("get_person_from_pipedrive"));
        assert!(tools.contains("get_deal_from_pipedrive"));
        assert_eq!(registry.get_enabled_features().len(), 1);
    }

    #[test]
    fn test_counts_and_lookup() {
        let mut registry = registry();
        assert_eq!(registry.get_tool_count(None), 3);
        assert_eq!(registry.get_tool_count(Some("deals")), 2);
        assert_eq!(registry.get_tool_count(Some("nope")), 0);
        assert_eq!(
            registry.feature_for_tool("list_deals_from_pipedrive"),
            Some("deals")
        );

        registry.enable_feature("persons").unwrap();
        assert_eq!(
            registry.to_string(),
            "FeatureRegistry: 1/2 features enabled, 3 tools registered"
        );
    }

    #[test]
    fn test_cyclic_dependencies_terminate() {
        let mut registry = FeatureRegistry::new();
        registry.register_feature("a", FeatureMetadata::new("A", "").with_dependencies(&["b"]));
        registry.register_feature("b", FeatureMetadata::new("B", "").with_dependencies(&["a"]));
        registry.enable_feature("a").unwrap();
        assert!(registry.is_feature_enabled("b"));
    }
}
