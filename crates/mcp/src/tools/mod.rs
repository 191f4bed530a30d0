pub mod activities;
pub mod common;
pub mod deals;
pub mod item_search;
pub mod leads;
pub mod organizations;
pub mod persons;
mod registry;

pub use registry::{
    json_schema_array, json_schema_boolean, json_schema_object, json_schema_string,
    json_schema_string_or_object, Tool, ToolRegistry,
};

use pipedrive_core::{FeatureError, FeatureMetadata, FeatureRegistry};
use pipedrive_sdk::PipedriveClient;
use std::sync::Arc;

/// Register the entity features every tool belongs to. None are enabled yet.
pub fn register_features(features: &mut FeatureRegistry) {
    let entries = [
        (activities::FEATURE, "Activities", "Tools for managing activity entities in Pipedrive"),
        (deals::FEATURE, "Deals", "Tools for managing deal entities in Pipedrive"),
        (leads::FEATURE, "Leads", "Tools for managing lead entities in Pipedrive"),
        (
            organizations::FEATURE,
            "Organizations",
            "Tools for managing organization entities in Pipedrive",
        ),
        (persons::FEATURE, "Persons", "Tools for managing person entities in Pipedrive"),
        (
            item_search::FEATURE,
            "Item Search",
            "Tools for searching across different item types in Pipedrive",
        ),
    ];
    for (id, name, description) in entries {
        features.register_feature(id, FeatureMetadata::new(name, description));
    }
}

/// Every tool, grouped by feature.
pub fn all_tools(client: &PipedriveClient) -> Vec<Arc<dyn Tool>> {
    let mut tools = activities::tools(client);
    tools.extend(deals::tools(client));
    tools.extend(leads::tools(client));
    tools.extend(organizations::tools(client));
    tools.extend(persons::tools(client));
    tools.extend(item_search::tools(client));
    tools
}

/// Register the features and all their tools against one client.
pub fn register_all(registry: &mut ToolRegistry, client: &PipedriveClient) -> Result<(), FeatureError> {
    register_features(registry.features_mut());
    for tool in all_tools(client) {
        registry.register(tool)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::protocol::CallToolResult;
    use pipedrive_sdk::{PipedriveClient, RetryConfig};
    use serde_json::Value;
    use wiremock::MockServer;

    pub fn client_for(base_url: &str) -> PipedriveClient {
        PipedriveClient::builder()
            .base_url(base_url)
            .api_token("test-token-123")
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    pub fn mock_client(server: &MockServer) -> PipedriveClient {
        client_for(&server.uri())
    }

    /// The JSON envelope carried by a tool result.
    pub fn envelope(result: &CallToolResult) -> Value {
        serde_json::from_str(&result.joined_text()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::client_for;
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_register_all_tools() {
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, &client_for("http://localhost:1")).unwrap();

        assert_eq!(registry.len(), 39);
        assert_eq!(registry.features().get_all_features().len(), 6);
        assert_eq!(registry.features().get_tool_count(Some("persons")), 6);
        assert_eq!(registry.features().get_tool_count(Some("item_search")), 2);
        assert_eq!(
            registry.features().feature_for_tool("update_product_in_deal_in_pipedrive"),
            Some("deals")
        );
        // Nothing is listed until a feature is enabled.
        assert!(registry.list_schemas().is_empty());
    }

    #[test]
    fn test_tool_names_are_unique() {
        let tools = all_tools(&client_for("http://localhost:1"));
        let names: BTreeSet<String> = tools.iter().map(|t| t.schema().name).collect();
        assert_eq!(names.len(), tools.len());
        assert!(names.iter().all(|n| n.ends_with("_pipedrive")));
    }

    #[test]
    fn test_enabling_one_feature_lists_only_its_tools() {
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, &client_for("http://localhost:1")).unwrap();
        registry.features_mut().enable_feature("leads").unwrap();

        let names: Vec<String> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"get_lead_labels_from_pipedrive".to_string()));
        assert!(registry.is_enabled("get_lead_from_pipedrive"));
        assert!(!registry.is_enabled("get_deal_from_pipedrive"));
    }
}
