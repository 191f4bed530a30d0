// Tool trait and the feature-gated registry

use crate::lint::lint_description;
use crate::protocol::{CallToolResult, JsonRpcError, ToolSchema};
use anyhow::Result;
use pipedrive_core::envelope::ToolResponse;
use pipedrive_core::input::sanitize_value;
use pipedrive_core::{FeatureError, FeatureRegistry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Id of the feature this tool belongs to
    fn feature(&self) -> &'static str;

    /// Execute the tool with sanitized arguments
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;
}

/// Tool registry gated by the enabled features.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    features: FeatureRegistry,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_features(features: FeatureRegistry) -> Self {
        Self {
            tools: BTreeMap::new(),
            features,
        }
    }

    pub fn features(&self) -> &FeatureRegistry {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureRegistry {
        &mut self.features
    }

    /// Register a tool under its feature. The feature must already exist.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), FeatureError> {
        let schema = tool.schema();
        for warning in lint_description(&schema) {
            warn!(tool = %schema.name, "{warning}");
        }
        self.features.register_tool(tool.feature(), schema.name.clone())?;
        debug!(tool = %schema.name, feature = tool.feature(), "Registered tool");
        self.tools.insert(schema.name, tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.tools
            .get(name)
            .is_some_and(|tool| self.features.is_feature_enabled(tool.feature()))
    }

    /// Schemas of the tools whose feature is enabled, sorted by name.
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .filter(|tool| self.features.is_feature_enabled(tool.feature()))
            .map(|tool| tool.schema())
            .collect()
    }

    /// Run a tool by name.
    ///
    /// Unknown tools are a protocol error. A tool whose feature is disabled
    /// answers with a plain explanation instead of running.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult, JsonRpcError> {
        let tool = self
            .get(name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {name}")))?;

        let feature = tool.feature();
        if !self.features.is_feature_enabled(feature) {
            warn!(tool = %name, feature, "Tool called but its feature is not enabled");
            return Ok(CallToolResult::error_text(format!(
                "This tool is not available because the '{feature}' feature is disabled. Please contact your administrator."
            )));
        }

        info!(tool = %name, "Calling tool");
        match tool.execute(sanitize_value(arguments)).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(tool = %name, error = %e, "Tool execution failed");
                let response = ToolResponse::error(format!("An unexpected error occurred: {e:#}"));
                Ok(CallToolResult::error_text(response.to_json()))
            }
        }
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: Value, description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

/// A string or an object, as accepted for addresses and locations.
pub fn json_schema_string_or_object(description: &str) -> Value {
    serde_json::json!({
        "type": ["string", "object"],
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipedrive_core::FeatureMetadata;
    use serde_json::json;

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".to_string(),
                description: "Echo".to_string(),
                input_schema: json_schema_object(json!({"text": json_schema_string("Text")}), vec![]),
            }
        }

        fn feature(&self) -> &'static str {
            "testing"
        }

        async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
            Ok(CallToolResult::text(arguments.to_string()))
        }
    }

    struct FailingTool;

    #[async_trait::async_trait]
    impl Tool for FailingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "fail".to_string(),
                description: String::new(),
                input_schema: json_schema_object(json!({}), vec![]),
            }
        }

        fn feature(&self) -> &'static str {
            "testing"
        }

        async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
            anyhow::bail!("disk on fire")
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .features_mut()
            .register_feature("testing", FeatureMetadata::new("Testing", "Test tools"));
        registry.register(Arc::new(EchoTool)).unwrap();
        registry.register(Arc::new(FailingTool)).unwrap();
        registry
    }

    #[test]
    fn test_register_requires_known_feature() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(Arc::new(EchoTool)).is_err());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_feature_hides_and_blocks_tools() {
        let registry = registry();
        assert!(registry.list_schemas().is_empty());

        let result = registry.call("echo", json!({"text": "hi"})).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            result.joined_text(),
            "This tool is not available because the 'testing' feature is disabled. Please contact your administrator."
        );
    }

    #[tokio::test]
    async fn test_call_sanitizes_arguments() {
        let mut registry = registry();
        registry.features_mut().enable_feature("testing").unwrap();
        assert_eq!(registry.list_schemas().len(), 2);

        let result = registry.call("echo", json!({"text": "  "})).await.unwrap();
        assert_eq!(result.joined_text(), r#"{"text":null}"#);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_failures() {
        let mut registry = registry();
        registry.features_mut().enable_feature("testing").unwrap();

        let err = registry.call("missing", json!({})).await.unwrap_err();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);

        let result = registry.call("fail", json!({})).await.unwrap();
        let envelope: Value = serde_json::from_str(&result.joined_text()).unwrap();
        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["error"], "An unexpected error occurred: disk on fire");
    }
}
