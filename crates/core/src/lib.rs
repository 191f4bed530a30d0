// Core records, conversions and registries for the Pipedrive MCP tools

pub mod conversion;
pub mod envelope;
pub mod error;
pub mod feature_config;
pub mod features;
pub mod input;
pub mod models;
pub mod session;

pub use envelope::{format_tool_response, ToolResponse};
pub use error::{ConversionError, FeatureError, ValidationError, ValidationResult};
pub use feature_config::FeatureConfig;
pub use features::{FeatureMetadata, FeatureRegistry};
pub use session::{Session, SessionManager};
