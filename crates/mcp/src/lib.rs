// MCP (Model Context Protocol) server exposing the Pipedrive CRM as tools

pub mod lint;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::{register_all, Tool, ToolRegistry};
