//! Transport layer for the Pipedrive SDK.

pub mod http;

pub use http::{ApiVersion, HttpTransport, QueryParams};
