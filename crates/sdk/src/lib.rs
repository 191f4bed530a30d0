//! # Pipedrive SDK
//!
//! Async Rust client for the Pipedrive CRM REST API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pipedrive_sdk::{ListDealsParams, PipedriveClient, PipedriveResult};
//!
//! #[tokio::main]
//! async fn main() -> PipedriveResult<()> {
//!     let client = PipedriveClient::builder()
//!         .company_domain("acme")
//!         .api_token("your-api-token")
//!         .build()?;
//!
//!     let params = ListDealsParams {
//!         status: Some("open".to_string()),
//!         ..Default::default()
//!     };
//!     let page = client.deals().list(&params).await?;
//!     println!("Found {} open deals", page.items.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Environment
//!
//! [`Settings::from_env`] reads `PIPEDRIVE_API_TOKEN`, `PIPEDRIVE_COMPANY_DOMAIN`
//! and the optional `PIPEDRIVE_*` tuning variables.
//!
//! ## Cloud agent stream
//!
//! [`cloud::CloudAgentClient`] talks to the cloud agent wrapper over
//! Server-Sent Events.

pub mod api;
pub mod client;
pub mod cloud;
pub mod config;
pub mod error;
pub mod transport;

pub use api::{
    ActivitiesApi, DealsApi, GetDealParams, GetOrganizationParams, GetPersonParams, ItemSearchApi,
    LeadPage, LeadsApi, ListActivitiesParams, ListDealsParams, ListLeadsParams,
    ListOrganizationsParams, ListPersonsParams, OrganizationsApi, Page, PersonsApi,
    SearchDealsParams, SearchFieldParams, SearchItemsParams, SearchLeadsParams,
    SearchOrganizationsParams, SearchPersonsParams, UpdateLeadParams,
};
pub use client::{PipedriveClient, PipedriveClientBuilder};
pub use cloud::{CloudAgentClient, ExecRequest, StreamEvent};
pub use config::{AuthScheme, ClientConfig, RetryConfig, Settings};
pub use error::{PipedriveError, PipedriveResult};

pub use pipedrive_core::models;
