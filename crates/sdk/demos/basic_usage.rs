//! Basic SDK usage example.
//!
//! Reads `PIPEDRIVE_API_TOKEN` and `PIPEDRIVE_COMPANY_DOMAIN`, creates a
//! person and a deal for them, then searches for the deal.
//!
//! Run with: cargo run --example basic_usage

use pipedrive_sdk::models::{ApiRecord, ContactInfo, Deal, Person};
use pipedrive_sdk::{PipedriveClient, PipedriveResult, SearchDealsParams, Settings};

#[tokio::main]
async fn main() -> PipedriveResult<()> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env()?;
    let client = PipedriveClient::from_settings(&settings)?;

    println!("Creating person...");
    let person = Person {
        emails: vec![ContactInfo::email("ann@example.com", "work")],
        ..Person::new("Ann Example")
    }
    .validate()
    .map_err(|e| pipedrive_sdk::PipedriveError::InvalidInput(e.to_string()))?;
    let person = client.persons().create(&person).await?;
    let person_id = person["id"].as_i64().unwrap_or_default();
    println!("  Person {person_id} created");

    println!("Creating deal...");
    let deal = Deal {
        value: Some(1200.0),
        person_id: Some(person_id),
        ..Deal::new("Example license")
    };
    let deal = client.deals().create(&deal).await?;
    println!("  Deal {} created", deal["id"]);

    println!("Searching deals...");
    let params = SearchDealsParams {
        term: "Example".to_string(),
        ..Default::default()
    };
    let page = client.deals().search(&params).await?;
    for hit in &page.items {
        println!("  {} ({})", hit["item"]["title"], hit["result_score"]);
    }

    Ok(())
}
