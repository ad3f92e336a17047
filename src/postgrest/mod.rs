//! Table access through the PostgREST API

mod filter;
mod query;

use reqwest::Client;

pub use filter::*;
pub use query::*;

/// Client for the `/rest/v1` endpoint of a project
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl PostgrestClient {
    pub fn new(base_url: &str, api_key: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    /// Start a query on a table or view
    pub fn from(&self, table: &str) -> TableQuery {
        TableQuery::new(
            format!("{}/rest/v1/{}", self.base_url, table),
            self.api_key.clone(),
            self.client.clone(),
        )
    }
}
