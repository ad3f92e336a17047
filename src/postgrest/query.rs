//! Query builder for a single table

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::fetch::{Fetch, FetchBuilder, RemoteError};
use crate::postgrest::filter::{Filter, SortOrder};

/// Builder for select, insert, update and delete calls on one table
#[derive(Debug, Clone)]
pub struct TableQuery {
    url: String,
    api_key: String,
    client: Client,
    columns: Option<String>,
    filters: Vec<Filter>,
    order: Vec<(String, SortOrder)>,
    limit: Option<usize>,
}

impl TableQuery {
    pub(crate) fn new(url: String, api_key: String, client: Client) -> Self {
        Self {
            url,
            api_key,
            client,
            columns: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Columns to return; embedded resources use PostgREST syntax, e.g.
    /// `id,status,animal:animals(name)`
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn neq<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(Filter::neq(column, value))
    }

    pub fn in_list<S: AsRef<str>>(self, column: &str, values: &[S]) -> Self {
        self.filter(Filter::in_list(column, values))
    }

    pub fn not_in<S: AsRef<str>>(self, column: &str, values: &[S]) -> Self {
        self.filter(Filter::not_in(column, values))
    }

    /// Order by a column; may be called repeatedly for secondary keys
    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.order.push((column.to_string(), order));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Query parameters in the order PostgREST receives them
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(columns) = &self.columns {
            params.push(("select".to_string(), columns.clone()));
        }
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|(column, dir)| format!("{}.{}", column, dir.as_str()))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    fn authorize<'a>(&self, builder: FetchBuilder<'a>) -> Result<FetchBuilder<'a>, RemoteError> {
        builder.api_key(&self.api_key)
    }

    fn require_filter(&self, verb: &str) -> Result<(), RemoteError> {
        if self.filters.is_empty() {
            return Err(RemoteError::InvalidRequest(format!(
                "refusing to {} without a filter on {}",
                verb, self.url
            )));
        }
        Ok(())
    }

    /// Run the select and decode every row
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, RemoteError> {
        self.authorize(Fetch::get(&self.client, &self.url))?
            .query(&self.params())
            .execute::<Vec<T>>()
            .await
    }

    /// Run the select limited to one row
    pub async fn single<T: DeserializeOwned>(self) -> Result<Option<T>, RemoteError> {
        let rows = self.limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one or more rows and return their representation
    pub async fn insert<B, T>(&self, rows: &B) -> Result<Vec<T>, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let params: Vec<(String, String)> = self
            .columns
            .iter()
            .map(|c| ("select".to_string(), c.clone()))
            .collect();
        self.authorize(Fetch::post(&self.client, &self.url))?
            .header("Prefer", "return=representation")?
            .query(&params)
            .json(rows)?
            .execute::<Vec<T>>()
            .await
    }

    /// Patch every row matching the filters and return the changed rows
    pub async fn update<B, T>(&self, values: &B) -> Result<Vec<T>, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.require_filter("update")?;
        self.authorize(Fetch::patch(&self.client, &self.url))?
            .header("Prefer", "return=representation")?
            .query(&self.params())
            .json(values)?
            .execute::<Vec<T>>()
            .await
    }

    /// Delete every row matching the filters
    pub async fn delete(&self) -> Result<(), RemoteError> {
        self.require_filter("delete")?;
        self.authorize(Fetch::delete(&self.client, &self.url))?
            .header("Prefer", "return=minimal")?
            .query(&self.params())
            .send()
            .await?;
        Ok(())
    }
}
