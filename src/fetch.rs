//! HTTP plumbing shared by the PostgREST and Storage clients

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Value sent in the `X-Client-Info` header
pub const CLIENT_INFO: &str = concat!("pet-adoption/", env!("CARGO_PKG_VERSION"));

/// Error body returned by PostgREST and the Storage API
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Failure of a single backend call
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("API error: {details} (Status: {status})")]
    Api {
        details: ApiErrorDetails,
        status: StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    Unparsed { message: String, status: StatusCode },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Postgres / Storage error code, when the backend sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            RemoteError::Api { details, .. } => details.code.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of the failed call, when a response was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RemoteError::Api { status, .. } | RemoteError::Unparsed { status, .. } => {
                Some(*status)
            }
            RemoteError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Turns a non-success response into an error, parsing the JSON error body when possible.
    pub(crate) async fn from_response(response: Response) -> Self {
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return RemoteError::Network(e),
        };
        match serde_json::from_str::<ApiErrorDetails>(&text) {
            Ok(details) if details.message.is_some() || details.code.is_some() => {
                RemoteError::Api { details, status }
            }
            _ => RemoteError::Unparsed {
                message: text,
                status,
            },
        }
    }
}

/// Builder for one HTTP request against the backend
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-client-info"),
            HeaderValue::from_static(CLIENT_INFO),
        );

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query: Vec::new(),
            body: None,
        }
    }

    /// Add a header; invalid names or values are rejected
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, RemoteError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RemoteError::InvalidRequest(format!("Invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| RemoteError::InvalidRequest(format!("Invalid header value for {}", name.as_str())))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// `apikey` plus bearer authorization, as every Supabase endpoint expects
    pub fn api_key(self, key: &str) -> Result<Self, RemoteError> {
        self.header("apikey", key)?
            .header("Authorization", &format!("Bearer {}", key))
    }

    pub fn query(mut self, params: &[(String, String)]) -> Self {
        self.query.extend(params.iter().cloned());
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, RemoteError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| RemoteError::InvalidRequest(format!("Cannot encode body: {}", e)))?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// Raw body with an explicit content type
    pub fn bytes(mut self, body: Vec<u8>, content_type: &str) -> Result<Self, RemoteError> {
        self = self.header("Content-Type", content_type)?;
        self.body = Some(body);
        Ok(self)
    }

    /// Send the request; non-2xx responses become [`RemoteError`]
    pub async fn send(self) -> Result<Response, RemoteError> {
        let mut req = self
            .client
            .request(self.method, self.url.as_str())
            .headers(self.headers);
        if !self.query.is_empty() {
            req = req.query(&self.query);
        }
        if let Some(body) = self.body {
            req = req.body(body);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::from_response(response).await);
        }
        Ok(response)
    }

    /// Send the request and decode the JSON response body
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T, RemoteError> {
        let response = self.send().await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| RemoteError::Decode(format!("{}: {}", e, text)))
    }
}

/// Entry points for building requests
pub struct Fetch;

impl Fetch {
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    pub fn patch<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PATCH)
    }

    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}
