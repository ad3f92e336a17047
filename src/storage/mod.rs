//! Object storage for animal photos

mod types;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::fetch::{Fetch, RemoteError};
use crate::gateway::BlobStore;

pub use types::*;

/// Client for the `/storage/v1` endpoint of a project
#[derive(Debug, Clone)]
pub struct StorageClient {
    url: String,
    key: String,
    client: Client,
}

impl StorageClient {
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
        }
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.url, path)
    }

    /// Get a client for a specific bucket
    pub fn from(&self, bucket_id: &str) -> StorageBucket {
        StorageBucket {
            storage: self.clone(),
            bucket_id: bucket_id.to_string(),
        }
    }
}

/// Client for one bucket
#[derive(Debug, Clone)]
pub struct StorageBucket {
    storage: StorageClient,
    bucket_id: String,
}

impl StorageBucket {
    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    /// Upload raw bytes to `path` inside the bucket
    pub async fn upload(
        &self,
        path: &str,
        data: Bytes,
        options: FileOptions,
    ) -> std::result::Result<UploadResponse, RemoteError> {
        let url = self
            .storage
            .get_url(&format!("/object/{}/{}", self.bucket_id, encode_path(path)));
        let content_type = options
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        debug!(bucket = %self.bucket_id, path, size = data.len(), "uploading object");

        Fetch::post(&self.storage.client, &url)
            .api_key(&self.storage.key)?
            .header("Cache-Control", "3600")?
            .header("x-upsert", if options.upsert { "true" } else { "false" })?
            .bytes(data.to_vec(), content_type)?
            .execute::<UploadResponse>()
            .await
    }

    /// Remove objects by their paths inside the bucket
    pub async fn remove<S: AsRef<str>>(
        &self,
        paths: &[S],
    ) -> std::result::Result<(), RemoteError> {
        let url = self.storage.get_url(&format!("/object/{}", self.bucket_id));
        let prefixes: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();

        Fetch::delete(&self.storage.client, &url)
            .api_key(&self.storage.key)?
            .json(&json!({ "prefixes": prefixes }))?
            .send()
            .await?;
        Ok(())
    }

    /// Public URL of an object in a public bucket
    pub fn get_public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.storage.url,
            urlencoding::encode(&self.bucket_id),
            encode_path(path)
        )
    }
}

/// Percent-encode each segment of an object key, keeping the `/` separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl BlobStore for StorageBucket {
    fn bucket(&self) -> &str {
        &self.bucket_id
    }

    async fn upload(&self, path: &str, data: Bytes, options: FileOptions) -> Result<()> {
        StorageBucket::upload(self, path, data, options).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.get_public_url(path)
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        StorageBucket::remove(self, paths).await?;
        Ok(())
    }
}
