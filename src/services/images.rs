//! Photo upload and removal

use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::gateway::BlobStore;
use crate::storage::FileOptions;

const DEFAULT_EXTENSION: &str = "jpg";

/// An image file picked by the user
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: &str, content_type: &str, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data: data.into(),
        }
    }

    /// Lower-cased extension of the file name, `jpg` when there is none
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }
}

#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn BlobStore>,
    folder: String,
    max_bytes: usize,
}

impl ImageService {
    pub fn new(store: Arc<dyn BlobStore>, folder: &str, max_bytes: usize) -> Self {
        Self {
            store,
            folder: folder.trim_matches('/').to_string(),
            max_bytes,
        }
    }

    fn check(&self, image: &ImageUpload) -> Result<()> {
        if image.data.is_empty() {
            return Err(Error::validation("choose a photo to upload"));
        }
        if !image.content_type.starts_with("image/") {
            return Err(Error::validation("the selected file is not an image"));
        }
        if image.data.len() > self.max_bytes {
            return Err(Error::validation(format!(
                "the photo is too large (max {} bytes)",
                self.max_bytes
            )));
        }
        Ok(())
    }

    fn object_path(&self, image: &ImageUpload) -> String {
        let name = format!(
            "{}_{}.{}",
            Uuid::new_v4(),
            Utc::now().timestamp_millis(),
            image.extension()
        );
        if self.folder.is_empty() {
            name
        } else {
            format!("{}/{}", self.folder, name)
        }
    }

    /// Store the photo under a fresh name and return its public URL
    pub async fn upload(&self, image: &ImageUpload) -> Result<String> {
        self.check(image)?;

        let path = self.object_path(image);
        let options = FileOptions::new()
            .with_content_type(&image.content_type)
            .with_upsert(false);
        self.store.upload(&path, image.data.clone(), options).await?;

        info!(bucket = self.store.bucket(), path = %path, "photo uploaded");
        Ok(self.store.public_url(&path))
    }

    /// Remove the object behind a public URL.
    ///
    /// URLs that do not point into this bucket are ignored and yield
    /// `Ok(false)` without a storage call.
    pub async fn remove(&self, public_url: &str) -> Result<bool> {
        let Some(key) = storage_path_from_public_url(public_url, self.store.bucket()) else {
            debug!(url = public_url, "not a photo in this bucket, nothing to delete");
            return Ok(false);
        };
        self.store.remove(std::slice::from_ref(&key)).await?;
        info!(bucket = self.store.bucket(), path = %key, "photo removed");
        Ok(true)
    }

    /// Best-effort [`remove`](Self::remove): storage errors are logged, never
    /// raised. Returns whether an object was removed.
    pub async fn delete(&self, public_url: &str) -> bool {
        match self.remove(public_url).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(url = public_url, error = %e, "could not remove photo");
                false
            }
        }
    }
}

/// Object key inside `bucket` for a public URL of the form
/// `.../object/public/<bucket>/<key...>`
pub fn storage_path_from_public_url(public_url: &str, bucket: &str) -> Option<String> {
    let url = Url::parse(public_url).ok()?;
    let segments: Vec<String> = url
        .path_segments()?
        .map(|s| urlencoding::decode(s).map(|s| s.into_owned()))
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    let public = segments.iter().position(|s| s == "public")?;
    if segments.get(public + 1)? != bucket {
        return None;
    }
    let key = segments[public + 2..]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("/");
    (!key.is_empty()).then_some(key)
}
