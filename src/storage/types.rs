//! Types for storage operations

use serde::Deserialize;

/// Options for uploading a file
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// Content type header
    pub content_type: Option<String>,

    /// Whether an existing object at the same path may be overwritten
    pub upsert: bool,
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

/// Response of a successful upload
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// `<bucket>/<path>` of the stored object
    #[serde(rename = "Key", default)]
    pub key: Option<String>,
}
