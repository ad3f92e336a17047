//! Configuration options for the pet adoption client

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Default size limit for uploaded photos (5 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Configuration options for the pet adoption client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Storage bucket holding animal photos
    pub bucket: String,

    /// Folder inside the bucket new photos are written to
    pub image_folder: String,

    /// Largest accepted photo, in bytes
    pub max_image_bytes: usize,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Accept the built-in demo credentials when the lookup finds no account
    pub allow_fallback_login: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            bucket: "animals".to_string(),
            image_folder: "animals".to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            request_timeout: Some(Duration::from_secs(30)),
            allow_fallback_login: false,
        }
    }
}

impl ClientOptions {
    /// Set the storage bucket
    pub fn with_bucket(mut self, value: &str) -> Self {
        self.bucket = value.to_string();
        self
    }

    /// Set the folder new photos are stored under
    pub fn with_image_folder(mut self, value: &str) -> Self {
        self.image_folder = value.trim_matches('/').to_string();
        self
    }

    /// Set the photo size limit
    pub fn with_max_image_bytes(mut self, value: usize) -> Self {
        self.max_image_bytes = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Enable or disable the demo credentials
    pub fn with_fallback_login(mut self, value: bool) -> Self {
        self.allow_fallback_login = value;
        self
    }
}

/// Project endpoint, key and options
#[derive(Debug, Clone)]
pub struct AdoptionConfig {
    pub url: Url,
    pub anon_key: String,
    pub options: ClientOptions,
}

impl AdoptionConfig {
    pub fn new(url: &str, anon_key: &str, options: ClientOptions) -> Result<Self> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "unsupported URL scheme `{}`",
                url.scheme()
            )));
        }
        if anon_key.trim().is_empty() {
            return Err(Error::config("the anon key must not be empty"));
        }
        Ok(Self {
            url,
            anon_key: anon_key.trim().to_string(),
            options,
        })
    }

    /// Read the configuration from `SUPABASE_URL`, `SUPABASE_ANON_KEY` and
    /// the optional `ADOPTION_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SUPABASE_URL").ok_or_else(|| Error::config("SUPABASE_URL is not set"))?;
        let key = lookup("SUPABASE_ANON_KEY")
            .ok_or_else(|| Error::config("SUPABASE_ANON_KEY is not set"))?;

        let mut options = ClientOptions::default();
        if let Some(bucket) = lookup("ADOPTION_BUCKET") {
            options = options.with_bucket(&bucket);
        }
        if let Some(folder) = lookup("ADOPTION_IMAGE_FOLDER") {
            options = options.with_image_folder(&folder);
        }
        if let Some(max) = lookup("ADOPTION_MAX_IMAGE_BYTES") {
            let max = max.parse::<usize>().map_err(|e| {
                Error::config(format!("ADOPTION_MAX_IMAGE_BYTES: {}", e))
            })?;
            options = options.with_max_image_bytes(max);
        }
        if let Some(flag) = lookup("ADOPTION_ALLOW_FALLBACK_LOGIN") {
            options = options.with_fallback_login(parse_flag(&flag)?);
        }

        Self::new(&url, &key, options)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::config(format!(
            "ADOPTION_ALLOW_FALLBACK_LOGIN: expected a boolean, got `{}`",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_the_site() {
        let options = ClientOptions::default();
        assert_eq!(options.bucket, "animals");
        assert_eq!(options.max_image_bytes, 5 * 1024 * 1024);
        assert!(!options.allow_fallback_login);
    }

    #[test]
    fn reads_optional_variables() {
        let config = AdoptionConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("ADOPTION_BUCKET", "pets"),
            ("ADOPTION_IMAGE_FOLDER", "/photos/"),
            ("ADOPTION_MAX_IMAGE_BYTES", "1024"),
            ("ADOPTION_ALLOW_FALLBACK_LOGIN", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.options.bucket, "pets");
        assert_eq!(config.options.image_folder, "photos");
        assert_eq!(config.options.max_image_bytes, 1024);
        assert!(config.options.allow_fallback_login);
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = AdoptionConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://x.co")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(AdoptionConfig::new("ftp://x.co", "k", ClientOptions::default()).is_err());
        assert!(AdoptionConfig::new("not a url", "k", ClientOptions::default()).is_err());
        assert!(AdoptionConfig::new("https://x.co", " ", ClientOptions::default()).is_err());
    }
}
