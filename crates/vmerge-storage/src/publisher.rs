//! Publishing finished clips and deriving their public URLs.

use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::{S3Client, StorageConfig};
use crate::error::{StorageError, StorageResult};

/// Pushes a local file to durable storage and returns its public URL.
#[async_trait]
pub trait StoragePublisher: Send + Sync {
    /// Upload `local` under a namespaced key derived from `logical_name`.
    ///
    /// A single attempt: a failed upload is reported, never resumed.
    async fn publish(&self, local: &Path, logical_name: &str) -> StorageResult<String>;

    /// Whether the destination is reachable and configured.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Object key for `name` under `prefix`.
///
/// Leading and trailing slashes are stripped from both parts. Names that
/// are empty or contain `..` segments are rejected.
pub fn object_key(prefix: &str, name: &str) -> StorageResult<String> {
    let name = name.trim_matches('/');
    if name.is_empty() {
        return Err(StorageError::invalid_key("empty object name"));
    }
    if name.split('/').any(|segment| segment == ".." || segment.is_empty()) {
        return Err(StorageError::invalid_key(format!("invalid object name: {name}")));
    }

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Ok(name.to_string())
    } else {
        Ok(format!("{prefix}/{name}"))
    }
}

/// Public URL for `key`: `{base}/{key}` with exactly one slash between.
pub fn public_url(base: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

enum Backend {
    Ready {
        client: S3Client,
        public_base_url: String,
        key_prefix: String,
    },
    /// Missing settings are reported when a publish is attempted.
    Unconfigured(String),
}

/// `StoragePublisher` backed by an S3-compatible bucket.
pub struct ObjectStorePublisher {
    backend: Backend,
}

impl ObjectStorePublisher {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            backend: Backend::Ready {
                client: S3Client::new(config),
                public_base_url: config.public_base_url.clone(),
                key_prefix: config.key_prefix.clone(),
            },
        }
    }

    /// Build from environment variables.
    ///
    /// Never fails: missing settings leave the publisher unconfigured so
    /// the process can still start and accept jobs.
    pub fn from_env() -> Self {
        match StorageConfig::from_env() {
            Ok(config) => Self::new(&config),
            Err(e) => {
                warn!("Object storage not configured: {}", e);
                Self::unconfigured(e.to_string())
            }
        }
    }

    /// A publisher that fails every publish with a configuration error.
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            backend: Backend::Unconfigured(reason.into()),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.backend, Backend::Ready { .. })
    }
}

#[async_trait]
impl StoragePublisher for ObjectStorePublisher {
    async fn publish(&self, local: &Path, logical_name: &str) -> StorageResult<String> {
        let (client, public_base_url, key_prefix) = match &self.backend {
            Backend::Ready {
                client,
                public_base_url,
                key_prefix,
            } => (client, public_base_url, key_prefix),
            Backend::Unconfigured(reason) => {
                return Err(StorageError::config_error(reason.clone()));
            }
        };

        let key = object_key(key_prefix, logical_name)?;
        client
            .upload_file(local, &key, content_type_for(local))
            .await?;

        let url = public_url(public_base_url, &key);
        info!(bucket = client.bucket(), key = %key, "Published clip: {}", url);
        Ok(url)
    }

    async fn health_check(&self) -> StorageResult<()> {
        match &self.backend {
            Backend::Ready { client, .. } => client.check_connectivity().await,
            Backend::Unconfigured(reason) => Err(StorageError::config_error(reason.clone())),
        }
    }
}
