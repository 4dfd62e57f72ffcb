//! S3-compatible client implementation.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Default key prefix for published clips.
pub const DEFAULT_KEY_PREFIX: &str = "videos";

/// Configuration for the object store.
#[derive(Clone)]
pub struct StorageConfig {
    /// Custom S3 endpoint (R2, MinIO); AWS endpoints when `None`
    pub endpoint_url: Option<String>,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2)
    pub region: String,
    /// Base of the public URLs handed back to clients
    pub public_base_url: String,
    /// Namespace every object key starts with
    pub key_prefix: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("public_base_url", &self.public_base_url)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| StorageError::config_error(format!("{name} not set")))
        };

        Ok(Self {
            endpoint_url: get("S3_ENDPOINT_URL"),
            access_key_id: require("S3_ACCESS_KEY_ID")?,
            secret_access_key: require("S3_SECRET_ACCESS_KEY")?,
            bucket_name: require("S3_BUCKET_NAME")?,
            region: get("S3_REGION").unwrap_or_else(|| "auto".to_string()),
            public_base_url: require("S3_PUBLIC_BASE_URL")?,
            key_prefix: get("S3_KEY_PREFIX").unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
        })
    }
}

/// Thin wrapper over the AWS S3 client bound to one bucket.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a new client from configuration.
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vmerge",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket_name.clone(),
        }
    }

    /// Bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload a file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {e}", path.display())))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(format!("{key}: {e}")))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("Storage connectivity check failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_lookup_with_defaults() {
        let env = vars(&[
            ("S3_ACCESS_KEY_ID", "key"),
            ("S3_SECRET_ACCESS_KEY", "secret"),
            ("S3_BUCKET_NAME", "clips"),
            ("S3_PUBLIC_BASE_URL", "https://cdn.example.com"),
        ]);
        let config = StorageConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.region, "auto");
        assert_eq!(config.key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(config.bucket_name, "clips");
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let env = vars(&[
            ("S3_ACCESS_KEY_ID", "key"),
            ("S3_SECRET_ACCESS_KEY", "secret"),
            ("S3_BUCKET_NAME", ""),
        ]);
        let err = StorageConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("S3_BUCKET_NAME"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let env = vars(&[
            ("S3_ACCESS_KEY_ID", "key"),
            ("S3_SECRET_ACCESS_KEY", "super-secret"),
            ("S3_BUCKET_NAME", "clips"),
            ("S3_PUBLIC_BASE_URL", "https://cdn.example.com"),
        ]);
        let config = StorageConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
