//! Pipeline error types.

use std::fmt;

use thiserror::Error;
use vmerge_media::MediaError;
use vmerge_storage::StorageError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Stage of one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Caption,
    Concat,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Caption => "caption",
            Stage::Concat => "concat",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{stage} timed out after {secs} seconds")]
    Timeout { stage: Stage, secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn timeout(stage: Stage, secs: u64) -> Self {
        Self::Timeout { stage, secs }
    }

    /// Any failure while retrieving a clip, local writes included.
    pub fn fetch_failed(err: MediaError) -> Self {
        match err {
            MediaError::DownloadFailed { message } => PipelineError::Download(message),
            other => PipelineError::Download(other.to_string()),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Download(_) => "download",
            PipelineError::Transform(_) => "transform",
            PipelineError::Upload(_) => "upload",
            PipelineError::Configuration(_) => "configuration",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::Io(_) => "io",
        }
    }
}

impl From<MediaError> for PipelineError {
    fn from(err: MediaError) -> Self {
        if err.is_download() {
            PipelineError::fetch_failed(err)
        } else {
            PipelineError::Transform(err.to_string())
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        if err.is_config() {
            PipelineError::Configuration(err.to_string())
        } else {
            PipelineError::Upload(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_error_mapping() {
        let err: PipelineError = MediaError::download_failed("HTTP 404").into();
        assert!(matches!(err, PipelineError::Download(_)));

        let err: PipelineError = MediaError::InvalidUrl("nope".into()).into();
        assert!(matches!(err, PipelineError::Download(_)));

        let err: PipelineError = MediaError::ffmpeg_failed("boom", None, Some(1)).into();
        assert!(matches!(err, PipelineError::Transform(_)));
        assert_eq!(err.kind(), "transform");
    }

    #[test]
    fn test_fetch_failures_are_downloads() {
        let io = std::io::Error::new(std::io::ErrorKind::StorageFull, "no space left on device");
        let err = PipelineError::fetch_failed(MediaError::Io(io));
        assert!(matches!(err, PipelineError::Download(_)));
        assert!(err.to_string().starts_with("Download failed"));
        assert!(err.to_string().contains("no space left"));

        let err = PipelineError::fetch_failed(MediaError::download_failed("HTTP 404"));
        assert_eq!(err.to_string(), "Download failed: HTTP 404");
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: PipelineError = StorageError::config_error("S3_BUCKET_NAME not set").into();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("S3_BUCKET_NAME"));

        let err: PipelineError = StorageError::upload_failed("403").into();
        assert!(matches!(err, PipelineError::Upload(_)));
    }

    #[test]
    fn test_timeout_message() {
        let err = PipelineError::timeout(Stage::Publish, 300);
        assert_eq!(err.to_string(), "publish timed out after 300 seconds");
    }
}
