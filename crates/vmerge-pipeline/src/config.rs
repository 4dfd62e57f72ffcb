//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use vmerge_media::text_layout::{DEFAULT_LINE_SPACING, DEFAULT_MAX_CHARS_PER_LINE};
use vmerge_media::{LayoutParams, TextStyle};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root under which every job gets its own scratch directory
    pub work_dir: PathBuf,
    /// Deadline for downloading both clips
    pub fetch_timeout: Duration,
    /// Deadline for each FFmpeg invocation
    pub transform_timeout: Duration,
    /// Deadline for the upload
    pub publish_timeout: Duration,
    /// Caption wrapping and spacing
    pub layout: LayoutParams,
    /// Caption font and colors
    pub text_style: TextStyle,
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("vmerge")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            fetch_timeout: Duration::from_secs(300),
            transform_timeout: Duration::from_secs(600),
            publish_timeout: Duration::from_secs(300),
            layout: LayoutParams::default(),
            text_style: TextStyle::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = TextStyle::default();
        Self {
            work_dir: std::env::var("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_work_dir()),
            fetch_timeout: Duration::from_secs(
                std::env::var("FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            transform_timeout: Duration::from_secs(
                std::env::var("TRANSFORM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            publish_timeout: Duration::from_secs(
                std::env::var("PUBLISH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            layout: LayoutParams {
                max_chars_per_line: std::env::var("CAPTION_MAX_CHARS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_CHARS_PER_LINE),
                line_spacing: std::env::var("CAPTION_LINE_SPACING")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_LINE_SPACING),
            },
            text_style: TextStyle {
                font_file: std::env::var("CAPTION_FONT_FILE")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from),
                font_size: std::env::var("CAPTION_FONT_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.font_size),
                ..defaults
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.work_dir.ends_with("vmerge"));
        assert_eq!(config.fetch_timeout, Duration::from_secs(300));
        assert_eq!(config.transform_timeout, Duration::from_secs(600));
        assert_eq!(config.layout.max_chars_per_line, 25);
        assert_eq!(config.layout.line_spacing, 80);
        assert_eq!(config.text_style.font_size, 64);
    }
}
