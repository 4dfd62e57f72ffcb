//! Media transform operations requested by the pipeline.
//!
//! [`MediaTransformEngine`] is the seam between the pipeline and whatever
//! actually encodes video. [`FfmpegEngine`] drives the `ffmpeg` CLI; tests
//! substitute their own implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use vmerge_models::CanonicalFormat;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{
    caption_filter, concat_filter_graph, concat_list_content, normalize_audio_filter,
    normalize_video_filter, TextStyle, CONCAT_AUDIO_LABEL, CONCAT_VIDEO_LABEL,
};
use crate::fs_utils::{copy_file_atomic, remove_if_exists};
use crate::text_layout::CaptionLayout;

/// Encode/overlay/concat capability.
///
/// Every method writes `output` on success. A failure leaves no guarantee
/// about the contents of `output`.
#[async_trait]
pub trait MediaTransformEngine: Send + Sync {
    /// Render caption lines onto `input` and re-encode the video.
    async fn overlay_text(&self, input: &Path, output: &Path, layout: &CaptionLayout) -> MediaResult<()>;

    /// Re-encode `input` to the canonical format.
    async fn normalize(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Join clips in order without re-encoding.
    async fn concat_copy(&self, inputs: &[&Path], output: &Path) -> MediaResult<()>;

    /// Scale, pad and join two clips in a single encode.
    async fn concat_filter(&self, first: &Path, second: &Path, output: &Path) -> MediaResult<()>;
}

/// `MediaTransformEngine` backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    format: CanonicalFormat,
    text_style: TextStyle,
    runner: FfmpegRunner,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new(CanonicalFormat::default(), TextStyle::default())
    }
}

impl FfmpegEngine {
    pub fn new(format: CanonicalFormat, text_style: TextStyle) -> Self {
        Self {
            format,
            text_style,
            runner: FfmpegRunner::new(),
        }
    }

    /// Apply a deadline to every FFmpeg invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }

    pub fn format(&self) -> &CanonicalFormat {
        &self.format
    }

    /// Caption overlay command, `None` when the caption has no lines.
    pub fn overlay_command(&self, input: &Path, output: &Path, layout: &CaptionLayout) -> Option<FfmpegCommand> {
        let filter = caption_filter(layout, &self.text_style)?;
        Some(
            FfmpegCommand::new(input, output)
                .video_filter(filter)
                .encode_video(&self.format)
                .audio_copy()
                .faststart(),
        )
    }

    pub fn normalize_command(&self, input: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(input, output)
            .video_filter(normalize_video_filter(&self.format))
            .audio_filter(normalize_audio_filter(&self.format))
            .encode(&self.format)
            .faststart()
    }

    pub fn concat_copy_command(&self, list_path: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(list_path, output)
            .input_args(["-f", "concat", "-safe", "0"])
            .codec_copy()
            .faststart()
    }

    pub fn concat_filter_command(&self, first: &Path, second: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(first, output)
            .input(second)
            .filter_complex(concat_filter_graph(&self.format))
            .map(CONCAT_VIDEO_LABEL)
            .map(CONCAT_AUDIO_LABEL)
            .encode(&self.format)
            .faststart()
    }
}

#[async_trait]
impl MediaTransformEngine for FfmpegEngine {
    async fn overlay_text(&self, input: &Path, output: &Path, layout: &CaptionLayout) -> MediaResult<()> {
        match self.overlay_command(input, output, layout) {
            Some(cmd) => {
                info!(lines = layout.lines.len(), "Rendering caption onto {}", input.display());
                self.runner.run(&cmd).await
            }
            None => {
                debug!("Caption is empty, passing clip through");
                copy_file_atomic(input, output).await.map(|_| ())
            }
        }
    }

    async fn normalize(&self, input: &Path, output: &Path) -> MediaResult<()> {
        info!(
            "Normalizing {} to {}x{}@{}",
            input.display(),
            self.format.width,
            self.format.height,
            self.format.fps
        );
        self.runner.run(&self.normalize_command(input, output)).await
    }

    async fn concat_copy(&self, inputs: &[&Path], output: &Path) -> MediaResult<()> {
        if inputs.is_empty() {
            return Err(MediaError::internal("concat_copy called without inputs"));
        }

        let list_path = output.with_extension("concat.txt");
        tokio::fs::write(&list_path, concat_list_content(inputs)).await?;

        let result = self
            .runner
            .run(&self.concat_copy_command(&list_path, output))
            .await;

        let _ = remove_if_exists(&list_path).await;
        result
    }

    async fn concat_filter(&self, first: &Path, second: &Path, output: &Path) -> MediaResult<()> {
        info!(
            "Filter-graph concat of {} and {}",
            first.display(),
            second.display()
        );
        self.runner
            .run(&self.concat_filter_command(first, second, output))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_layout::{layout_caption, LayoutParams};
    use std::path::PathBuf;
    use vmerge_models::{Alignment, CaptionSpec};

    fn pos(args: &[String], needle: &str) -> usize {
        args.iter()
            .position(|a| a == needle)
            .unwrap_or_else(|| panic!("missing {needle} in {args:?}"))
    }

    #[test]
    fn test_overlay_command() {
        let engine = FfmpegEngine::default();
        let layout = layout_caption(
            &CaptionSpec::new("hello there", Alignment::Bottom),
            &LayoutParams::default(),
        );
        let args = engine
            .overlay_command(Path::new("in.mp4"), Path::new("out.mp4"), &layout)
            .unwrap()
            .build_args();

        let vf = pos(&args, "-vf");
        assert!(args[vf + 1].starts_with("drawtext="));
        assert_eq!(args[pos(&args, "-c:a") + 1], "copy");
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_overlay_command_empty_caption() {
        let engine = FfmpegEngine::default();
        let layout = layout_caption(&CaptionSpec::new(" ", Alignment::Top), &LayoutParams::default());
        assert!(engine
            .overlay_command(Path::new("in.mp4"), Path::new("out.mp4"), &layout)
            .is_none());
    }

    #[test]
    fn test_normalize_command() {
        let engine = FfmpegEngine::default();
        let args = engine
            .normalize_command(Path::new("a.mp4"), Path::new("a_norm.mp4"))
            .build_args();

        assert!(args[pos(&args, "-vf") + 1].contains("pad=1080:1920"));
        assert!(args[pos(&args, "-af") + 1].contains("aresample=44100"));
        assert_eq!(args[pos(&args, "-c:v") + 1], "libx264");
        assert_eq!(args[pos(&args, "-c:a") + 1], "aac");
    }

    #[test]
    fn test_concat_copy_command() {
        let engine = FfmpegEngine::default();
        let list = PathBuf::from("/tmp/merged.concat.txt");
        let args = engine
            .concat_copy_command(&list, Path::new("/tmp/merged.mp4"))
            .build_args();

        let f = pos(&args, "-f");
        let i = pos(&args, "-i");
        assert!(f < i);
        assert_eq!(args[f + 1], "concat");
        assert_eq!(args[i + 1], "/tmp/merged.concat.txt");
        assert_eq!(args[pos(&args, "-c") + 1], "copy");
    }

    #[test]
    fn test_concat_filter_command_maps_outputs() {
        let engine = FfmpegEngine::default();
        let args = engine
            .concat_filter_command(Path::new("a.mp4"), Path::new("b.mp4"), Path::new("out.mp4"))
            .build_args();

        assert!(pos(&args, "a.mp4") < pos(&args, "b.mp4"));
        assert!(args[pos(&args, "-filter_complex") + 1].contains("concat=n=2"));
        assert!(args.contains(&"[v]".to_string()));
        assert!(args.contains(&"[a]".to_string()));
    }

    #[tokio::test]
    async fn test_overlay_empty_caption_copies_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        tokio::fs::write(&input, b"clip").await.unwrap();

        let layout = layout_caption(&CaptionSpec::new("", Alignment::Top), &LayoutParams::default());
        FfmpegEngine::default()
            .overlay_text(&input, &output, &layout)
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"clip");
    }

    #[tokio::test]
    async fn test_concat_copy_requires_inputs() {
        let err = FfmpegEngine::default()
            .concat_copy(&[], Path::new("/tmp/never.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Internal(_)));
    }
}
