//! Canonical output encoding.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// Portrait output frame
pub const CANONICAL_WIDTH: u32 = 1080;
pub const CANONICAL_HEIGHT: u32 = 1920;
pub const CANONICAL_FPS: u32 = 30;
pub const CANONICAL_SAMPLE_RATE: u32 = 44_100;
pub const CANONICAL_AUDIO_CHANNELS: u8 = 2;

/// Format every clip is normalized to before stream-copy concatenation.
///
/// Two clips normalized with the same `CanonicalFormat` can be joined
/// without re-encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFormat {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    #[serde(default = "default_sample_rate")]
    pub audio_sample_rate: u32,

    #[serde(default = "default_channels")]
    pub audio_channels: u8,
}

fn default_width() -> u32 {
    CANONICAL_WIDTH
}
fn default_height() -> u32 {
    CANONICAL_HEIGHT
}
fn default_fps() -> u32 {
    CANONICAL_FPS
}
fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_sample_rate() -> u32 {
    CANONICAL_SAMPLE_RATE
}
fn default_channels() -> u8 {
    CANONICAL_AUDIO_CHANNELS
}

impl Default for CanonicalFormat {
    fn default() -> Self {
        Self {
            width: CANONICAL_WIDTH,
            height: CANONICAL_HEIGHT,
            fps: CANONICAL_FPS,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            audio_sample_rate: CANONICAL_SAMPLE_RATE,
            audio_channels: CANONICAL_AUDIO_CHANNELS,
        }
    }
}

impl CanonicalFormat {
    /// Channel layout name understood by FFmpeg's `aformat`.
    pub fn channel_layout(&self) -> &'static str {
        match self.audio_channels {
            1 => "mono",
            _ => "stereo",
        }
    }

    /// Video encode arguments (codec, preset, crf, pixel format).
    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]
    }

    /// Audio encode arguments (codec, bitrate, sample rate, channels).
    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-ar".to_string(),
            self.audio_sample_rate.to_string(),
            "-ac".to_string(),
            self.audio_channels.to_string(),
        ]
    }
}
