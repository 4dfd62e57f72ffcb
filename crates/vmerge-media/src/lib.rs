#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and media building blocks for the merge pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Remote clip download over HTTP
//! - Deterministic caption wrapping and placement
//! - The transform engine seam (overlay, normalize, concat) and its FFmpeg implementation
//! - The ordered concatenation fallback chain
//! - Per-job scratch storage for intermediate files

pub mod command;
pub mod concat;
pub mod download;
pub mod engine;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod temp_assets;
pub mod text_layout;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use concat::{is_valid_output, ConcatOutcome, ConcatStrategy, ConcatTier};
pub use download::{HttpFetcher, MediaFetcher};
pub use engine::{FfmpegEngine, MediaTransformEngine};
pub use filters::TextStyle;
pub use error::{MediaError, MediaResult};
pub use temp_assets::{CleanupReport, TempAssets};
pub use text_layout::{
    layout_caption, vertical_anchor, wrap, CaptionLayout, LayoutParams, PositionedLine,
    VerticalAnchor, VerticalOrigin,
};
