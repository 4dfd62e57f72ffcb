//! FFmpeg filter definitions.

use std::path::{Path, PathBuf};

use vmerge_models::CanonicalFormat;

use crate::text_layout::{CaptionLayout, PositionedLine};

/// Output labels of the two-input concat graph.
pub const CONCAT_VIDEO_LABEL: &str = "[v]";
pub const CONCAT_AUDIO_LABEL: &str = "[a]";

/// Caption text rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    /// Font file; FFmpeg's default font when `None`
    pub font_file: Option<PathBuf>,
    pub font_size: u32,
    pub font_color: String,
    pub border_width: u32,
    pub border_color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_file: None,
            font_size: 64,
            font_color: "white".to_string(),
            border_width: 4,
            border_color: "black".to_string(),
        }
    }
}

/// Escape a value for use as a filter option (first level).
fn escape_option_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape an already option-escaped value for the filtergraph (second level).
fn escape_graph_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape arbitrary text so it survives both levels of filter parsing.
pub fn escape_filter_text(text: &str) -> String {
    escape_graph_value(&escape_option_value(text))
}

/// `drawtext` filter for one positioned caption line.
///
/// `expansion=none` keeps `%` literal.
pub fn drawtext_filter(line: &PositionedLine, style: &TextStyle) -> String {
    let mut filter = String::from("drawtext=");
    if let Some(font) = &style.font_file {
        filter.push_str("fontfile=");
        filter.push_str(&escape_filter_text(&font.to_string_lossy()));
        filter.push(':');
    }
    filter.push_str(&format!(
        "text={text}:expansion=none:fontsize={size}:fontcolor={color}:\
         borderw={bw}:bordercolor={bc}:x={x}:y={y}",
        text = escape_filter_text(&line.text),
        size = style.font_size,
        color = style.font_color,
        bw = style.border_width,
        bc = style.border_color,
        x = line.x,
        y = line.y,
    ));
    filter
}

/// Chain of `drawtext` filters for a whole caption, `None` if it has no lines.
pub fn caption_filter(layout: &CaptionLayout, style: &TextStyle) -> Option<String> {
    if layout.is_empty() {
        return None;
    }
    Some(
        layout
            .lines
            .iter()
            .map(|line| drawtext_filter(line, style))
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Scale into the canonical frame preserving aspect ratio, then letterbox.
pub fn normalize_video_filter(format: &CanonicalFormat) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,\
         setsar=1,fps={fps},format=yuv420p",
        w = format.width,
        h = format.height,
        fps = format.fps,
    )
}

/// Resample audio to the canonical rate and channel layout.
pub fn normalize_audio_filter(format: &CanonicalFormat) -> String {
    format!(
        "aresample={rate},aformat=sample_fmts=fltp:sample_rates={rate}:channel_layouts={layout}",
        rate = format.audio_sample_rate,
        layout = format.channel_layout(),
    )
}

/// Filter graph that normalizes two inputs and joins them in order.
///
/// Produces [`CONCAT_VIDEO_LABEL`] and [`CONCAT_AUDIO_LABEL`].
pub fn concat_filter_graph(format: &CanonicalFormat) -> String {
    let video = normalize_video_filter(format);
    let audio = normalize_audio_filter(format);
    format!(
        "[0:v]{video}[v0];[1:v]{video}[v1];\
         [0:a]{audio}[a0];[1:a]{audio}[a1];\
         [v0][a0][v1][a1]concat=n=2:v=1:a=1{CONCAT_VIDEO_LABEL}{CONCAT_AUDIO_LABEL}"
    )
}

/// Body of a concat demuxer list file.
pub fn concat_list_content(paths: &[&Path]) -> String {
    paths
        .iter()
        .map(|p| {
            // Single quotes are closed, escaped and reopened
            let escaped = p.to_string_lossy().replace('\'', "'\\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}
