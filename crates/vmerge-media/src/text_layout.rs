//! Caption wrapping and placement.
//!
//! Everything here is a pure function of its inputs so layouts can be
//! tested without running FFmpeg. The engine turns a [`CaptionLayout`] into
//! `drawtext` filters.

use serde::{Deserialize, Serialize};

use vmerge_models::{Alignment, CaptionSpec};

/// Captions are clipped to this many lines; extra words are dropped.
pub const MAX_CAPTION_LINES: usize = 3;
/// Default wrap width in characters.
pub const DEFAULT_MAX_CHARS_PER_LINE: usize = 25;
/// Default distance between consecutive line anchors, in pixels.
pub const DEFAULT_LINE_SPACING: i32 = 80;
/// First line offset from the top edge for `top` captions.
pub const TOP_MARGIN: i32 = 200;
/// First line offset from the bottom edge for `bottom` captions.
pub const BOTTOM_MARGIN: i32 = 400;

/// Horizontal position expression: every line is centered on its own.
pub const CENTERED_X: &str = "(w-text_w)/2";

/// Greedy word wrap, clipped to [`MAX_CAPTION_LINES`] lines.
///
/// Whole words are appended while the line stays within `max_chars`
/// characters. A single word longer than `max_chars` gets a line to itself
/// rather than being split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            if lines.len() == MAX_CAPTION_LINES {
                return lines;
            }
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Reference edge a caption block is positioned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalOrigin {
    Top,
    Center,
    Bottom,
}

/// Vertical position of the first caption line: `origin + offset` pixels.
///
/// Subsequent lines sit `line_spacing` pixels below the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalAnchor {
    pub origin: VerticalOrigin,
    pub offset: i32,
}

impl VerticalAnchor {
    /// Offset of line `index` from the origin.
    pub fn line_offset(&self, index: usize, line_spacing: i32) -> i32 {
        self.offset + index as i32 * line_spacing
    }

    /// Absolute y in pixels for line `index` in a frame of `frame_height`.
    pub fn resolve(&self, index: usize, line_spacing: i32, frame_height: i32) -> i32 {
        let base = match self.origin {
            VerticalOrigin::Top => 0,
            VerticalOrigin::Center => frame_height / 2,
            VerticalOrigin::Bottom => frame_height,
        };
        base + self.line_offset(index, line_spacing)
    }

    /// FFmpeg `drawtext` y expression for line `index`.
    pub fn y_expr(&self, index: usize, line_spacing: i32) -> String {
        let offset = self.line_offset(index, line_spacing);
        let base = match self.origin {
            VerticalOrigin::Top => return offset.to_string(),
            VerticalOrigin::Center => "(h-text_h)/2",
            VerticalOrigin::Bottom => "h",
        };
        if offset < 0 {
            format!("{base}-{}", -offset)
        } else {
            format!("{base}+{offset}")
        }
    }
}

/// Anchor of the first line for a block of `line_count` lines.
///
/// `top` and `bottom` use fixed margins. `middle` starts from the frame
/// center and moves up by half the block height so the block is centered:
/// the first line sits `(line_count - 1) * line_spacing / 2` above center.
pub fn vertical_anchor(alignment: Alignment, line_count: usize, line_spacing: i32) -> VerticalAnchor {
    match alignment {
        Alignment::Top => VerticalAnchor {
            origin: VerticalOrigin::Top,
            offset: TOP_MARGIN,
        },
        Alignment::Bottom => VerticalAnchor {
            origin: VerticalOrigin::Bottom,
            offset: -BOTTOM_MARGIN,
        },
        Alignment::Middle => {
            let gaps = line_count.saturating_sub(1) as i32;
            VerticalAnchor {
                origin: VerticalOrigin::Center,
                offset: -(gaps * line_spacing / 2),
            }
        }
    }
}

/// Wrap width and line spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub max_chars_per_line: usize,
    pub line_spacing: i32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
            line_spacing: DEFAULT_LINE_SPACING,
        }
    }
}

/// One wrapped caption line with its position expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedLine {
    pub text: String,
    pub x: String,
    pub y: String,
    /// Pixel offset from the anchor origin
    pub offset: i32,
}

/// Full placement of a caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionLayout {
    pub anchor: VerticalAnchor,
    pub line_spacing: i32,
    pub lines: Vec<PositionedLine>,
}

impl CaptionLayout {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Wrap and position a caption.
pub fn layout_caption(spec: &CaptionSpec, params: &LayoutParams) -> CaptionLayout {
    let wrapped = wrap(&spec.text, params.max_chars_per_line);
    let anchor = vertical_anchor(spec.alignment, wrapped.len(), params.line_spacing);

    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(index, text)| PositionedLine {
            text,
            x: CENTERED_X.to_string(),
            y: anchor.y_expr(index, params.line_spacing),
            offset: anchor.line_offset(index, params.line_spacing),
        })
        .collect();

    CaptionLayout {
        anchor,
        line_spacing: params.line_spacing,
        lines,
    }
}
