//! Two-clip merge with an ordered fallback chain.
//!
//! Tiers are tried in order until one produces a valid output:
//!
//! 1. normalize both clips to the canonical format, then stream-copy concat
//! 2. single-pass filter-graph concat
//! 3. copy the captioned clip alone
//!
//! Failures of tiers 1 and 2 are absorbed. Only a failing tier 3 copy is an
//! error for the caller.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::MediaTransformEngine;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{copy_file_atomic, file_size, remove_if_exists};
use crate::temp_assets::TempAssets;

/// Strategy that produced a merged clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcatTier {
    NormalizeThenCopy,
    FilterGraph,
    CaptionedOnly,
}

impl ConcatTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcatTier::NormalizeThenCopy => "normalize_then_copy",
            ConcatTier::FilterGraph => "filter_graph",
            ConcatTier::CaptionedOnly => "captioned_only",
        }
    }

    /// Whether the output contains the second clip.
    pub fn includes_overlay(&self) -> bool {
        !matches!(self, ConcatTier::CaptionedOnly)
    }
}

impl fmt::Display for ConcatTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatOutcome {
    pub tier: ConcatTier,
    pub output: PathBuf,
    pub bytes: u64,
}

/// An output is valid if it exists and is strictly larger than the
/// captioned clip alone.
pub async fn is_valid_output(path: &Path, reference_size: u64) -> bool {
    valid_size(path, reference_size).await.is_some()
}

/// Merges a captioned clip with a second clip.
#[derive(Clone)]
pub struct ConcatStrategy {
    engine: Arc<dyn MediaTransformEngine>,
}

impl ConcatStrategy {
    pub fn new(engine: Arc<dyn MediaTransformEngine>) -> Self {
        Self { engine }
    }

    /// Merge `captioned` followed by `overlay` into `output`.
    ///
    /// Intermediate files are allocated from `assets`. Normalized
    /// intermediates are discarded once tier 1 has been resolved.
    pub async fn merge(
        &self,
        captioned: &Path,
        overlay: &Path,
        output: &Path,
        assets: &TempAssets,
    ) -> MediaResult<ConcatOutcome> {
        let reference = file_size(captioned)
            .await
            .ok_or_else(|| MediaError::FileNotFound(captioned.to_path_buf()))?;

        for tier in [ConcatTier::NormalizeThenCopy, ConcatTier::FilterGraph] {
            let started = Instant::now();
            let attempt = match tier {
                ConcatTier::NormalizeThenCopy => {
                    self.normalize_then_copy(captioned, overlay, output, assets)
                        .await
                }
                _ => self.engine.concat_filter(captioned, overlay, output).await,
            };

            match attempt {
                Ok(()) => {
                    if let Some(bytes) = valid_size(output, reference).await {
                        return Ok(accept(tier, output, bytes, started));
                    }
                    warn!(
                        tier = %tier,
                        reference_bytes = reference,
                        "Concat output missing or not larger than captioned clip, falling back"
                    );
                }
                Err(e) => {
                    warn!(tier = %tier, error = %e, "Concat tier failed, falling back");
                }
            }

            metrics::counter!("vmerge_concat_tier_failures_total", "tier" => tier.as_str())
                .increment(1);
            if let Err(e) = remove_if_exists(output).await {
                warn!(path = %output.display(), error = %e, "Failed to remove superseded concat output");
            }
        }

        let started = Instant::now();
        let bytes = copy_file_atomic(captioned, output).await?;
        warn!("All merge tiers failed, publishing captioned clip without the second clip");
        Ok(accept(ConcatTier::CaptionedOnly, output, bytes, started))
    }

    async fn normalize_then_copy(
        &self,
        captioned: &Path,
        overlay: &Path,
        output: &Path,
        assets: &TempAssets,
    ) -> MediaResult<()> {
        let first = assets.allocate("captioned_normalized.mp4");
        let second = assets.allocate("overlay_normalized.mp4");

        let result: MediaResult<()> = async {
            self.engine.normalize(captioned, &first).await?;
            self.engine.normalize(overlay, &second).await?;
            self.engine
                .concat_copy(&[first.as_path(), second.as_path()], output)
                .await
        }
        .await;

        assets.discard(&first).await;
        assets.discard(&second).await;
        result
    }
}

async fn valid_size(path: &Path, reference: u64) -> Option<u64> {
    file_size(path).await.filter(|size| *size > reference)
}

fn accept(tier: ConcatTier, output: &Path, bytes: u64, started: Instant) -> ConcatOutcome {
    info!(tier = %tier, bytes, "Merged clip written to {}", output.display());
    metrics::counter!("vmerge_concat_tier_total", "tier" => tier.as_str()).increment(1);
    metrics::histogram!("vmerge_concat_tier_duration_seconds", "tier" => tier.as_str())
        .record(started.elapsed().as_secs_f64());
    ConcatOutcome {
        tier,
        output: output.to_path_buf(),
        bytes,
    }
}
