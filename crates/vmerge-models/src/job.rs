//! Job record tracked for every submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::JobStatus;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A caption + concatenate request and its tracked lifecycle.
///
/// `video_url` is present iff the job completed, `error` iff it failed.
/// Both are write-once: the first terminal transition wins and every later
/// progress or terminal call is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Current status
    pub status: JobStatus,

    /// Progress (0-100), non-decreasing while processing
    pub progress: u8,

    /// Public URL of the published video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Human-readable failure cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job in `processing` state with zero progress.
    pub fn new(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Processing,
            progress: 0,
            video_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Raise progress to `value` (clamped to 100).
    ///
    /// Returns `false` without touching the record if the job is terminal
    /// or `value` would move progress backwards.
    pub fn set_progress(&mut self, value: u8) -> bool {
        if self.is_terminal() {
            return false;
        }
        let value = value.min(100);
        if value <= self.progress {
            return false;
        }
        self.progress = value;
        self.updated_at = Utc::now();
        true
    }

    /// Mark job as completed with the published video URL.
    pub fn complete(&mut self, video_url: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.video_url = Some(video_url.into());
        self.updated_at = Utc::now();
        true
    }

    /// Mark job as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
        true
    }
}
