//! Pipeline metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "vmerge_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "vmerge_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vmerge_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "vmerge_job_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "vmerge_stage_duration_seconds";
    pub const MERGED_WITHOUT_OVERLAY_TOTAL: &str = "vmerge_merged_without_overlay_total";
    pub const CLEANUP_FAILURES_TOTAL: &str = "vmerge_cleanup_failures_total";
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

pub fn record_job_completed(duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "outcome" => "completed").record(duration_secs);
}

/// Record a failed job labelled by error kind.
pub fn record_job_failed(kind: &'static str, duration_secs: f64) {
    counter!(names::JOBS_FAILED_TOTAL, "kind" => kind).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "outcome" => "failed").record(duration_secs);
}

pub fn record_stage_duration(stage: &'static str, duration_secs: f64) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(duration_secs);
}

/// A job completed with only the captioned clip.
pub fn record_merged_without_overlay() {
    counter!(names::MERGED_WITHOUT_OVERLAY_TOTAL).increment(1);
}

pub fn record_cleanup_failures(count: usize) {
    counter!(names::CLEANUP_FAILURES_TOTAL).increment(count as u64);
}
