//! Shared data models for the VideoMerge backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, job ids and lifecycle status
//! - Caption text and alignment
//! - Submission requests and responses
//! - Canonical output encoding

pub mod caption;
pub mod encoding;
pub mod job;
pub mod job_status;
pub mod request;

pub use caption::{Alignment, CaptionSpec};
pub use encoding::CanonicalFormat;
pub use job::{Job, JobId};
pub use job_status::JobStatus;
pub use request::{SubmitJobRequest, SubmitJobResponse};
