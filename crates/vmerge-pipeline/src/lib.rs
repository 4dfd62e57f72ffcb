//! Job orchestration for the caption/merge/publish pipeline.
//!
//! This crate provides:
//! - The job registry seam and its in-memory implementation
//! - The orchestrator that drives fetch, caption, merge and publish
//! - Pipeline configuration, structured job logging and metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod registry;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult, Stage};
pub use logging::JobLogger;
pub use orchestrator::{Orchestrator, RunReport};
pub use registry::{InMemoryJobRegistry, JobRegistry};
