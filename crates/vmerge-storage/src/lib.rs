//! Object storage for finished clips.
//!
//! This crate provides:
//! - An S3-compatible client (AWS S3, Cloudflare R2, MinIO)
//! - The `StoragePublisher` seam used by the pipeline
//! - Deterministic object key and public URL derivation

pub mod client;
pub mod error;
pub mod publisher;

pub use client::{S3Client, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use publisher::{content_type_for, object_key, public_url, ObjectStorePublisher, StoragePublisher};
