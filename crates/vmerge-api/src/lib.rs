//! HTTP API for the caption/merge pipeline.
//!
//! Jobs are submitted with `POST /api/jobs` and polled with
//! `GET /api/jobs/:job_id`. Media work never runs on the request path.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
