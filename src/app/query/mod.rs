//! Multi-region query engine.
//!
//! - [`engine`] - per-service fan-out and deadline-bounded collection
//! - [`client_cache`] - lazily built, region-bound API clients
//! - [`result`] - aggregated output and its JSON rendering
//! - [`error`] - engine and facade failures

pub mod client_cache;
pub mod engine;
pub mod error;
pub mod result;

pub use client_cache::{ClientFactory, RegionClientCache};
pub use engine::{
    EngineSettings, FailurePolicy, RegionQuery, ResourceQuery, ResourceSpec, ServiceEngine,
    ServiceSpec,
};
pub use error::QueryError;
pub use result::ResultList;
