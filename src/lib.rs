//! DevFest GitOps demo service.
//!
//! Serves a fixed JSON greeting on `GET /` and Prometheus metrics on
//! `GET /metrics`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
