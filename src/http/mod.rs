//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign / propagate x-request-id)
//!     → observability::metrics (per-route instrumentation)
//!     → greeting.rs (GET /) or the metrics scrape route
//!     → Send to client
//! ```

pub mod greeting;
pub mod request;
pub mod server;

pub use greeting::Greeting;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
