//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new ServiceConfig sent to the HTTP server
//!     → greeting snapshot swapped atomically
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is a valid config
//! - Only the greeting is hot reloaded; listener, timeouts and metrics
//!   settings take effect on restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{GreetingConfig, ListenerConfig, ObservabilityConfig, ServiceConfig, TimeoutConfig};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
