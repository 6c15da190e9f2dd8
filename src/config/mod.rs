//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file (optional)
//!     → loader.rs (read, parse, validate)
//!     → schema.rs (typed ConsoleConfig)
//!     → consumed once at startup; immutable afterwards
//! ```
//!
//! # Design Decisions
//! - Every field has a default so an empty file (or no file) works
//! - Validation is fail-fast at startup

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, ConfigError};
pub use schema::{BufferConfig, ConsoleConfig, DispatcherConfig, FilesConfig, ListenerConfig};
