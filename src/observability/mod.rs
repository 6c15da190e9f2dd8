//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Host code emits tracing events
//!     → global subscriber (fmt layer, env filter — installed by the host)
//!     → capture.rs (ConsoleCaptureLayer)
//!     → console output buffer, severity-tagged
//! ```
//!
//! # Design Decisions
//! - Capture is a `tracing_subscriber` Layer so the console sees exactly
//!   what the host logs, without a second logging API
//! - Subscriber installation is global and once-only, so the layer carries
//!   an atomic gate that server start/stop flip instead of installing and
//!   uninstalling

pub mod capture;

pub use capture::ConsoleCaptureLayer;
