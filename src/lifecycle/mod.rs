//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → build Console + RouteTable → bind listener → accept
//!
//! Shutdown:
//!     Stop() or signal → stop accepting → drain in-flight requests
//!                      → stop the standalone drain loop (if console-owned)
//! ```
//!
//! # Design Decisions
//! - Shutdown is a broadcast: the accept loop and the owning-thread drain
//!   loop each hold their own receiver
//! - In-flight requests run to completion; there is no per-request timeout

pub mod shutdown;

pub use shutdown::Shutdown;
