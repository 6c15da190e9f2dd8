//! HTTP transport.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum listener, one fallback handler for every path)
//!     → RequestContext built from method/path/query
//!     → route-table dispatch on a blocking thread (it may park on the
//!       main-thread rendezvous)
//!     → accumulated response written back to the client
//! ```
//!
//! # Design Decisions
//! - axum owns parsing and writing; the console's own route table owns
//!   matching and priority, so one fallback handler is the whole surface
//! - Dispatch runs under `spawn_blocking`: serving tasks may block on the
//!   owning thread without stalling the runtime
//! - `stop()` halts accepting; in-flight requests run to completion

pub mod server;

pub use server::{ConsoleServer, ServerError};
