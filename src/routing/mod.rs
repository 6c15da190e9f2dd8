//! Route dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, decoded path, query)
//!     → context.rs (per-request state + response accumulator)
//!     → table.rs (scan routes in registration order)
//!     → pattern.rs (evaluate path pattern + method filter)
//!     → handler runs inline, or hops to the owning thread when flagged
//!     → Handled stops the scan; Declined continues; exhaustion → 404
//! ```
//!
//! # Design Decisions
//! - Registration order is match priority; first non-declining handler wins
//! - Handlers return an [`Outcome`] by value instead of flipping a shared
//!   decline flag
//! - The file-serving route pair is appended lazily on first dispatch,
//!   behind a one-time-init guard
//! - A handler fault becomes a 500 for that request only; the scan loop and
//!   the server outlive it

pub mod context;
pub mod pattern;
pub mod table;

use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::DispatchError;

pub use context::{RequestContext, ResponseSink};
pub use pattern::{MethodFilter, PathPattern};
pub use table::RouteTable;

/// What a handler did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response is complete; stop scanning.
    Handled,
    /// Let the scan continue with later routes.
    Declined,
}

/// Errors from route registration and handler execution.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Registration with an empty exact pattern.
    #[error("route pattern cannot be empty")]
    EmptyPattern,

    /// A handler reported a failure.
    #[error("{0}")]
    Handler(String),

    /// Reading a file for the file-serving routes failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The main-thread hop failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RouteError {
    /// Shorthand for a handler-level failure message.
    pub fn handler(message: impl Into<String>) -> Self {
        RouteError::Handler(message.into())
    }
}

/// Callback bound to a route.
pub type Handler = Arc<dyn Fn(&mut RequestContext) -> Result<Outcome, RouteError> + Send + Sync>;
