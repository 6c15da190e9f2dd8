//! Cross-thread invocation onto the host's main execution context.
//!
//! # Data Flow
//! ```text
//! Serving thread:
//!     invoke(work) → enqueue job + completion channel → block on recv
//!
//! Owning thread (host loop, or console-owned drain thread):
//!     drain() → pop jobs FIFO → run → signal completion
//! ```
//!
//! # Design Decisions
//! - `invoke` is a synchronous rendezvous: side effects of the work are
//!   visible to the caller the moment it returns
//! - Completion is signalled per job, not with a queue-wide barrier
//! - The owning loop polls at a fixed cadence rather than being woken;
//!   bounded latency is traded for not starving the host's own tick
//! - Jobs are never cancelled once enqueued; they always run to completion

pub mod main_thread;

pub use main_thread::{DispatchError, MainThread};
