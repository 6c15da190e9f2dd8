//! Embedded HTTP Debug Console
//!
//! A small HTTP server that runs inside a long-lived host process and lets a
//! browser (or curl) inspect and drive that process: view log output, run
//! hierarchical console commands, download files.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                DEBUG CONSOLE                 │
//!                        │                                              │
//!   HTTP Request         │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!   ─────────────────────┼─▶│  http   │───▶│ routing  │───▶│ console │  │
//!                        │  │ server  │    │  table   │    │ facade  │  │
//!                        │  └─────────┘    └────┬─────┘    └────┬────┘  │
//!                        │                      │               │       │
//!                        │                      ▼               ▼       │
//!                        │               ┌──────────┐    ┌──────────┐   │
//!                        │               │ dispatch │    │ command  │   │
//!                        │               │ (main-   │    │  trie    │   │
//!   Host main loop ◀─────┼───────────────│  thread) │    └──────────┘   │
//!                        │               └──────────┘                   │
//!                        │                                              │
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │         Cross-Cutting Concerns         │  │
//!                        │  │  config · files · lifecycle · capture  │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! The route table scans candidate routes in registration order; the first
//! handler that does not decline wins. Handlers flagged for main-thread
//! affinity are hopped onto the host's owning thread through the dispatcher
//! and the serving task blocks until they complete.

// Core subsystems
pub mod command;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod files;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ConsoleConfig;
pub use console::Console;
pub use dispatch::MainThread;
pub use http::ConsoleServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
