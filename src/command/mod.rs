//! Command interpreter subsystem.
//!
//! # Data Flow
//! ```text
//! Raw input ("as volume 0.5")
//!     → tokenize (whitespace, double-quoted spans kept intact)
//!     → tree.rs (walk the prefix trie while tokens match)
//!     → deepest bound command gets the leftover tokens as args
//!
//! Partial input ("a")
//!     → tree.rs complete() → suggestions logged, completed text returned
//! ```
//!
//! # Design Decisions
//! - Tokens are case-folded at registration and lookup; args keep their
//!   original case
//! - Children live in a BTreeMap so suggestion order is lexicographic
//!   without sorting at lookup time
//! - The trie is built during startup registration and read-only after;
//!   the facade guards it with a RwLock so runtime additions stay possible

pub mod tree;

use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::DispatchError;

pub use tree::CommandTree;

/// Prefix prepended when echoing user input into the output buffer.
pub const PROMPT: &str = "> ";

/// Errors from command registration and execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Registration with an empty name.
    #[error("command name cannot be empty")]
    EmptyName,

    /// A command action reported a failure.
    #[error("{0}")]
    Action(String),

    /// The main-thread hop failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl CommandError {
    /// Shorthand for an action-level failure message.
    pub fn action(message: impl Into<String>) -> Self {
        CommandError::Action(message.into())
    }
}

/// Callback bound to a trie node.
pub type CommandAction = Arc<dyn Fn(&[String]) -> Result<(), CommandError> + Send + Sync>;

/// A registered console command.
#[derive(Clone)]
pub struct Command {
    /// Full hierarchical name, original case (used for help text).
    pub name: String,
    /// One-line description shown by `help`.
    pub help: String,
    /// Whether the action must run on the host's owning thread.
    pub main_thread: bool,
    pub action: CommandAction,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("main_thread", &self.main_thread)
            .finish_non_exhaustive()
    }
}

/// Split `input` on whitespace, keeping double-quoted spans as a single
/// token with the quotes stripped.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("a b  c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn tokenize_keeps_quoted_spans() {
        assert_eq!(tokenize(r#"x "y z" w"#), vec!["x", "y z", "w"]);
    }

    #[test]
    fn tokenize_strips_quotes() {
        assert_eq!(tokenize(r#""just one""#), vec!["just one"]);
        assert_eq!(tokenize(""), Vec::<String>::new());
    }
}
