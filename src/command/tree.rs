//! Prefix trie over whitespace-tokenized command names.
//!
//! # Responsibilities
//! - Store commands under their tokenized, case-folded names
//! - Resolve input tokens to the deepest bound command
//! - Autocomplete partial input, reporting ambiguity
//! - Enumerate bound commands for help text
//!
//! # Design Decisions
//! - Re-adding a name overwrites the previous binding
//! - Resolution consumes tokens while a child matches; everything left over
//!   (including the first non-matching token) becomes the argument list

use std::collections::BTreeMap;

use super::{Command, CommandError, PROMPT};

#[derive(Default)]
struct Node {
    command: Option<Command>,
    children: BTreeMap<String, Node>,
}

/// Hierarchical command registry.
#[derive(Default)]
pub struct CommandTree {
    root: Node,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its tokenized name.
    ///
    /// Tokens are case-folded; an empty name is rejected. Registering the
    /// same path twice overwrites the earlier binding.
    pub fn add(&mut self, command: Command) -> Result<(), CommandError> {
        let tokens: Vec<String> = command
            .name
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if tokens.is_empty() {
            return Err(CommandError::EmptyName);
        }

        let mut node = &mut self.root;
        for token in tokens {
            node = node.children.entry(token).or_default();
        }
        node.command = Some(command);
        Ok(())
    }

    /// Walk the trie while a child matches each token (case-folded).
    ///
    /// Returns the command bound at the deepest node reached (if any) and
    /// the number of tokens consumed; the remainder are the arguments.
    pub fn resolve(&self, tokens: &[String]) -> (Option<&Command>, usize) {
        let mut node = &self.root;
        let mut consumed = 0;
        for token in tokens {
            match node.children.get(&token.to_lowercase()) {
                Some(child) => {
                    node = child;
                    consumed += 1;
                }
                None => break,
            }
        }
        (node.command.as_ref(), consumed)
    }

    /// Every bound command, ordered by name ascending.
    pub fn commands(&self) -> Vec<&Command> {
        fn collect<'a>(node: &'a Node, into: &mut Vec<&'a Command>) {
            if let Some(command) = &node.command {
                into.push(command);
            }
            for child in node.children.values() {
                collect(child, into);
            }
        }

        let mut commands = Vec::new();
        collect(&self.root, &mut commands);
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    /// Complete `partial` input against the trie.
    ///
    /// Suggestion lines are pushed through `log` (they end up in the output
    /// buffer); the return value is the new input-field text:
    /// - exact bound command: unchanged
    /// - trailing space at an interior node: children listed, path returned
    ///   with a trailing space
    /// - unique prefix match: completed silently, trailing space appended
    /// - ambiguous prefix: candidates listed, partial returned unchanged
    /// - no match: the path up to (not including) the unmatched token
    pub fn complete(&self, partial: &str, log: &mut dyn FnMut(String)) -> String {
        let tokens: Vec<String> = partial
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        let trailing = tokens.is_empty() || partial.ends_with(char::is_whitespace);
        let (path_tokens, last) = if trailing {
            (&tokens[..], None)
        } else {
            (&tokens[..tokens.len() - 1], tokens.last().map(String::as_str))
        };

        let mut node = &self.root;
        let mut path: Vec<&str> = Vec::new();
        for token in path_tokens {
            match node.children.get(token) {
                Some(child) => {
                    node = child;
                    path.push(token.as_str());
                }
                None => return open_path(&path, None),
            }
        }

        let last = match last {
            None => return self.list_children(node, &path, log),
            Some(last) => last,
        };

        if let Some(child) = node.children.get(last) {
            // The final token names a real child.
            if child.command.is_some() {
                return joined(&path, Some(last));
            }
            path.push(last);
            return self.list_children(child, &path, log);
        }

        let matches: Vec<&str> = node
            .children
            .keys()
            .filter(|key| key.starts_with(last))
            .map(String::as_str)
            .collect();

        match matches.as_slice() {
            [] => open_path(&path, None),
            [only] => open_path(&path, Some(*only)),
            many => {
                log(format!("{PROMPT}{}", joined(&path, Some(last))));
                for candidate in many.iter().copied() {
                    log(joined(&path, Some(candidate)));
                }
                joined(&path, Some(last))
            }
        }
    }

    fn list_children(
        &self,
        node: &Node,
        path: &[&str],
        log: &mut dyn FnMut(String),
    ) -> String {
        if node.command.is_some() && node.children.is_empty() {
            // A complete leaf command; nothing to suggest.
            return open_path(path, None);
        }
        log(format!("{PROMPT}{}", path.join(" ")));
        for key in node.children.keys() {
            log(joined(path, Some(key)));
        }
        open_path(path, None)
    }
}

/// Join path tokens with single spaces.
fn joined(path: &[&str], extra: Option<&str>) -> String {
    let mut parts: Vec<&str> = path.to_vec();
    if let Some(extra) = extra {
        parts.push(extra);
    }
    parts.join(" ")
}

/// Like [`joined`], but with a trailing space so the user can keep typing.
fn open_path(path: &[&str], extra: Option<&str>) -> String {
    let text = joined(path, extra);
    if text.is_empty() {
        text
    } else {
        format!("{text} ")
    }
}
