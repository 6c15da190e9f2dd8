//! Bounded output and history buffers.
//!
//! # Responsibilities
//! - Hold console text output (FIFO, oldest evicted on overflow)
//! - Hold raw command history (newest-first, indexed access)
//!
//! # Design Decisions
//! - Mutex around each buffer: append+evict is atomic, snapshot reads see
//!   a consistent state; writers on different connections race freely
//!   beyond that
//! - Capacities are fixed at construction

use std::collections::VecDeque;
use std::sync::Mutex;

/// Bounded FIFO of console output lines.
pub struct OutputBuffer {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl OutputBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            // A zero capacity would never evict; hold at least one line.
            capacity: capacity.max(1),
        }
    }

    /// Append a line, evicting the oldest entry once full.
    pub fn append(&self, line: impl Into<String>) {
        let mut lines = self.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// All lines joined with `\n`, oldest first.
    pub fn joined(&self) -> String {
        let lines = self.lock();
        lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Bounded newest-first command history.
pub struct HistoryBuffer {
    entries: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Record a command as the most recent entry, evicting the oldest once
    /// full.
    pub fn push(&self, command: impl Into<String>) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_back();
        }
        entries.push_front(command.into());
    }

    /// Entry at `index`, where 0 is the most recent. `None` out of range.
    pub fn get(&self, index: usize) -> Option<String> {
        self.lock().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
