//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the debug console.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// File-serving configuration.
    pub files: FilesConfig,

    /// Output/history buffer capacities.
    pub buffers: BufferConfig,

    /// Main-thread dispatcher settings.
    pub dispatcher: DispatcherConfig,

    /// Mirror host log events into the console output.
    pub capture_host_logs: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            files: FilesConfig::default(),
            buffers: BufferConfig::default(),
            dispatcher: DispatcherConfig::default(),
            capture_host_logs: true,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:55055").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:55055".to_string(),
        }
    }
}

/// File-serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Root directory the file routes resolve against.
    pub root: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: "console-files".to_string(),
        }
    }
}

/// Buffer capacities.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Max lines kept in the console output.
    pub output_lines: usize,

    /// Max commands kept in the history.
    pub history_entries: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            output_lines: 100,
            history_entries: 50,
        }
    }
}

/// Main-thread dispatcher settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Cadence at which the standalone drain loop polls its queue.
    pub poll_interval_ms: u64,
}

impl DispatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16,
        }
    }
}

impl ConsoleConfig {
    /// Default configuration bound to a specific port.
    pub fn with_port(port: u16) -> Self {
        Self {
            listener: ListenerConfig {
                bind_address: format!("0.0.0.0:{port}"),
            },
            ..Self::default()
        }
    }
}
