//! Forwarding of host log events into the console output buffer.

use std::sync::Weak;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::console::{Console, LogSeverity};

/// A `tracing` layer that mirrors events into the console output.
///
/// Holds the console weakly; once the console is dropped the layer becomes
/// inert. Forwarding is also gated on [`Console::capture_enabled`], which
/// the server flips on `Start`/`Stop`.
pub struct ConsoleCaptureLayer {
    console: Weak<Console>,
}

impl ConsoleCaptureLayer {
    pub fn new(console: Weak<Console>) -> Self {
        Self { console }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(console) = self.console.upgrade() else {
            return;
        };
        if !console.capture_enabled() {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if visitor.message.is_empty() {
            return;
        }

        let severity = match *event.metadata().level() {
            Level::ERROR => LogSeverity::Error,
            Level::WARN => LogSeverity::Warning,
            _ => LogSeverity::Log,
        };
        console.append_log(severity, &visitor.message);
    }
}

/// Extracts the `message` field from an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
