//! Console facade.
//!
//! # Data Flow
//! ```text
//! /console/run?command=…  → echo to output, push to history, run via trie
//! /console/out            → output buffer joined by \n
//! /console/commandHistory → history entry by index
//! /console/complete       → trie completion (suggestions land in output)
//!
//! Host log events → capture layer → append_log → output buffer
//! ```
//!
//! # Design Decisions
//! - One facade owns the trie, both buffers, the passthrough mode and the
//!   main-thread handle; HTTP routes and command actions reach it through
//!   `Weak` so the registry never keeps itself alive
//! - Command-level failures are rendered into the output buffer; the HTTP
//!   call that carried them still returns 200

pub mod buffers;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::debug;

use crate::command::{tokenize, Command, CommandAction, CommandError, CommandTree, PROMPT};
use crate::config::ConsoleConfig;
use crate::dispatch::MainThread;
use crate::routing::{MethodFilter, Outcome, PathPattern, RouteError, RouteTable};

pub use buffers::{HistoryBuffer, OutputBuffer};

/// Severity attached to captured host log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Log,
    Warning,
    Error,
    Assert,
    Exception,
}

impl LogSeverity {
    fn span_class(self) -> Option<&'static str> {
        match self {
            LogSeverity::Log => None,
            LogSeverity::Warning => Some("Warning"),
            LogSeverity::Error => Some("Error"),
            LogSeverity::Assert => Some("Assert"),
            LogSeverity::Exception => Some("Exception"),
        }
    }
}

/// Input routing state: normal trie dispatch, or passthrough to one
/// registered mode command (an embedded-language REPL).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Passthrough(String),
}

/// The console: command trie, output/history buffers, passthrough mode.
pub struct Console {
    commands: RwLock<CommandTree>,
    output: OutputBuffer,
    history: HistoryBuffer,
    mode: Mutex<Mode>,
    main: Arc<MainThread>,
    capture: AtomicBool,
}

impl Console {
    /// Build the console and register the built-in commands.
    pub fn new(config: &ConsoleConfig, main: Arc<MainThread>) -> Arc<Self> {
        let console = Arc::new(Self {
            commands: RwLock::new(CommandTree::new()),
            output: OutputBuffer::new(config.buffers.output_lines),
            history: HistoryBuffer::new(config.buffers.history_entries),
            mode: Mutex::new(Mode::Normal),
            main,
            capture: AtomicBool::new(false),
        });
        console.install_builtins();
        console
    }

    /// Register a console command.
    pub fn add_command(
        &self,
        name: impl Into<String>,
        help: impl Into<String>,
        main_thread: bool,
        action: CommandAction,
    ) -> Result<(), CommandError> {
        self.lock_commands_mut().add(Command {
            name: name.into(),
            help: help.into(),
            main_thread,
            action,
        })
    }

    /// Register a passthrough-mode command (an embedded REPL).
    ///
    /// Running `<name>` enters the mode; while active, every input line is
    /// forwarded to `handler` verbatim until the literal `exit`.
    pub fn register_repl(
        self: &Arc<Self>,
        name: impl Into<String>,
        help: impl Into<String>,
        handler: Arc<dyn Fn(&str) -> Result<(), CommandError> + Send + Sync>,
    ) -> Result<(), CommandError> {
        let name = name.into();
        let mode_name = name.clone();
        let weak = Arc::downgrade(self);
        self.add_command(name, help, true, Arc::new(move |args: &[String]| {
            let Some(console) = weak.upgrade() else {
                return Ok(());
            };
            console.enter_mode(&mode_name);
            match args.first() {
                None => {
                    console.log(format!(">>>>> {mode_name} <<<<<"));
                    Ok(())
                }
                Some(line) if line.eq_ignore_ascii_case("exit") => {
                    console.exit_mode(&mode_name);
                    Ok(())
                }
                Some(line) => {
                    console.log(format!("{mode_name}: {line}"));
                    handler(line)
                }
            }
        }))
    }

    /// Execute a raw command string: echo it, record it, dispatch it.
    pub fn run(&self, input: &str) {
        if input.is_empty() {
            return;
        }
        self.log(format!("{PROMPT}{input}"));
        self.history.push(input);
        self.execute(input);
    }

    /// Complete partial input; suggestion lines land in the output buffer.
    pub fn complete(&self, partial: &str) -> String {
        let commands = self.lock_commands();
        commands.complete(partial, &mut |line| self.output.append(line))
    }

    /// Append a line to the console output.
    pub fn log(&self, line: impl Into<String>) {
        self.output.append(line);
    }

    /// Append a host log line, severity-tagged for anything above `Log`.
    pub fn append_log(&self, severity: LogSeverity, message: &str) {
        match severity.span_class() {
            None => self.output.append(message),
            Some(class) => self
                .output
                .append(format!("<span class='{class}'>{message}</span>")),
        }
    }

    /// All output joined by `\n`.
    pub fn output_joined(&self) -> String {
        self.output.joined()
    }

    pub fn clear_output(&self) {
        self.output.clear();
    }

    /// History entry by index, 0 = most recent.
    pub fn history_entry(&self, index: usize) -> Option<String> {
        self.history.get(index)
    }

    /// Enter passthrough mode for the named command.
    pub fn enter_mode(&self, name: &str) {
        *self.lock_mode() = Mode::Passthrough(name.to_string());
    }

    /// Leave passthrough mode, logging the exit banner.
    pub fn exit_mode(&self, name: &str) {
        *self.lock_mode() = Mode::Normal;
        self.log(format!(">>>>> exit {name} <<<<<"));
    }

    pub fn mode(&self) -> Mode {
        self.lock_mode().clone()
    }

    /// Gate for the host-log capture layer.
    pub fn set_capture(&self, enabled: bool) {
        self.capture.store(enabled, Ordering::SeqCst);
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture.load(Ordering::SeqCst)
    }

    /// Wire the four console routes into a route table.
    pub fn register_routes(self: &Arc<Self>, table: &RouteTable) -> Result<(), RouteError> {
        let weak = Arc::downgrade(self);
        table.register(
            PathPattern::exact("/console/out"),
            MethodFilter::get_head(),
            false,
            Arc::new(move |ctx| {
                let Some(console) = weak.upgrade() else {
                    return Ok(Outcome::Declined);
                };
                ctx.response.write_text(console.output_joined());
                Ok(Outcome::Handled)
            }),
        )?;

        let weak = Arc::downgrade(self);
        table.register(
            PathPattern::exact("/console/run"),
            MethodFilter::get_head(),
            false,
            Arc::new(move |ctx| {
                let Some(console) = weak.upgrade() else {
                    return Ok(Outcome::Declined);
                };
                if let Some(command) = ctx.query_param("command") {
                    console.run(command);
                }
                ctx.response.write_text("");
                Ok(Outcome::Handled)
            }),
        )?;

        let weak = Arc::downgrade(self);
        table.register(
            PathPattern::exact("/console/commandHistory"),
            MethodFilter::get_head(),
            false,
            Arc::new(move |ctx| {
                let Some(console) = weak.upgrade() else {
                    return Ok(Outcome::Declined);
                };
                let entry = ctx
                    .query_param("index")
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .and_then(|index| console.history_entry(index))
                    .unwrap_or_default();
                ctx.response.write_text(entry);
                Ok(Outcome::Handled)
            }),
        )?;

        let weak = Arc::downgrade(self);
        table.register(
            PathPattern::exact("/console/complete"),
            MethodFilter::get_head(),
            false,
            Arc::new(move |ctx| {
                let Some(console) = weak.upgrade() else {
                    return Ok(Outcome::Declined);
                };
                let completed = ctx
                    .query_param("command")
                    .map(|partial| console.complete(partial))
                    .unwrap_or_default();
                ctx.response.write_text(completed);
                Ok(Outcome::Handled)
            }),
        )?;

        Ok(())
    }

    /// Dispatch one input line through the trie (or the active mode).
    fn execute(&self, input: &str) {
        let tokens = match self.mode() {
            Mode::Passthrough(name) => {
                let line = input
                    .strip_prefix(&format!("{name} "))
                    .unwrap_or(input)
                    .to_string();
                if line.trim().eq_ignore_ascii_case("exit") {
                    self.exit_mode(&name);
                    return;
                }
                vec![name, line]
            }
            Mode::Normal => tokenize(input),
        };

        let (command, main_thread, args) = {
            let commands = self.lock_commands();
            let (found, consumed) = commands.resolve(&tokens);
            match found {
                None => {
                    self.log("command not found");
                    return;
                }
                Some(command) => (
                    Arc::clone(&command.action),
                    command.main_thread,
                    tokens[consumed..].to_vec(),
                ),
            }
        };

        let result = if main_thread && !self.main.is_owner() {
            match self.main.invoke(move || command(&args)) {
                Ok(result) => result,
                Err(err) => Err(CommandError::from(err)),
            }
        } else {
            command(&args)
        };

        if let Err(err) = result {
            debug!(error = %err, "command failed");
            self.log(format!("error: {err}"));
        }
    }

    fn install_builtins(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let registered = self.add_command(
            "clear",
            "clears console output",
            false,
            Arc::new(move |_args: &[String]| {
                if let Some(console) = weak.upgrade() {
                    console.clear_output();
                }
                Ok(())
            }),
        );
        debug_assert!(registered.is_ok());

        let weak = Arc::downgrade(self);
        let registered = self.add_command(
            "help",
            "prints commands",
            false,
            Arc::new(move |_args: &[String]| {
                let Some(console) = weak.upgrade() else {
                    return Ok(());
                };
                let mut help = String::from("Commands:");
                for command in console.lock_commands().commands() {
                    help.push_str(&format!("\n{} : {}", command.name, command.help));
                }
                console.log(format!("<span class='Help'>{help}</span>"));
                Ok(())
            }),
        );
        debug_assert!(registered.is_ok());
    }

    fn lock_commands(&self) -> std::sync::RwLockReadGuard<'_, CommandTree> {
        self.commands.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_commands_mut(&self) -> std::sync::RwLockWriteGuard<'_, CommandTree> {
        self.commands.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_mode(&self) -> std::sync::MutexGuard<'_, Mode> {
        self.mode.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn console() -> Arc<Console> {
        Console::new(&ConsoleConfig::default(), Arc::new(MainThread::new()))
    }

    #[test]
    fn run_echoes_records_and_executes() {
        let console = console();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        console
            .add_command("ping", "test", false, Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();

        console.run("ping");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(console.history_entry(0).as_deref(), Some("ping"));
        assert!(console.output_joined().contains("> ping"));
    }

    #[test]
    fn unknown_command_is_logged_not_fatal() {
        let console = console();
        console.run("no such thing");
        assert!(console.output_joined().contains("command not found"));
    }

    #[test]
    fn quoted_args_reach_the_action() {
        let console = console();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        console
            .add_command("say", "test", false, Arc::new(move |args| {
                sink.lock().unwrap().extend(args.iter().cloned());
                Ok(())
            }))
            .unwrap();

        console.run(r#"say x "y z" w"#);
        assert_eq!(*seen.lock().unwrap(), vec!["x", "y z", "w"]);
    }

    #[test]
    fn deeper_binding_shadows_parent() {
        let console = console();
        let which = Arc::new(Mutex::new(String::new()));
        let a = Arc::clone(&which);
        console
            .add_command("a", "parent", false, Arc::new(move |_| {
                *a.lock().unwrap() = "a".into();
                Ok(())
            }))
            .unwrap();
        let ab = Arc::clone(&which);
        console
            .add_command("a b", "child", false, Arc::new(move |args| {
                *ab.lock().unwrap() = format!("a b:{}", args.join(","));
                Ok(())
            }))
            .unwrap();

        console.run("a b x");
        assert_eq!(*which.lock().unwrap(), "a b:x");
    }

    #[test]
    fn clear_then_out_is_empty() {
        let console = console();
        console.run("help");
        assert!(!console.output_joined().is_empty());
        console.run("clear");
        assert_eq!(console.output_joined(), "");
    }

    #[test]
    fn help_lists_commands_sorted() {
        let console = console();
        console
            .add_command("zz", "last", false, Arc::new(|_| Ok(())))
            .unwrap();
        console.run("help");
        let output = console.output_joined();
        let clear_at = output.find("clear :").unwrap();
        let help_at = output.find("help :").unwrap();
        let zz_at = output.find("zz :").unwrap();
        assert!(clear_at < help_at && help_at < zz_at);
    }

    #[test]
    fn failing_action_renders_into_output() {
        let console = console();
        console
            .add_command("boom", "fails", false, Arc::new(|_| {
                Err(CommandError::action("expected failure"))
            }))
            .unwrap();
        console.run("boom");
        assert!(console.output_joined().contains("expected failure"));
    }

    #[test]
    fn repl_mode_hijacks_input_until_exit() {
        let console = console();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        console
            .register_repl("lua", "enter lua state", Arc::new(move |line| {
                sink.lock().unwrap().push(line.to_string());
                Ok(())
            }))
            .unwrap();

        console.run("lua");
        assert_eq!(console.mode(), Mode::Passthrough("lua".into()));

        // While in the mode, input bypasses the trie entirely.
        console.run("print(1 + 1)");
        console.run("help");
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["print(1 + 1)", "help"]
        );

        console.run("exit");
        assert_eq!(console.mode(), Mode::Normal);
        assert!(console.output_joined().contains(">>>>> exit lua <<<<<"));

        // Back to normal dispatch.
        console.run("help");
        assert!(console.output_joined().contains("Commands:"));
    }

    #[test]
    fn repl_exit_is_case_insensitive() {
        let console = console();
        console
            .register_repl("lua", "enter lua state", Arc::new(|_| Ok(())))
            .unwrap();
        console.run("lua");
        console.run("EXIT");
        assert_eq!(console.mode(), Mode::Normal);
    }

    #[test]
    fn completion_suggestions_land_in_output() {
        let console = console();
        console
            .add_command("alpha", "", false, Arc::new(|_| Ok(())))
            .unwrap();
        console
            .add_command("alb", "", false, Arc::new(|_| Ok(())))
            .unwrap();

        assert_eq!(console.complete("alp"), "alpha ");
        assert_eq!(console.complete("al"), "al");
        let output = console.output_joined();
        assert!(output.contains("alb"));
        assert!(output.contains("alpha"));
    }

    #[test]
    fn empty_input_is_ignored() {
        let console = console();
        console.run("");
        assert_eq!(console.output_joined(), "");
        assert!(console.history_entry(0).is_none());
    }

    #[test]
    fn append_log_wraps_severities() {
        let console = console();
        console.append_log(LogSeverity::Log, "plain");
        console.append_log(LogSeverity::Warning, "careful");
        let output = console.output_joined();
        assert!(output.contains("plain"));
        assert!(output.contains("<span class='Warning'>careful</span>"));
    }
}
