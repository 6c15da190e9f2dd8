//! Standalone demo host for the debug console.
//!
//! Runs the console against a toy "simulation": the process main thread
//! owns a speed value and ticks the main-thread dispatcher, while the HTTP
//! server serves the console UI and commands. Useful for poking at the
//! console with a browser or curl:
//!
//! ```text
//! debug-console --port 55055
//! curl 'localhost:55055/console/run?command=help'
//! curl 'localhost:55055/console/out'
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debug_console::command::CommandError;
use debug_console::config::{self, ConsoleConfig};
use debug_console::console::Console;
use debug_console::dispatch::MainThread;
use debug_console::files::FileStore;
use debug_console::http::ConsoleServer;
use debug_console::lifecycle::Shutdown;
use debug_console::observability::ConsoleCaptureLayer;
use debug_console::routing::RouteTable;

#[derive(Parser)]
#[command(name = "debug-console", about = "Embedded HTTP debug console demo host")]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 55055)]
    port: u16,

    /// Optional TOML config file (overrides --port).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root directory for the file-serving routes.
    #[arg(long)]
    file_root: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => config::load_from_path(path)?,
        None => ConsoleConfig::with_port(args.port),
    };
    if let Some(root) = &args.file_root {
        config.files.root = root.display().to_string();
    }

    // The process main thread owns the dispatcher; handlers pinned to it
    // run inside the loop at the bottom of this function.
    let main_thread = Arc::new(MainThread::new());
    let console = Console::new(&config, Arc::clone(&main_thread));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug_console=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(ConsoleCaptureLayer::new(Arc::downgrade(&console)))
        .init();

    register_sim_commands(&console)?;

    let table = Arc::new(RouteTable::new(
        FileStore::new(config.files.root.clone()),
        Arc::clone(&main_thread),
    ));
    console.register_routes(&table)?;

    let shutdown = Arc::new(Shutdown::new());
    let runtime = tokio::runtime::Runtime::new()?;
    let server = runtime.block_on(ConsoleServer::start(
        &config,
        Arc::clone(&console),
        table,
        Arc::clone(&shutdown),
    ))?;

    {
        let shutdown = Arc::clone(&shutdown);
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.trigger();
            }
        });
    }

    info!(addr = %server.local_addr(), "host loop running; Ctrl-C to stop");
    main_thread.run(config.dispatcher.poll_interval(), shutdown.subscribe());

    runtime.block_on(server.join());
    Ok(())
}

/// Commands for the toy simulation the demo host runs.
fn register_sim_commands(console: &Arc<Console>) -> Result<(), CommandError> {
    let speed = Arc::new(Mutex::new(1.0f64));

    let state = Arc::clone(&speed);
    let weak = Arc::downgrade(console);
    console.add_command(
        "sim get",
        "prints the simulation speed",
        true,
        Arc::new(move |_args| {
            if let Some(console) = weak.upgrade() {
                let speed = *state.lock().unwrap_or_else(|p| p.into_inner());
                console.log(format!("    speed = {speed}"));
            }
            Ok(())
        }),
    )?;

    let state = Arc::clone(&speed);
    let weak = Arc::downgrade(console);
    console.add_command(
        "sim set",
        "sets the simulation speed",
        true,
        Arc::new(move |args| {
            let value: f64 = args
                .first()
                .ok_or_else(|| CommandError::action("need a speed value"))?
                .parse()
                .map_err(|_| CommandError::action("speed must be a number"))?;
            *state.lock().unwrap_or_else(|p| p.into_inner()) = value;
            if let Some(console) = weak.upgrade() {
                console.log(format!("    speed = {value}"));
            }
            Ok(())
        }),
    )?;

    // A toy REPL: echoes every line back until "exit".
    let weak = Arc::downgrade(console);
    console.register_repl(
        "echo",
        "enter echo state",
        Arc::new(move |line| {
            if let Some(console) = weak.upgrade() {
                console.log(line.to_string());
            }
            Ok(())
        }),
    )?;

    Ok(())
}
