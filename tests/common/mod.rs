//! Shared utilities for the end-to-end console tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use debug_console::config::ConsoleConfig;
use debug_console::console::Console;
use debug_console::dispatch::MainThread;
use debug_console::files::FileStore;
use debug_console::http::ConsoleServer;
use debug_console::lifecycle::Shutdown;
use debug_console::routing::RouteTable;

/// A full console stack listening on an ephemeral loopback port, with a
/// console-owned drain thread standing in for the host's main loop.
#[allow(dead_code)]
pub struct TestStack {
    pub server: ConsoleServer,
    pub console: Arc<Console>,
    pub table: Arc<RouteTable>,
    pub main: Arc<MainThread>,
    pub shutdown: Arc<Shutdown>,
    pub base: String,
}

impl TestStack {
    pub async fn start(file_root: &Path) -> TestStack {
        let mut config = ConsoleConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config.files.root = file_root.display().to_string();
        config.capture_host_logs = false;

        let shutdown = Arc::new(Shutdown::new());
        let main = MainThread::spawn(Duration::from_millis(1), shutdown.subscribe()).unwrap();
        let console = Console::new(&config, Arc::clone(&main));
        let table = Arc::new(RouteTable::new(
            FileStore::new(file_root),
            Arc::clone(&main),
        ));
        console.register_routes(&table).unwrap();

        let server = ConsoleServer::start(
            &config,
            Arc::clone(&console),
            Arc::clone(&table),
            Arc::clone(&shutdown),
        )
        .await
        .unwrap();
        let base = format!("http://{}", server.local_addr());

        TestStack {
            server,
            console,
            table,
            main,
            shutdown,
            base,
        }
    }

    /// GET a path, returning (status, body).
    pub async fn get(&self, path: &str) -> (u16, String) {
        let response = reqwest::get(format!("{}{}", self.base, path)).await.unwrap();
        let status = response.status().as_u16();
        (status, response.text().await.unwrap())
    }

    /// Run a console command over HTTP.
    pub async fn run(&self, command: &str) -> u16 {
        let response = reqwest::Client::new()
            .get(format!("{}/console/run", self.base))
            .query(&[("command", command)])
            .send()
            .await
            .unwrap();
        response.status().as_u16()
    }

    /// Fetch the console output buffer.
    pub async fn out(&self) -> String {
        self.get("/console/out").await.1
    }

    pub fn stop(&self) {
        self.server.stop();
    }
}
