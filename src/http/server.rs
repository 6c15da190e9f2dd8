//! Console HTTP server setup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Response, StatusCode};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ConsoleConfig;
use crate::console::Console;
use crate::lifecycle::Shutdown;
use crate::routing::{RequestContext, RouteTable};

/// Errors from starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}

/// State injected into the fallback handler.
#[derive(Clone)]
struct ServerState {
    table: Arc<RouteTable>,
}

/// The running console server.
pub struct ConsoleServer {
    addr: SocketAddr,
    console: Arc<Console>,
    shutdown: Arc<Shutdown>,
    serve_task: tokio::task::JoinHandle<()>,
}

impl ConsoleServer {
    /// Bind the listener and begin accepting.
    ///
    /// Routes must already be registered on `table` (the file-serving pair
    /// installs itself on first dispatch). Host-log capture is switched on
    /// here when the config asks for it.
    pub async fn start(
        config: &ConsoleConfig,
        console: Arc<Console>,
        table: Arc<RouteTable>,
        shutdown: Arc<Shutdown>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.listener.bind_address.as_str()).await?;
        let addr = listener.local_addr()?;

        let app = Router::new()
            .fallback(dispatch_request)
            .layer(TraceLayer::new_for_http())
            .with_state(ServerState {
                table: Arc::clone(&table),
            });

        console.set_capture(config.capture_host_logs);

        let mut rx = shutdown.subscribe();
        let serve_task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            });
            if let Err(err) = serve.await {
                error!(error = %err, "console server terminated");
            }
        });

        info!(%addr, "console server listening");
        Ok(Self {
            addr,
            console,
            shutdown,
            serve_task,
        })
    }

    /// Address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and turn host-log capture off.
    ///
    /// Also releases the standalone drain loop, which subscribes to the
    /// same shutdown coordinator. Idempotent.
    pub fn stop(&self) {
        if self.shutdown.is_triggered() {
            return;
        }
        self.console.set_capture(false);
        self.shutdown.trigger();
        info!("console server stopping");
    }

    /// Wait for the accept loop to finish.
    pub async fn join(self) {
        let _ = self.serve_task.await;
    }
}

/// The one axum handler: every request funnels into the route table.
async fn dispatch_request(State(state): State<ServerState>, req: Request) -> Response<Body> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "console_request",
        %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let ctx = RequestContext::new(req.method().clone(), req.uri().path(), req.uri().query());
    let table = state.table;

    // Dispatch may park on the main-thread rendezvous; keep it off the
    // async workers.
    let result = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        table.dispatch(ctx)
    })
    .await;

    match result {
        Ok(sink) => sink.into_response(),
        Err(err) => {
            error!(error = %err, "dispatch task failed");
            let mut fallback = Response::new(Body::from("dispatch task failed"));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        }
    }
}
