//! The route table and its scan loop.
//!
//! # Responsibilities
//! - Store routes in registration order (priority order)
//! - Scan candidates per request; hop to the owning thread when a route
//!   demands main-thread affinity
//! - Append the file-serving route pair lazily on first dispatch
//!
//! # Design Decisions
//! - The scan works on a snapshot of the route list, so no lock is held
//!   across a handler or a main-thread rendezvous
//! - Faults (handler errors and panics inside hopped work) finalize the
//!   request as a 500 and are logged; they never stop the server

use std::sync::{Arc, Once, RwLock};

use axum::http::StatusCode;
use tracing::error;

use crate::dispatch::MainThread;
use crate::files::{builtin_asset, mime_for_ext, FileStore, OCTET_STREAM};

use super::context::RequestContext;
use super::context::ResponseSink;
use super::pattern::{MethodFilter, PathPattern};
use super::{Handler, Outcome, RouteError};

/// One registered route. Immutable after registration.
pub struct Route {
    pattern: PathPattern,
    methods: MethodFilter,
    main_thread: bool,
    handler: Handler,
}

/// Ordered route registry and dispatcher.
pub struct RouteTable {
    routes: RwLock<Vec<Arc<Route>>>,
    file_routes: Once,
    files: Arc<FileStore>,
    main: Arc<MainThread>,
}

impl RouteTable {
    pub fn new(files: FileStore, main: Arc<MainThread>) -> Self {
        Self {
            routes: RwLock::new(Vec::new()),
            file_routes: Once::new(),
            files: Arc::new(files),
            main,
        }
    }

    /// Append a route. Registration order is the match-priority order.
    pub fn register(
        &self,
        pattern: PathPattern,
        methods: MethodFilter,
        main_thread: bool,
        handler: Handler,
    ) -> Result<(), RouteError> {
        if matches!(&pattern, PathPattern::Exact(path) if path.is_empty()) {
            return Err(RouteError::EmptyPattern);
        }
        self.push(Route {
            pattern,
            methods,
            main_thread,
            handler,
        });
        Ok(())
    }

    /// Number of registered routes (file routes included once installed).
    pub fn len(&self) -> usize {
        self.lock_read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_read().is_empty()
    }

    /// Walk the table for one request and produce its response.
    ///
    /// Routes are scanned from `ctx.cursor` in registration order. A
    /// structural match runs the handler, hopped onto the owning thread
    /// when the route requires it (the calling thread blocks until the hop
    /// completes). `Declined` resumes the scan at the next route. Every
    /// exit path finalizes exactly one response: handled, 404 on
    /// exhaustion, or 500 on a fault.
    pub fn dispatch(&self, mut ctx: RequestContext) -> ResponseSink {
        self.install_file_routes();
        let routes: Vec<Arc<Route>> = self.lock_read().clone();

        while ctx.cursor < routes.len() {
            let route = Arc::clone(&routes[ctx.cursor]);
            let captures = match route.pattern.capture(&ctx.path) {
                Some(captures) => captures,
                None => {
                    ctx.cursor += 1;
                    continue;
                }
            };
            if !route.methods.allows(&ctx.method) {
                ctx.cursor += 1;
                continue;
            }
            ctx.captures = captures;

            let result = if route.main_thread && !self.main.is_owner() {
                let hop = Arc::clone(&route);
                match self.main.invoke(move || {
                    let mut ctx = ctx;
                    let result = (hop.handler)(&mut ctx);
                    (ctx, result)
                }) {
                    Ok((returned, result)) => {
                        ctx = returned;
                        result
                    }
                    Err(err) => {
                        // The context was lost inside the dispatcher; the
                        // request still gets exactly one response.
                        error!(error = %err, "main-thread hop failed");
                        let mut sink = ResponseSink::new();
                        sink.fail(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            format!("Fatal error:\n{err}"),
                        );
                        return sink;
                    }
                }
            } else {
                (route.handler)(&mut ctx)
            };

            match result {
                Ok(Outcome::Handled) => return ctx.response,
                Ok(Outcome::Declined) => ctx.cursor += 1,
                Err(err) => {
                    error!(error = %err, path = %ctx.path, "route handler fault");
                    ctx.response.fail(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Fatal error:\n{err}"),
                    );
                    return ctx.response;
                }
            }
        }

        ctx.response.fail(StatusCode::NOT_FOUND, "Not Found");
        ctx.response
    }

    /// Append the `/download/<path>.<ext>` and `/<path>.<ext>` routes.
    ///
    /// Runs once, on the first dispatch, so they always sit behind every
    /// explicitly registered route.
    fn install_file_routes(&self) {
        self.file_routes.call_once(|| {
            let files = Arc::clone(&self.files);
            self.push(Route {
                pattern: PathPattern::File { download: true },
                methods: MethodFilter::get_head(),
                main_thread: false,
                handler: Arc::new(move |ctx| serve_file(&files, ctx, true)),
            });

            let files = Arc::clone(&self.files);
            self.push(Route {
                pattern: PathPattern::File { download: false },
                methods: MethodFilter::get_head(),
                main_thread: false,
                handler: Arc::new(move |ctx| serve_file(&files, ctx, false)),
            });
        });
    }

    fn push(&self, route: Route) {
        self.lock_write().push(Arc::new(route));
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<Route>>> {
        self.routes.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<Route>>> {
        self.routes.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handler body for the generated file-serving route pair.
///
/// An existing file under the root wins; otherwise the built-in UI assets
/// answer for their paths; otherwise the route declines so later routes (or
/// the 404 fallback) take over.
fn serve_file(
    files: &FileStore,
    ctx: &mut RequestContext,
    download: bool,
) -> Result<Outcome, RouteError> {
    let (relative, ext) = match (ctx.captures.first(), ctx.captures.get(1)) {
        (Some(relative), Some(ext)) => (relative.clone(), ext.clone()),
        _ => return Ok(Outcome::Declined),
    };
    let mime = if download {
        OCTET_STREAM
    } else {
        mime_for_ext(&ext)
    };

    let bytes = match files.read(&relative)? {
        Some(bytes) => bytes,
        None => match builtin_asset(&relative) {
            Some((bytes, _)) => bytes.to_vec(),
            None => return Ok(Outcome::Declined),
        },
    };

    ctx.response.write_bytes(bytes, mime);
    if download {
        let filename = relative.rsplit('/').next().unwrap_or(&relative);
        ctx.response
            .add_header("content-disposition", format!("attachment; filename={filename}"));
    }
    Ok(Outcome::Handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn table() -> RouteTable {
        let dir = std::env::temp_dir().join("debug-console-no-root");
        RouteTable::new(FileStore::new(dir), Arc::new(MainThread::new()))
    }

    fn get(path: &str) -> RequestContext {
        RequestContext::new(Method::GET, path, None)
    }

    fn text_route(table: &RouteTable, path: &str, body: &'static str) {
        table
            .register(
                PathPattern::exact(path),
                MethodFilter::get_head(),
                false,
                Arc::new(move |ctx| {
                    ctx.response.write_text(body);
                    Ok(Outcome::Handled)
                }),
            )
            .unwrap();
    }

    #[test]
    fn first_matching_route_wins() {
        let table = table();
        let later = Arc::new(AtomicUsize::new(0));
        text_route(&table, "/a", "first");
        let counter = Arc::clone(&later);
        table
            .register(
                PathPattern::exact("/a"),
                MethodFilter::get_head(),
                false,
                Arc::new(move |ctx| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    ctx.response.write_text("second");
                    Ok(Outcome::Handled)
                }),
            )
            .unwrap();

        let sink = table.dispatch(get("/a"));
        assert_eq!(sink.body(), b"first");
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn declined_route_falls_through() {
        let table = table();
        table
            .register(
                PathPattern::exact("/a"),
                MethodFilter::get_head(),
                false,
                Arc::new(|_| Ok(Outcome::Declined)),
            )
            .unwrap();
        text_route(&table, "/a", "fallback");

        let sink = table.dispatch(get("/a"));
        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(sink.body(), b"fallback");
    }

    #[test]
    fn exhausted_scan_is_not_found() {
        let table = table();
        text_route(&table, "/a", "a");
        let sink = table.dispatch(get("/missing"));
        assert_eq!(sink.status(), StatusCode::NOT_FOUND);
        assert_eq!(sink.body(), b"Not Found");
    }

    #[test]
    fn method_filter_skips_route() {
        let table = table();
        text_route(&table, "/a", "get only");
        let sink = table.dispatch(RequestContext::new(Method::POST, "/a", None));
        assert_eq!(sink.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn handler_fault_becomes_500_and_server_survives() {
        let table = table();
        table
            .register(
                PathPattern::exact("/bad"),
                MethodFilter::get_head(),
                false,
                Arc::new(|_| Err(RouteError::handler("it broke"))),
            )
            .unwrap();
        text_route(&table, "/good", "still alive");

        let sink = table.dispatch(get("/bad"));
        assert_eq!(sink.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(String::from_utf8_lossy(sink.body()).contains("it broke"));

        let sink = table.dispatch(get("/good"));
        assert_eq!(sink.body(), b"still alive");
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let table = table();
        let err = table.register(
            PathPattern::exact(""),
            MethodFilter::get_head(),
            false,
            Arc::new(|_| Ok(Outcome::Handled)),
        );
        assert!(matches!(err, Err(RouteError::EmptyPattern)));
        // Rejection does not poison later registrations.
        text_route(&table, "/ok", "ok");
        assert_eq!(table.dispatch(get("/ok")).body(), b"ok");
    }

    #[test]
    fn file_routes_install_once_behind_registered_routes() {
        let table = table();
        text_route(&table, "/console/out", "out");
        let before = table.len();
        let _ = table.dispatch(get("/console/out"));
        let after_first = table.len();
        let _ = table.dispatch(get("/console/out"));
        assert_eq!(after_first, before + 2);
        assert_eq!(table.len(), after_first);
    }

    #[test]
    fn missing_file_declines_into_404() {
        let dir = tempfile::tempdir().unwrap();
        let table = RouteTable::new(FileStore::new(dir.path()), Arc::new(MainThread::new()));
        let sink = table.dispatch(get("/nope.json"));
        assert_eq!(sink.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn existing_file_is_served_with_mime() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state.json"), b"{\"ok\":true}").unwrap();
        let table = RouteTable::new(FileStore::new(dir.path()), Arc::new(MainThread::new()));
        let sink = table.dispatch(get("/state.json"));
        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(sink.body(), b"{\"ok\":true}");
    }

    #[test]
    fn download_route_forces_attachment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("save.dat"), b"\x01\x02").unwrap();
        let table = RouteTable::new(FileStore::new(dir.path()), Arc::new(MainThread::new()));
        let sink = table.dispatch(get("/download/save.dat"));
        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(sink.body(), b"\x01\x02");
    }

    #[test]
    fn builtin_index_served_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let table = RouteTable::new(FileStore::new(dir.path()), Arc::new(MainThread::new()));
        let sink = table.dispatch(get("/"));
        assert_eq!(sink.status(), StatusCode::OK);
        assert!(String::from_utf8_lossy(sink.body()).contains("<html>"));
    }

    #[test]
    fn main_thread_route_runs_on_owner() {
        let shutdown = crate::lifecycle::Shutdown::new();
        let main = MainThread::spawn(
            std::time::Duration::from_millis(1),
            shutdown.subscribe(),
        )
        .unwrap();
        let dir = std::env::temp_dir().join("debug-console-no-root");
        let table = RouteTable::new(FileStore::new(dir), Arc::clone(&main));

        let seen_owner = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&seen_owner);
        let probe = Arc::clone(&main);
        table
            .register(
                PathPattern::exact("/pinned"),
                MethodFilter::get_head(),
                true,
                Arc::new(move |ctx| {
                    if probe.is_owner() {
                        flag.store(1, Ordering::SeqCst);
                    }
                    ctx.response.write_text("pinned");
                    Ok(Outcome::Handled)
                }),
            )
            .unwrap();

        let sink = table.dispatch(get("/pinned"));
        assert_eq!(sink.body(), b"pinned");
        // Visible immediately after dispatch returns: the hop was synchronous.
        assert_eq!(seen_owner.load(Ordering::SeqCst), 1);
        shutdown.trigger();
    }
}
