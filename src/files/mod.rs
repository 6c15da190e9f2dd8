//! Static file lookup for the file-serving routes.
//!
//! # Responsibilities
//! - Map file extensions to MIME types
//! - Resolve captured relative paths against the configured file root
//! - Provide the built-in UI assets served when no real file exists
//!
//! # Design Decisions
//! - The extension table is fixed; unknown extensions fall back to
//!   `application/octet-stream`
//! - Resolution rejects absolute paths and any `..` component, so a request
//!   can never escape the file root
//! - Built-in assets are compiled into the binary; a real file under the
//!   root with the same name shadows them

use std::io;
use std::path::{Component, Path, PathBuf};

/// Fallback MIME type for downloads and unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Built-in extension→MIME table.
pub fn mime_for_ext(ext: &str) -> &'static str {
    match ext {
        "js" => "application/javascript",
        "json" => "application/json",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "png" => "image/png",
        "css" => "text/css",
        "htm" | "html" => "text/html",
        "ico" => "image/x-icon",
        _ => OCTET_STREAM,
    }
}

/// Default UI assets served for paths that have no file under the root.
pub fn builtin_asset(relative: &str) -> Option<(&'static [u8], &'static str)> {
    match relative {
        "index.html" => Some((include_bytes!("../../assets/index.html"), "text/html")),
        "console.css" => Some((include_bytes!("../../assets/console.css"), "text/css")),
        "favicon.ico" => Some((include_bytes!("../../assets/favicon.ico"), "image/x-icon")),
        _ => None,
    }
}

/// File lookup rooted at a fixed directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a captured relative path under the root.
    ///
    /// Returns `None` for absolute paths or anything containing a parent
    /// component.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let candidate = Path::new(relative);
        let safe = candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || !safe {
            return None;
        }
        Some(self.root.join(candidate))
    }

    /// Read the file at the resolved path, `Ok(None)` if it does not exist
    /// or the path is rejected.
    pub fn read(&self, relative: &str) -> io::Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(relative) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            // A directory is not a servable file.
            Err(_) if path.is_dir() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_table_matches_known_extensions() {
        assert_eq!(mime_for_ext("js"), "application/javascript");
        assert_eq!(mime_for_ext("jpeg"), "image/jpeg");
        assert_eq!(mime_for_ext("html"), "text/html");
        assert_eq!(mime_for_ext("exe"), OCTET_STREAM);
    }

    #[test]
    fn builtin_assets_cover_default_ui() {
        assert!(builtin_asset("index.html").is_some());
        assert!(builtin_asset("console.css").is_some());
        assert!(builtin_asset("favicon.ico").is_some());
        assert!(builtin_asset("other.html").is_none());
    }

    #[test]
    fn resolve_rejects_traversal() {
        let store = FileStore::new("/tmp/console");
        assert!(store.resolve("../etc/passwd").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
        assert!(store.resolve("logs/../../x").is_none());
        assert!(store.resolve("").is_none());
    }

    #[test]
    fn resolve_joins_under_root() {
        let store = FileStore::new("/tmp/console");
        assert_eq!(
            store.resolve("logs/latest.json").unwrap(),
            PathBuf::from("/tmp/console/logs/latest.json")
        );
    }

    #[test]
    fn read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read("nope.json").unwrap().is_none());
    }

    #[test]
    fn read_existing_file_returns_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.json"), b"{}").unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.read("data.json").unwrap().unwrap(), b"{}");
    }
}
