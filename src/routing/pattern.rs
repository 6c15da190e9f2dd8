//! Path patterns and method filters.
//!
//! # Responsibilities
//! - Match a normalized request path, capturing groups for file routes
//! - Filter on the HTTP method (default GET/HEAD)
//!
//! # Design Decisions
//! - Path matching is case-insensitive for exact patterns
//! - No regex: an enum of the two shapes the console needs keeps matching
//!   O(n) and the captures typed

use axum::http::Method;

/// A compiled path matcher.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Matches one path exactly (ASCII case-insensitive), no captures.
    Exact(String),
    /// Matches `/<path>.<ext>` (or `/download/<path>.<ext>` when
    /// `download`), capturing the relative path and the lower-cased
    /// extension.
    File { download: bool },
}

impl PathPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        PathPattern::Exact(path.into())
    }

    /// Match `path`, returning the captured groups on success.
    pub fn capture(&self, path: &str) -> Option<Vec<String>> {
        match self {
            PathPattern::Exact(expected) => {
                path.eq_ignore_ascii_case(expected).then(Vec::new)
            }
            PathPattern::File { download } => {
                let relative = if *download {
                    path.strip_prefix("/download/")?
                } else {
                    path.strip_prefix('/')?
                };
                let (_, ext) = relative.rsplit_once('.')?;
                if relative.is_empty()
                    || ext.is_empty()
                    || !ext.chars().all(|c| c.is_ascii_alphanumeric())
                {
                    return None;
                }
                Some(vec![relative.to_string(), ext.to_lowercase()])
            }
        }
    }
}

/// Set of HTTP methods a route accepts.
#[derive(Debug, Clone)]
pub struct MethodFilter {
    allowed: Option<Vec<Method>>,
}

impl MethodFilter {
    /// The default filter: GET and HEAD.
    pub fn get_head() -> Self {
        Self {
            allowed: Some(vec![Method::GET, Method::HEAD]),
        }
    }

    /// Accept any method.
    pub fn any() -> Self {
        Self { allowed: None }
    }

    /// Accept exactly the given methods.
    pub fn of(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            allowed: Some(methods.into_iter().collect()),
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        match &self.allowed {
            None => true,
            Some(methods) => methods.contains(method),
        }
    }
}

impl Default for MethodFilter {
    fn default() -> Self {
        Self::get_head()
    }
}
