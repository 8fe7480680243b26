//! Error types for bundle building and page rendering.
//!
//! Failures are split by phase:
//!
//! - [`ConfigError`]: reading renderer options failed.
//! - [`DiscoveryError`]: walking a template root failed.
//! - [`BuildError`]: turning discovered files into a [`BundleCache`](crate::BundleCache)
//!   failed. A build error always aborts the whole build.
//! - [`RenderError`]: a single render call failed. Execution and write
//!   failures only affect that call.

use std::io;
use std::path::PathBuf;

/// Renderer options could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read options file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid options: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A template root could not be walked.
#[derive(Debug, thiserror::Error)]
#[error("failed to walk template directory {}: {source}", .path.display())]
pub struct DiscoveryError {
    /// The directory or entry that failed.
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl DiscoveryError {
    pub(crate) fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while building the bundle cache.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// One of the template roots could not be walked.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A discovered template file could not be read.
    #[error("failed to read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A template in the bundle for `page` has a syntax error.
    #[error("failed to compile bundle for {}: {source}", .page.display())]
    Compile {
        page: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    /// A template calls names that are neither view data fields nor
    /// registered functions.
    #[error(
        "unresolved name(s) {} in template \"{template}\" (bundle for {})",
        .names.join(", "),
        .page.display()
    )]
    UnresolvedName {
        page: PathBuf,
        template: String,
        names: Vec<String>,
    },

    /// Two page files share a base name and collisions are rejected.
    #[error(
        "bundle name collision for \"{name}\":\n  - {}\n  - {}",
        .existing.display(),
        .conflicting.display()
    )]
    Collision {
        name: String,
        existing: PathBuf,
        conflicting: PathBuf,
    },
}

/// Errors returned by a render call.
///
/// A render that returns any of these has written nothing to its sink.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The bundle set could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// No bundle is registered under the requested name.
    #[error("bundle not found: {name}")]
    NotFound { name: String },

    /// The bundle failed while substituting view data.
    #[error("failed to execute bundle {name}: {source}")]
    Execution {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// The rendered output could not be written to the sink.
    #[error("failed to write rendered output: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    /// Returns true if the error is a missing bundle, the one failure callers
    /// are expected to handle as ordinary control flow.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RenderError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = RenderError::NotFound {
            name: "home.html".to_string(),
        };
        assert!(err.to_string().contains("bundle not found"));
        assert!(err.to_string().contains("home.html"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_discovery_converts_into_render_error() {
        let discovery = DiscoveryError::new(
            "/missing",
            io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        );
        let err: RenderError = BuildError::from(discovery).into();

        assert!(matches!(err, RenderError::Build(BuildError::Discovery(_))));
        assert!(err.to_string().contains("/missing"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_unresolved_name_lists_names() {
        let err = BuildError::UnresolvedName {
            page: PathBuf::from("pages/home.html"),
            template: "home.html".to_string(),
            names: vec!["translate".to_string(), "user".to_string()],
        };
        let display = err.to_string();
        assert!(display.contains("translate, user"));
        assert!(display.contains("pages/home.html"));
    }

    #[test]
    fn test_collision_display() {
        let err = BuildError::Collision {
            name: "home.html".to_string(),
            existing: PathBuf::from("/p/a/home.html"),
            conflicting: PathBuf::from("/p/b/home.html"),
        };
        let display = err.to_string();
        assert!(display.contains("/p/a/home.html"));
        assert!(display.contains("/p/b/home.html"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
        let err: RenderError = io_err.into();
        assert!(matches!(err, RenderError::Io(_)));
    }
}
