//! # View Error Types
//!
//! Unified error handling for template discovery, compilation and rendering.

use std::path::PathBuf;

use thiserror::Error;

/// View engine result type
pub type ViewResult<T> = Result<T, ViewError>;

/// Errors surfaced by the view engine.
///
/// Every error crosses the engine boundary unchanged; the engine never retries
/// or swallows a failure.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template {path} is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },

    #[error("template {path} is outside of the views directory {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("invalid delimiter configuration: {0}")]
    Syntax(#[source] minijinja::Error),

    #[error("failed to compile template '{name}' ({path}): {source}")]
    Compile {
        name: String,
        path: PathBuf,
        source: minijinja::Error,
    },

    #[error("render: template {name} does not exist")]
    NotFound { name: String },

    #[error("render error for '{name}': {source}")]
    Render {
        name: String,
        source: minijinja::Error,
    },

    #[error("render: layout argument is not supported")]
    LayoutOverride,
}

impl ViewError {
    pub(crate) fn walk(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Walk {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Whether a render failed because the requested template is not in the store.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether a load failed because a template or layout body is malformed.
    #[must_use]
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile { .. } | Self::Syntax(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_found_message_names_template() {
        let err = ViewError::NotFound {
            name: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "render: template missing does not exist");
        assert!(err.is_not_found());
        assert!(!err.is_compile());
    }

    #[test]
    fn test_layout_override_message() {
        let err = ViewError::LayoutOverride;
        assert_eq!(err.to_string(), "render: layout argument is not supported");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_read_error_includes_path() {
        let err = ViewError::read(
            "views/index.html",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("views/index.html"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_walk_error_keeps_source() {
        use std::error::Error as _;

        let err = ViewError::walk("views", io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert!(err.source().is_some());
    }
}
