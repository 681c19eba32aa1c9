//! View engine configuration, optionally loaded from TOML.
//!
//! ```toml
//! directory = "./views"
//! extension = ".html"
//! layout = "layouts/main"
//! reload = true
//!
//! [delimiters]
//! left = "[["
//! right = "]]"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::syntax::Delimiters;

const DEFAULT_DIRECTORY: &str = "./views";
const DEFAULT_EXTENSION: &str = ".html";

/// Settings that shape how templates are discovered and compiled.
///
/// Changes only take effect on the next load; views that are already compiled
/// keep the settings they were built with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ViewConfig {
    /// Root of the template tree.
    pub directory: PathBuf,

    /// Template file suffix, including the leading dot.
    pub extension: String,

    /// Name of the layout every page is wrapped in, if any.
    pub layout: Option<String>,

    /// Expression, block and comment markers.
    pub delimiters: Delimiters,

    /// Recompile every template before each render.
    pub reload: bool,

    /// Trace each compiled template.
    pub debug: bool,

    /// Fail renders that touch undefined values instead of rendering them empty.
    pub strict: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY, DEFAULT_EXTENSION)
    }
}

impl ViewConfig {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
            layout: None,
            delimiters: Delimiters::default(),
            reload: false,
            debug: false,
            strict: false,
        }
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: None,
            source: e,
        })?;
        Ok(config.normalized())
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source: e,
        })?;
        tracing::debug!(?path, "Loaded view config");
        Ok(config.normalized())
    }

    #[must_use]
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.set_layout(layout);
        self
    }

    #[must_use]
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// An empty name turns layout mode off.
    pub fn set_layout(&mut self, layout: impl Into<String>) {
        let layout = layout.into();
        self.layout = (!layout.is_empty()).then_some(layout);
    }

    /// Path of the layout file, when layout mode is on.
    pub fn layout_path(&self) -> Option<PathBuf> {
        self.layout
            .as_ref()
            .map(|layout| self.directory.join(format!("{layout}{}", self.extension)))
    }

    fn normalized(mut self) -> Self {
        if let Some(layout) = self.layout.take() {
            self.set_layout(layout);
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse view config: {source}")]
    Parse {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ViewConfig::default();
        assert_eq!(config.directory, PathBuf::from("./views"));
        assert_eq!(config.extension, ".html");
        assert!(config.layout.is_none());
        assert!(!config.reload);
        assert!(!config.debug);
        assert!(!config.strict);
    }

    #[test]
    fn test_parse_full_config() {
        let config = ViewConfig::from_toml_str(
            r#"
directory = "./templates"
extension = ".tmpl"
layout = "layouts/base"
reload = true
debug = true
strict = true

[delimiters]
left = "[["
right = "]]"
"#,
        )
        .unwrap();
        assert_eq!(config.directory, PathBuf::from("./templates"));
        assert_eq!(config.extension, ".tmpl");
        assert_eq!(config.layout.as_deref(), Some("layouts/base"));
        assert!(config.reload);
        assert!(config.debug);
        assert!(config.strict);
        assert_eq!(config.delimiters, Delimiters::new("[[", "]]"));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = ViewConfig::from_toml_str(r#"extension = ".txt""#).unwrap();
        assert_eq!(config.extension, ".txt");
        assert_eq!(config.directory, PathBuf::from("./views"));
    }

    #[test]
    fn test_empty_layout_disables_layout_mode() {
        let config = ViewConfig::from_toml_str(r#"layout = """#).unwrap();
        assert!(config.layout.is_none());

        let config = ViewConfig::default().with_layout("");
        assert!(config.layout.is_none());
    }

    #[test]
    fn test_layout_path() {
        let config = ViewConfig::new("views", ".html").with_layout("layouts/main");
        assert_eq!(
            config.layout_path(),
            Some(PathBuf::from("views").join("layouts/main.html"))
        );
        assert!(ViewConfig::new("views", ".html").layout_path().is_none());
    }

    #[test]
    fn test_parse_error() {
        let err = ViewConfig::from_toml_str("reload = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("views.toml");
        std::fs::write(&path, "directory = \"./app/views\"\nreload = true\n").unwrap();

        let config = ViewConfig::load(&path).unwrap();
        assert_eq!(config.directory, PathBuf::from("./app/views"));
        assert!(config.reload);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
