//! The view engine: configuration, template loading and rendering.
//!
//! `ViewEngine` is configured once through its builder-style setters and then
//! shared (typically behind an `Arc`) by whatever threads serve requests.
//! Configuring an engine that is already shared is not supported; the setters
//! take `self` by value to make that hard to do by accident. Functions are the
//! exception: [`ViewEngine::add_func`] works through `&self`.
//!
//! Compiled views live in a [`TemplateStore`] behind one `RwLock`, together
//! with the loaded flag and the function map:
//!
//! - `load` holds the lock exclusively for the whole walk/compile/publish and
//!   builds the new store aside, so a failed load never publishes a partial
//!   store and never marks the engine loaded.
//! - `render` looks up under a shared lock in the steady state. In reload mode
//!   every render goes through the exclusive load path first, which serializes
//!   renders against each other.
//! - Execution always happens after the lock is released, on an `Arc` handle.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use minijinja::functions::Function;
use minijinja::value::{FunctionArgs, FunctionResult};
use minijinja::Value;
use serde::Serialize;
use tracing::{info, warn};

use crate::compiler::{CompiledTemplate, Compiler, LayoutSource};
use crate::config::ViewConfig;
use crate::error::{ViewError, ViewResult};
use crate::fs::{OsFs, TemplateFs, WalkEntry};
use crate::name::{is_layout, is_template, template_name};
use crate::store::TemplateStore;
use crate::syntax::Delimiters;

/// Load/render contract used by host frameworks.
pub trait Views {
    /// Compile every template, unless already loaded.
    fn load(&self) -> ViewResult<()>;

    /// Execute template `name` against `binding` into `out`.
    ///
    /// `layouts` exists for hosts that pass a per-render layout; any entry is
    /// rejected because the layout is fixed per engine.
    fn render(
        &self,
        out: &mut dyn Write,
        name: &str,
        binding: Value,
        layouts: &[&str],
    ) -> ViewResult<()>;
}

#[derive(Debug, Default)]
struct EngineState {
    funcs: BTreeMap<String, Value>,
    store: TemplateStore,
    loaded: bool,
}

/// Directory-backed view engine.
#[derive(Debug)]
pub struct ViewEngine {
    config: ViewConfig,
    fs: Box<dyn TemplateFs>,
    state: RwLock<EngineState>,
}

impl ViewEngine {
    /// Engine over a real directory.
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self::from_config(ViewConfig::new(directory, extension))
    }

    /// Engine over a virtual tree, rooted at `"."`.
    pub fn with_fs(fs: impl TemplateFs + 'static, extension: impl Into<String>) -> Self {
        Self::from_config_with_fs(ViewConfig::new(".", extension), fs)
    }

    pub fn from_config(config: ViewConfig) -> Self {
        Self::from_config_with_fs(config, OsFs)
    }

    pub fn from_config_with_fs(config: ViewConfig, fs: impl TemplateFs + 'static) -> Self {
        Self {
            config,
            fs: Box::new(fs),
            state: RwLock::new(EngineState::default()),
        }
    }

    /// Set the expression markers. An empty string keeps the default for that side.
    #[must_use]
    pub fn delims(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.config.delimiters = Delimiters::new(left, right);
        self
    }

    /// Set expression, block and comment markers at once.
    #[must_use]
    pub fn delimiters(mut self, delimiters: Delimiters) -> Self {
        self.config.delimiters = delimiters;
        self
    }

    /// Wrap every page in the layout `key` (a template name). Empty disables.
    #[must_use]
    pub fn layout(mut self, key: impl Into<String>) -> Self {
        self.config.set_layout(key);
        self
    }

    /// Recompile all templates before every render.
    #[must_use]
    pub fn reload(mut self, enabled: bool) -> Self {
        self.config.reload = enabled;
        self
    }

    /// Trace each parsed template on load.
    #[must_use]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Treat undefined values as render errors.
    #[must_use]
    pub fn strict(mut self, enabled: bool) -> Self {
        self.config.strict = enabled;
        self
    }

    /// Builder form of [`ViewEngine::add_func`].
    #[must_use]
    pub fn func<N, F, Rv, Args>(self, name: N, f: F) -> Self
    where
        N: Into<String>,
        F: Function<Rv, Args>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        self.add_func(name, f);
        self
    }

    /// Register a function callable from every template, replacing any
    /// function of the same name.
    ///
    /// Only templates compiled after this call see the function; it does not
    /// invalidate views that are already loaded.
    pub fn add_func<N, F, Rv, Args>(&self, name: N, f: F) -> &Self
    where
        N: Into<String>,
        F: Function<Rv, Args>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        let func = Value::from_function(f);
        self.write_state().funcs.insert(name.into(), func);
        self
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Compile all templates into a fresh store, unless already loaded.
    pub fn load(&self) -> ViewResult<()> {
        let loaded = self.read_state().loaded;
        if loaded {
            return Ok(());
        }

        let mut state = self.write_state();
        // Someone else may have finished a load while we waited.
        if state.loaded {
            return Ok(());
        }
        self.load_locked(&mut state)
    }

    #[deprecated(note = "use `load` instead")]
    pub fn parse(&self) -> ViewResult<()> {
        warn!("parse() is deprecated, please use load() instead");
        self.load()
    }

    /// Mark the engine unloaded so the next load or render recompiles.
    ///
    /// The current store keeps serving lookups until a load replaces it.
    pub fn invalidate(&self) {
        self.write_state().loaded = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.read_state().loaded
    }

    /// Names in the currently published store, sorted.
    pub fn template_names(&self) -> Vec<String> {
        self.read_state().store.names()
    }

    /// Render template `name` with `binding` into `out`.
    pub fn render<W, S>(&self, mut out: W, name: &str, binding: S) -> ViewResult<()>
    where
        W: Write,
        S: Serialize,
    {
        let template = self.lookup(name)?;
        template.execute(binding, &mut out)
    }

    fn lookup(&self, name: &str) -> ViewResult<Arc<CompiledTemplate>> {
        let template = if self.config.reload {
            let mut state = self.write_state();
            state.loaded = false;
            self.load_locked(&mut state)?;
            state.store.get(name)
        } else {
            self.load()?;
            self.read_state().store.get(name)
        };

        template.ok_or_else(|| ViewError::NotFound {
            name: name.to_string(),
        })
    }

    fn load_locked(&self, state: &mut EngineState) -> ViewResult<()> {
        let compiler = Compiler::new(&self.config, &state.funcs)?;

        let layout = self.read_layout()?;
        if let Some(layout) = &layout {
            compiler.check_layout(layout)?;
        }

        let root = self.config.directory.as_path();
        let extension = self.config.extension.as_str();
        let mut store = TemplateStore::new();

        self.fs.walk(root, &mut |entry: ViewResult<WalkEntry>| {
            let entry = entry?;
            if entry.is_dir || !is_template(&entry.path, extension) {
                return Ok(());
            }

            let name = template_name(root, &entry.path, extension)?;
            if let Some(layout) = &self.config.layout {
                if is_layout(&name, layout) {
                    return Ok(());
                }
            }

            let body = self.read_source(&entry.path)?;
            let template = compiler.compile(&name, &entry.path, body, layout.as_ref())?;
            if self.config.debug {
                info!(template = %name, path = %entry.path.display(), "Parsed template");
            }
            store.insert(template);
            Ok(())
        })?;

        if self.config.debug {
            info!(count = store.len(), directory = %root.display(), "Loaded templates");
        }

        state.store = store;
        state.loaded = true;
        Ok(())
    }

    fn read_layout(&self) -> ViewResult<Option<LayoutSource>> {
        let (Some(name), Some(path)) = (self.config.layout.clone(), self.config.layout_path())
        else {
            return Ok(None);
        };
        let body = self.read_source(&path)?;
        Ok(Some(LayoutSource { name, path, body }))
    }

    fn read_source(&self, path: &Path) -> ViewResult<String> {
        let bytes = self.fs.read(path)?;
        String::from_utf8(bytes).map_err(|source| ViewError::Encoding {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, EngineState> {
        // The state is only ever replaced wholesale, so a poisoned lock still
        // guards a consistent value.
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Views for ViewEngine {
    fn load(&self) -> ViewResult<()> {
        ViewEngine::load(self)
    }

    fn render(
        &self,
        out: &mut dyn Write,
        name: &str,
        binding: Value,
        layouts: &[&str],
    ) -> ViewResult<()> {
        if !layouts.is_empty() {
            return Err(ViewError::LayoutOverride);
        }
        ViewEngine::render(self, out, name, binding)
    }
}
