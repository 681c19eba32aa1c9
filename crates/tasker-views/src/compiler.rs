//! Compilation of template bodies into executable views.
//!
//! Each view owns its own `minijinja` environment carrying the delimiter,
//! escaping and function settings that were active when it was compiled. In
//! layout mode the layout body is added to that environment first and the page
//! is added second as a child of the layout, so executing the page renders the
//! layout with the page's blocks filled in.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use minijinja::syntax::SyntaxConfig;
use minijinja::{default_auto_escape_callback, Environment, UndefinedBehavior, Value};
use serde::Serialize;

use crate::config::ViewConfig;
use crate::error::{ViewError, ViewResult};
use crate::filters;

/// Layout body shared by every page compiled during one load.
#[derive(Debug, Clone)]
pub(crate) struct LayoutSource {
    pub name: String,
    pub path: PathBuf,
    pub body: String,
}

/// Settings frozen for the duration of one load.
pub(crate) struct Compiler {
    syntax: SyntaxConfig,
    block: (String, String),
    extension: String,
    strict: bool,
    funcs: BTreeMap<String, Value>,
}

impl Compiler {
    pub fn new(config: &ViewConfig, funcs: &BTreeMap<String, Value>) -> ViewResult<Self> {
        Ok(Self {
            syntax: config.delimiters.to_syntax()?,
            block: config.delimiters.block_pair(),
            extension: config.extension.clone(),
            strict: config.strict,
            funcs: funcs.clone(),
        })
    }

    /// Parse the layout on its own so a broken layout fails the load even
    /// when there are no pages to pair it with.
    pub fn check_layout(&self, layout: &LayoutSource) -> ViewResult<()> {
        let mut env = self.environment();
        add_layout(&mut env, layout)
    }

    /// Compile one page, optionally composed with `layout`.
    pub fn compile(
        &self,
        name: &str,
        path: &Path,
        body: String,
        layout: Option<&LayoutSource>,
    ) -> ViewResult<CompiledTemplate> {
        let mut env = self.environment();

        let source = match layout {
            Some(layout) => {
                add_layout(&mut env, layout)?;
                // Same line as the body so error line numbers still match the file.
                format!(
                    "{} extends {:?} {}{}",
                    self.block.0, layout.name, self.block.1, body
                )
            }
            None => body,
        };

        env.add_template_owned(name.to_string(), source)
            .map_err(|source| ViewError::Compile {
                name: name.to_string(),
                path: path.to_path_buf(),
                source,
            })?;

        Ok(CompiledTemplate {
            name: name.to_string(),
            env,
        })
    }

    fn environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_syntax(self.syntax.clone());
        if self.strict {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }

        // Lookup names carry no extension, so escape based on the configured one.
        let probe = format!("view{}", self.extension);
        env.set_auto_escape_callback(move |_name: &str| default_auto_escape_callback(&probe));

        filters::register(&mut env);
        for (name, func) in &self.funcs {
            env.add_global(name.clone(), func.clone());
        }
        env
    }
}

fn add_layout(env: &mut Environment<'static>, layout: &LayoutSource) -> ViewResult<()> {
    env.add_template_owned(layout.name.clone(), layout.body.clone())
        .map_err(|source| ViewError::Compile {
            name: layout.name.clone(),
            path: layout.path.clone(),
            source,
        })
}

/// An executable view.
#[derive(Debug)]
pub struct CompiledTemplate {
    name: String,
    env: Environment<'static>,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute against `binding`, streaming into `out`.
    ///
    /// Output is not buffered: on failure, whatever was produced before the
    /// error has already been written.
    pub fn execute<S: Serialize>(&self, binding: S, out: &mut dyn Write) -> ViewResult<()> {
        let render_error = |source| ViewError::Render {
            name: self.name.clone(),
            source,
        };
        let template = self.env.get_template(&self.name).map_err(render_error)?;
        template
            .render_captured_to(binding, out)
            .map_err(render_error)?;
        Ok(())
    }
}
