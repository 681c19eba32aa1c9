//! Directory-backed HTML/text view engine.
//!
//! Loads every template under a views directory, names it by its relative
//! path without the extension (`errors/404`), compiles it with `minijinja`
//! and renders it by name. Templates can optionally be wrapped in a shared
//! layout, use custom delimiters, call host-registered functions and be
//! recompiled on every render during development.
//!
//! ```no_run
//! use tasker_views::ViewEngine;
//! use minijinja::context;
//!
//! fn is_admin(user: &str) -> bool {
//!     user == "admin"
//! }
//!
//! let engine = ViewEngine::new("./views", ".html")
//!     .layout("layouts/main")
//!     .reload(cfg!(debug_assertions))
//!     .func("is_admin", is_admin);
//!
//! let mut out = Vec::new();
//! engine.render(&mut out, "index", context! { Title => "Hello, World!" })?;
//! # Ok::<(), tasker_views::ViewError>(())
//! ```
//!
//! # Modules
//!
//! - [`engine`]: The engine, its builder and the [`Views`] contract
//! - [`config`]: Engine settings, loadable from TOML
//! - [`fs`]: Real and in-memory template trees
//! - [`name`]: Template name resolution
//! - [`syntax`]: Delimiter configuration
//! - [`compiler`] / [`store`]: Compiled views and their lookup table
//! - [`error`]: Error types

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
mod filters;
pub mod fs;
pub mod name;
pub mod store;
pub mod syntax;

pub use compiler::CompiledTemplate;
pub use config::{ConfigError, ViewConfig};
pub use engine::{ViewEngine, Views};
pub use error::{ViewError, ViewResult};
pub use fs::{MemoryFs, OsFs, TemplateFs, WalkEntry};
pub use store::TemplateStore;
pub use syntax::Delimiters;
