//! Template name resolution.
//!
//! A template's lookup key is its path relative to the views root, with `/`
//! separators and the template extension removed:
//!
//! ```text
//! ./views/partials\footer.html  ->  partials/footer
//! ```

use std::path::{Component, Path};

use crate::error::{ViewError, ViewResult};

/// Whether `path` names a template file for the given extension.
///
/// The match is an exact, case-sensitive suffix match on the file name, so
/// multi-part extensions such as `.tmpl.html` work. A file whose whole name is
/// the extension is not a template. An empty extension only admits file names
/// without any `.`.
pub fn is_template(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            if extension.is_empty() {
                !name.is_empty() && !name.contains('.')
            } else {
                name.len() > extension.len() && name.ends_with(extension)
            }
        })
}

/// Derive the lookup name of `path` relative to `root`.
pub fn template_name(root: &Path, path: &Path, extension: &str) -> ViewResult<String> {
    let relative = relative_slash_path(root, path)?;
    Ok(relative
        .strip_suffix(extension)
        .map(str::to_owned)
        .unwrap_or(relative))
}

/// Whether the resolved template `name` is skipped as the layout.
///
/// A plain suffix match, the same as matching the file path against
/// `layout + extension`: layout `main` skips `main`, `layouts/main` and
/// `domain` alike.
pub fn is_layout(name: &str, layout: &str) -> bool {
    name.ends_with(layout)
}

/// `path` relative to `root`, joined with `/` regardless of platform.
fn relative_slash_path(root: &Path, path: &Path) -> ViewResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ViewError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}
