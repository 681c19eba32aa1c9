//! Filesystem backends for template discovery.
//!
//! The engine only talks to [`TemplateFs`]; which backend is behind it is decided
//! once at construction:
//!
//! - [`OsFs`] reads a real directory tree through `walkdir`.
//! - [`MemoryFs`] serves a virtual tree of `path -> bytes`, either compiled into
//!   the binary with `include_bytes!` or mounted from disk at runtime.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ViewError, ViewResult};

/// One entry produced while walking a template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Full path of the entry (the walk root joined with its relative path).
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl WalkEntry {
    fn dir(path: PathBuf) -> Self {
        Self { path, is_dir: true }
    }

    fn file(path: PathBuf) -> Self {
        Self {
            path,
            is_dir: false,
        }
    }
}

/// Visitor invoked for every walked entry.
///
/// Returning `Err` aborts the walk with that error; returning `Ok` continues,
/// even when the entry itself was an `Err`.
pub type WalkVisitor<'a> = dyn FnMut(ViewResult<WalkEntry>) -> ViewResult<()> + 'a;

/// Uniform read/walk contract over template storage backends.
pub trait TemplateFs: Debug + Send + Sync {
    /// Read the full contents of the file at `path`.
    fn read(&self, path: &Path) -> ViewResult<Vec<u8>>;

    /// Walk the tree under `root`, calling `visit` for the root, every
    /// directory and every file. Sibling order is not part of the contract.
    fn walk(&self, root: &Path, visit: &mut WalkVisitor<'_>) -> ViewResult<()>;
}

/// Real filesystem backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl TemplateFs for OsFs {
    fn read(&self, path: &Path) -> ViewResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| ViewError::read(path, e))
    }

    fn walk(&self, root: &Path, visit: &mut WalkVisitor<'_>) -> ViewResult<()> {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry
                .map(|e| WalkEntry {
                    is_dir: e.file_type().is_dir(),
                    path: e.into_path(),
                })
                .map_err(|e| {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    ViewError::walk(path, io::Error::from(e))
                });
            visit(entry)?;
        }
        Ok(())
    }
}

/// Virtual template tree held in memory.
///
/// Keys are slash-separated paths relative to the tree root. Lookups ignore
/// `.` and leading `/` components, so `"."`, `""` and `"/"` all address the
/// root; paths containing `..` never resolve.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    #[must_use]
    pub fn insert(mut self, path: impl AsRef<str>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(normalize_key(path.as_ref()), contents.into());
        self
    }

    /// Build a tree from a static manifest, typically of `include_bytes!` entries.
    pub fn from_static(files: &[(&str, &[u8])]) -> Self {
        files
            .iter()
            .fold(Self::new(), |fs, (path, contents)| fs.insert(path, *contents))
    }

    /// Copy every file below `dir` into memory.
    pub fn snapshot(dir: impl AsRef<Path>) -> ViewResult<Self> {
        let dir = dir.as_ref();
        let mut files = BTreeMap::new();

        OsFs.walk(dir, &mut |entry: ViewResult<WalkEntry>| {
            let entry = entry?;
            if entry.is_dir {
                return Ok(());
            }
            let relative = entry
                .path
                .strip_prefix(dir)
                .map_err(|_| ViewError::OutsideRoot {
                    path: entry.path.clone(),
                    root: dir.to_path_buf(),
                })?;
            let key = normalize_key(&relative.to_string_lossy());
            files.insert(key, OsFs.read(&entry.path)?);
            Ok(())
        })?;

        tracing::debug!(dir = %dir.display(), files = files.len(), "Mounted template tree");
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl TemplateFs for MemoryFs {
    fn read(&self, path: &Path) -> ViewResult<Vec<u8>> {
        lookup_key(path)
            .and_then(|key| self.files.get(&key))
            .cloned()
            .ok_or_else(|| ViewError::read(path, not_found(path)))
    }

    fn walk(&self, root: &Path, visit: &mut WalkVisitor<'_>) -> ViewResult<()> {
        let Some(prefix) = lookup_key(root) else {
            return visit(Err(ViewError::walk(root, not_found(root))));
        };

        let mut matched = false;
        let mut seen_dirs = BTreeSet::new();

        for key in self.files.keys() {
            let rest = if prefix.is_empty() {
                key.as_str()
            } else {
                match key
                    .strip_prefix(prefix.as_str())
                    .and_then(|r| r.strip_prefix('/'))
                {
                    Some(rest) => rest,
                    None => continue,
                }
            };

            if !matched {
                matched = true;
                visit(Ok(WalkEntry::dir(root.to_path_buf())))?;
            }

            // Synthesize directory entries ahead of their first file.
            let mut dir = String::new();
            let mut segments: Vec<&str> = rest.split('/').collect();
            segments.pop();
            for segment in segments {
                if !dir.is_empty() {
                    dir.push('/');
                }
                dir.push_str(segment);
                if seen_dirs.insert(dir.clone()) {
                    visit(Ok(WalkEntry::dir(root.join(&dir))))?;
                }
            }

            visit(Ok(WalkEntry::file(root.join(rest))))?;
        }

        if !matched {
            if prefix.is_empty() {
                visit(Ok(WalkEntry::dir(root.to_path_buf())))?;
            } else {
                visit(Err(ViewError::walk(root, not_found(root))))?;
            }
        }

        Ok(())
    }
}

fn normalize_key(path: &str) -> String {
    path.split(|c: char| c == '/' || c == '\\')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn lookup_key(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => return None,
        }
    }
    Some(parts.join("/"))
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist in the embedded tree", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn collect(fs: &dyn TemplateFs, root: &Path) -> ViewResult<Vec<WalkEntry>> {
        let mut entries = Vec::new();
        fs.walk(root, &mut |entry| {
            entries.push(entry?);
            Ok(())
        })?;
        Ok(entries)
    }

    fn sample_tree() -> MemoryFs {
        MemoryFs::new()
            .insert("index.html", "index")
            .insert("layouts/main.html", "layout")
            .insert("./partials/nested/footer.html", "footer")
    }

    #[test]
    fn test_memory_read_normalizes_paths() {
        let fs = sample_tree();
        assert_eq!(fs.read(Path::new("index.html")).unwrap(), b"index");
        assert_eq!(fs.read(Path::new("./index.html")).unwrap(), b"index");
        assert_eq!(fs.read(Path::new("/layouts/main.html")).unwrap(), b"layout");
        assert_eq!(
            fs.read(Path::new("partials/nested/footer.html")).unwrap(),
            b"footer"
        );
    }

    #[test]
    fn test_memory_read_missing_is_error() {
        let fs = sample_tree();
        let err = fs.read(Path::new("nope.html")).unwrap_err();
        assert!(matches!(err, ViewError::Read { .. }));
    }

    #[test]
    fn test_memory_read_rejects_parent_components() {
        let fs = sample_tree();
        assert!(fs.read(Path::new("layouts/../index.html")).is_err());
    }

    #[test]
    fn test_memory_walk_from_dot_root() {
        let fs = sample_tree();
        let entries = collect(&fs, Path::new(".")).unwrap();

        let files: Vec<_> = entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.path.clone())
            .collect();
        assert_eq!(files.len(), 3);
        assert!(files.contains(&Path::new(".").join("index.html")));
        assert!(files.contains(&Path::new(".").join("layouts/main.html")));

        let dirs: Vec<_> = entries.iter().filter(|e| e.is_dir).collect();
        // root, layouts, partials, partials/nested
        assert_eq!(dirs.len(), 4);
        assert_eq!(entries[0], WalkEntry::dir(PathBuf::from(".")));
    }

    #[test]
    fn test_memory_walk_directories_precede_files() {
        let fs = sample_tree();
        let entries = collect(&fs, Path::new("/")).unwrap();
        let dir_pos = entries
            .iter()
            .position(|e| e.is_dir && e.path.ends_with("partials/nested"))
            .unwrap();
        let file_pos = entries
            .iter()
            .position(|e| e.path.ends_with("partials/nested/footer.html"))
            .unwrap();
        assert!(dir_pos < file_pos);
    }

    #[test]
    fn test_memory_walk_subdirectory_root() {
        let fs = sample_tree();
        let entries = collect(&fs, Path::new("layouts")).unwrap();
        let files: Vec<_> = entries.iter().filter(|e| !e.is_dir).collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, Path::new("layouts").join("main.html"));
    }

    #[test]
    fn test_memory_walk_missing_root_reports_error() {
        let fs = sample_tree();
        let err = collect(&fs, Path::new("missing")).unwrap_err();
        assert!(matches!(err, ViewError::Walk { .. }));
    }

    #[test]
    fn test_memory_walk_empty_tree_yields_root_only() {
        let fs = MemoryFs::new();
        let entries = collect(&fs, Path::new(".")).unwrap();
        assert_eq!(entries, vec![WalkEntry::dir(PathBuf::from("."))]);
    }

    #[test]
    fn test_visitor_can_skip_errors() {
        let fs = sample_tree();
        let mut errors = 0;
        fs.walk(Path::new("missing"), &mut |entry| {
            if entry.is_err() {
                errors += 1;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_from_static_manifest() {
        let files: &[(&str, &[u8])] = &[("home.html", &b"<h1>home</h1>"[..]), ("a/b.html", &b"b"[..])];
        let fs = MemoryFs::from_static(files);
        assert_eq!(fs.len(), 2);
        assert_eq!(fs.read(Path::new("a/b.html")).unwrap(), b"b");
    }

    #[test]
    fn test_os_walk_and_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("errors")).unwrap();
        fs::write(dir.path().join("errors").join("404.html"), "not found").unwrap();
        fs::write(dir.path().join("home.html"), "home").unwrap();

        let entries = collect(&OsFs, dir.path()).unwrap();
        assert!(entries[0].is_dir);
        assert_eq!(entries.iter().filter(|e| !e.is_dir).count(), 2);
        assert_eq!(
            OsFs.read(&dir.path().join("home.html")).unwrap(),
            b"home".to_vec()
        );
    }

    #[test]
    fn test_os_walk_missing_root_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect(&OsFs, &dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ViewError::Walk { .. }));
    }

    #[test]
    fn test_snapshot_mounts_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("layouts")).unwrap();
        fs::write(dir.path().join("layouts").join("main.html"), "layout").unwrap();
        fs::write(dir.path().join("index.html"), "index").unwrap();

        let mounted = MemoryFs::snapshot(dir.path()).unwrap();
        assert_eq!(mounted.len(), 2);
        assert_eq!(
            mounted.read(Path::new("./layouts/main.html")).unwrap(),
            b"layout"
        );
    }
}
