//! Template file discovery.
//!
//! Walks a template root recursively and collects every file whose name ends
//! with the template extension. Entries are visited in file-name order, so
//! the same tree always yields the same list:
//!
//! ```text
//! pages/
//!   a/home.html      -> 1st
//!   b/home.html      -> 2nd
//!   index.html       -> 3rd
//! ```
//!
//! Any I/O error aborts the walk; there are no partial results.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DiscoveryError;

/// A template file found under a root.
///
/// For `/app/templates/partials/nav.html` under root `/app/templates`:
///
/// ```rust,ignore
/// TemplateFile {
///     name: "nav.html".to_string(),
///     relative_name: "partials/nav.html".to_string(),
///     path: PathBuf::from("/app/templates/partials/nav.html"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Base file name including extension. Pages are bundled under this name.
    pub name: String,
    /// Path relative to the root, `/`-separated. Fragments are registered
    /// under this name.
    pub relative_name: String,
    /// Full path for reading the source.
    pub path: PathBuf,
}

impl TemplateFile {
    /// Creates a descriptor for `path`, which must lie under `root`.
    pub fn new(path: impl Into<PathBuf>, root: &Path) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative_name = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Self {
            name,
            relative_name,
            path,
        }
    }
}

/// Lists every file under `root` whose name ends with `extension`.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if `root` or any directory below it cannot be
/// read.
pub fn discover(root: &Path, extension: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();
    walk_recursive(root, extension, &mut files)?;
    Ok(files)
}

/// Walks a template root and describes each template found.
pub fn walk_template_dir(
    root: impl AsRef<Path>,
    extension: &str,
) -> Result<Vec<TemplateFile>, DiscoveryError> {
    let root = root.as_ref();
    let files = discover(root, extension)?;
    Ok(files
        .into_iter()
        .map(|path| TemplateFile::new(path, root))
        .collect())
}

fn walk_recursive(
    current: &Path,
    extension: &str,
    files: &mut Vec<PathBuf>,
) -> Result<(), DiscoveryError> {
    let mut entries = fs::read_dir(current)
        .map_err(|e| DiscoveryError::new(current, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DiscoveryError::new(current, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| DiscoveryError::new(&path, e))?;

        if file_type.is_dir() {
            walk_recursive(&path, extension, files)?;
        } else if entry.file_name().to_string_lossy().ends_with(extension) {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) {
        let full_path = dir.join(name);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(&full_path).unwrap();
        file.write_all(b"content").unwrap();
    }

    fn names(files: &[TemplateFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_name.as_str()).collect()
    }

    #[test]
    fn test_discover_recursive_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "home.html");
        create_file(temp_dir.path(), "notes.txt");
        create_file(temp_dir.path(), "account/settings.html");
        create_file(temp_dir.path(), "account/deep/nested/profile.html");

        let files = walk_template_dir(temp_dir.path(), ".html").unwrap();

        assert_eq!(
            names(&files),
            vec![
                "account/deep/nested/profile.html",
                "account/settings.html",
                "home.html",
            ]
        );
    }

    #[test]
    fn test_discover_sorted_order() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "b/home.html");
        create_file(temp_dir.path(), "a/home.html");
        create_file(temp_dir.path(), "c.html");

        let files = walk_template_dir(temp_dir.path(), ".html").unwrap();

        assert_eq!(names(&files), vec!["a/home.html", "b/home.html", "c.html"]);
        assert_eq!(files[0].name, "home.html");
        assert_eq!(files[1].name, "home.html");
    }

    #[test]
    fn test_discover_empty_root() {
        let temp_dir = TempDir::new().unwrap();
        let files = discover(temp_dir.path(), ".html").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = discover(&missing, ".html").unwrap_err();
        assert_eq!(err.path, missing);
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_discover_root_is_file() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "page.html");

        let result = discover(&temp_dir.path().join("page.html"), ".html");
        assert!(result.is_err());
    }

    #[test]
    fn test_template_file_names() {
        let root = Path::new("/app/templates");
        let file = TemplateFile::new("/app/templates/partials/nav.html", root);

        assert_eq!(file.name, "nav.html");
        assert_eq!(file.relative_name, "partials/nav.html");
        assert_eq!(file.path, PathBuf::from("/app/templates/partials/nav.html"));
    }
}
