use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::DoctestError;
use crate::literate::Dialect;

/// Finds the source files doctests can be run on.
#[derive(Debug)]
pub struct SourceDiscoverer;

impl SourceDiscoverer {
    /// Expands the given paths: files are kept as given, directories are
    /// walked recursively for `.sx` and `.sxl` files.
    ///
    /// Files found in directories are sorted so runs are deterministic.
    pub fn expand<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, DoctestError> {
        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                files.extend(Self::discover_source_files(path)?);
            } else {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    pub fn discover_source_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>, DoctestError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root.as_ref()) {
            let entry = entry.map_err(|e| {
                DoctestError::internal(format!("failed to walk {}: {e}", root.as_ref().display()))
            })?;
            if entry.file_type().is_file() && Self::is_source_file(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn is_source_file(path: &Path) -> bool {
        Dialect::infer(path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_directories_for_sources() {
        let root = std::env::temp_dir().join(format!("sx-doctest-discovery-{}", std::process::id()));
        fs::create_dir_all(root.join("nested")).unwrap();
        for name in ["b.sx", "nested/a.sxl", "notes.md"] {
            fs::write(root.join(name), "nil").unwrap();
        }

        let files = SourceDiscoverer::expand(&[&root]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|file| file.strip_prefix(&root).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["b.sx".to_string(), format!("nested{}a.sxl", std::path::MAIN_SEPARATOR)]);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn explicit_files_are_kept() {
        let files = SourceDiscoverer::expand(&["missing.txt"]).unwrap();
        assert_eq!(files, vec![PathBuf::from("missing.txt")]);
    }
}
