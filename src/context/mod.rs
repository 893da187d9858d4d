use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::session::FileContent;

#[derive(Debug, Error)]
pub enum FileContextError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a text file: {0}")]
    NotText(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read the files named by `@path` mentions, relative to `base_dir`.
///
/// Directories contribute every file beneath them in path order. The first
/// unreadable path fails the whole resolution.
pub fn resolve_file_context(
    paths: &[String],
    base_dir: &Path,
) -> Result<Vec<FileContent>, FileContextError> {
    let mut contents = Vec::new();

    for mention in paths {
        let path = base_dir.join(mention);
        if !path.exists() {
            return Err(FileContextError::NotFound(PathBuf::from(mention)));
        }

        if path.is_dir() {
            for entry in WalkDir::new(&path).sort_by_file_name() {
                let entry = entry.map_err(|e| FileContextError::Io {
                    path: path.clone(),
                    source: e.into(),
                })?;
                if entry.file_type().is_file() {
                    contents.push(read_text(entry.path(), base_dir)?);
                }
            }
        } else {
            contents.push(read_text(&path, base_dir)?);
        }
    }

    Ok(contents)
}

fn read_text(path: &Path, base_dir: &Path) -> Result<FileContent, FileContextError> {
    let display_path = path.strip_prefix(base_dir).unwrap_or(path).to_path_buf();
    let bytes = fs::read(path).map_err(|source| FileContextError::Io {
        path: display_path.clone(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|_| FileContextError::NotText(display_path.clone()))?;

    Ok(FileContent {
        path: display_path.to_string_lossy().to_string(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "# readme").unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/lib.rs"), "pub mod nested;").unwrap();
        fs::write(dir.path().join("src/nested/mod.rs"), "").unwrap();
        dir
    }

    #[test]
    fn test_resolves_single_file() {
        let dir = workspace();
        let files = resolve_file_context(&["README.md".to_string()], dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "README.md");
        assert_eq!(files[0].content, "# readme");
    }

    #[test]
    fn test_directory_is_walked_in_sorted_order() {
        let dir = workspace();
        let files = resolve_file_context(&["src".to_string()], dir.path()).unwrap();
        let paths: Vec<String> = files
            .iter()
            .map(|f| f.path.replace('\\', "/"))
            .collect();

        assert_eq!(paths, vec!["src/lib.rs", "src/main.rs", "src/nested/mod.rs"]);
    }

    #[test]
    fn test_missing_path_fails() {
        let dir = workspace();
        let err = resolve_file_context(
            &["README.md".to_string(), "nope.txt".to_string()],
            dir.path(),
        )
        .unwrap_err();

        assert!(matches!(err, FileContextError::NotFound(ref p) if p == Path::new("nope.txt")));
    }

    #[test]
    fn test_binary_file_is_not_text() {
        let dir = workspace();
        fs::write(dir.path().join("logo.png"), [0x89, 0x50, 0xff, 0xfe]).unwrap();

        let err = resolve_file_context(&["logo.png".to_string()], dir.path()).unwrap_err();

        assert!(matches!(err, FileContextError::NotText(_)));
    }
}
