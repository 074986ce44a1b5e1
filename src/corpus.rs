//! Facilities for discovering source files eligible for dataset construction.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{FimError, Result};

/// Programming language inferred from a source file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Files ending in `.py`.
    Python,
    /// Files ending in `.java`.
    Java,
    /// Files ending in `.c`.
    C,
}

impl Language {
    /// Infers the language from a path's extension; unrecognised extensions yield `None`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Some(Self::Python),
            Some("java") => Some(Self::Java),
            Some("c") => Some(Self::C),
            _ => None,
        }
    }

    /// Returns the lowercase tag used in persisted datasets.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::C => "c",
        }
    }
}

/// A discovered source file together with its inferred language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Filesystem path of the file.
    pub path: PathBuf,
    /// Language inferred from the file extension.
    pub language: Language,
}

/// Recursively discovers eligible source files under `root`.
///
/// Only files whose extension maps to a [`Language`] are returned.  Results are
/// sorted by path so that a seeded builder run is reproducible regardless of
/// directory iteration order.
pub fn collect_source_files<P: AsRef<Path>>(root: P) -> Result<Vec<SourceFile>> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(FimError::InvalidConfig(format!(
            "input path {root:?} does not exist"
        )));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|err| FimError::Internal(err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(language) = Language::from_path(entry.path()) {
            files.push(SourceFile {
                path: entry.path().to_path_buf(),
                language,
            });
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Reads a source file to a string, attaching the path to any IO error.
pub fn read_source_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| FimError::io(err, Some(path.to_path_buf())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collect_source_files_filters_by_extension() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("create nested directory");
        fs::write(dir.path().join("a.py"), "print(1)\n").expect("write a.py");
        fs::write(nested.join("b.java"), "class B {}\n").expect("write b.java");
        fs::write(nested.join("c.c"), "int main() {}\n").expect("write c.c");
        fs::write(dir.path().join("notes.txt"), "ignored\n").expect("write notes.txt");

        let files = collect_source_files(dir.path()).expect("collect");
        assert_eq!(files.len(), 3);
        let languages: Vec<Language> = files.iter().map(|f| f.language).collect();
        assert!(languages.contains(&Language::Python));
        assert!(languages.contains(&Language::Java));
        assert!(languages.contains(&Language::C));
    }

    #[test]
    fn collect_source_files_is_sorted() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("z.py"), "z = 1\n").expect("write z.py");
        fs::write(dir.path().join("a.py"), "a = 1\n").expect("write a.py");

        let files = collect_source_files(dir.path()).expect("collect");
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.py", "z.py"]);
    }

    #[test]
    fn collect_source_files_rejects_missing_root() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        let err = collect_source_files(&missing).expect_err("should fail");
        assert!(matches!(err, FimError::InvalidConfig(_)));
    }

    #[test]
    fn language_round_trips_extension() {
        assert_eq!(Language::from_path(Path::new("x.py")), Some(Language::Python));
        assert_eq!(Language::from_path(Path::new("x.java")), Some(Language::Java));
        assert_eq!(Language::from_path(Path::new("x.c")), Some(Language::C));
        assert_eq!(Language::from_path(Path::new("x.rs")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }
}
