//! Completion example data model, the dataset builder driver, and JSON persistence.

use std::fs;
use std::path::Path;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::SplitConfig;
use crate::corpus::{collect_source_files, read_source_file};
use crate::error::{FimError, Result};
use crate::splitter::split_example;
use crate::tokenize::TokenId;

/// A single fill-in-the-middle completion example carved from a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionExample {
    /// Text before the sampled cursor.
    pub prefix: String,
    /// The masked span the model must predict.
    pub middle: String,
    /// Text after the consumed middle region.
    pub suffix: String,
    /// Language tag of the originating file (`python`, `java`, or `c`).
    pub language: String,
}

/// A [`CompletionExample`] with each field replaced by its token-id sequence.
///
/// The language tag is carried through so the evaluation report can group
/// results per language without re-reading the untokenized dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenizedExample {
    /// Token ids of the prefix, truncated to the configured maximum.
    pub prefix: Vec<TokenId>,
    /// Token ids of the true middle.
    pub middle: Vec<TokenId>,
    /// Token ids of the suffix.
    pub suffix: Vec<TokenId>,
    /// Language tag propagated from the completion example.
    #[serde(default)]
    pub language: String,
}

/// Drives the splitter over a directory tree of source files.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    cfg: SplitConfig,
}

impl DatasetBuilder {
    /// Creates a builder for the supplied, validated configuration.
    pub fn new(cfg: SplitConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &SplitConfig {
        &self.cfg
    }

    /// Builds a dataset from `root` using an RNG seeded from the configuration.
    ///
    /// A `None` seed draws entropy from the OS, making the sampled cursor
    /// positions unreproducible across runs.
    pub fn build<P: AsRef<Path>>(&self, root: P) -> Result<Vec<CompletionExample>> {
        let mut rng = match self.cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.build_with_rng(root, &mut rng)
    }

    /// Builds a dataset from `root` with an explicitly supplied RNG.
    ///
    /// Every discovered file receives `examples_per_file` independent split
    /// attempts; a file may contribute anywhere from zero to that many
    /// examples depending on per-attempt length checks.  A file that cannot
    /// be read is logged and skipped rather than aborting the run.
    pub fn build_with_rng<P: AsRef<Path>, R: Rng + ?Sized>(
        &self,
        root: P,
        rng: &mut R,
    ) -> Result<Vec<CompletionExample>> {
        let files = collect_source_files(root)?;
        let mut examples = Vec::new();
        for file in &files {
            let text = match read_source_file(&file.path) {
                Ok(text) => text,
                Err(err) => {
                    warn!("skipping unreadable file {:?}: {err}", file.path);
                    continue;
                }
            };
            for _ in 0..self.cfg.examples_per_file {
                if let Some(parts) = split_example(&text, &self.cfg, rng) {
                    examples.push(CompletionExample {
                        prefix: parts.prefix,
                        middle: parts.middle,
                        suffix: parts.suffix,
                        language: file.language.as_str().to_owned(),
                    });
                }
            }
        }
        info!(
            "generated {} completion examples from {} source files",
            examples.len(),
            files.len()
        );
        Ok(examples)
    }
}

fn write_json<T: Serialize, P: AsRef<Path>>(values: &[T], path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(values)?;
    fs::write(path.as_ref(), json)
        .map_err(|err| FimError::io(err, Some(path.as_ref().to_path_buf())))
}

fn read_json<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let data = fs::read_to_string(path.as_ref())
        .map_err(|err| FimError::io(err, Some(path.as_ref().to_path_buf())))?;
    Ok(serde_json::from_str(&data)?)
}

/// Persists completion examples as a pretty-printed JSON array.
pub fn save_examples<P: AsRef<Path>>(examples: &[CompletionExample], path: P) -> Result<()> {
    write_json(examples, path)
}

/// Loads a completion example dataset; missing files and malformed JSON are fatal.
pub fn load_examples<P: AsRef<Path>>(path: P) -> Result<Vec<CompletionExample>> {
    read_json(path)
}

/// Persists tokenized examples as a pretty-printed JSON array.
pub fn save_tokenized<P: AsRef<Path>>(examples: &[TokenizedExample], path: P) -> Result<()> {
    write_json(examples, path)
}

/// Loads a tokenized dataset; missing files and malformed JSON are fatal.
pub fn load_tokenized<P: AsRef<Path>>(path: P) -> Result<Vec<TokenizedExample>> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const PY_SOURCE: &str = "def fib(n):\n    if n < 2:\n        return n\n    return fib(n - 1) + fib(n - 2)\n\nprint(fib(10))\n";

    fn builder(examples_per_file: usize, seed: u64) -> DatasetBuilder {
        let cfg = SplitConfig::builder()
            .min_prefix_length(10)
            .examples_per_file(examples_per_file)
            .seed(Some(seed))
            .build()
            .expect("valid config");
        DatasetBuilder::new(cfg).expect("valid builder")
    }

    #[test]
    fn build_annotates_language_and_respects_minima() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("fib.py"), PY_SOURCE).expect("write fib.py");

        let examples = builder(4, 3).build(dir.path()).expect("build");
        assert!(examples.len() <= 4);
        for example in &examples {
            assert_eq!(example.language, "python");
            assert!(example.prefix.chars().count() >= 10);
            assert!(!example.middle.is_empty());
        }
    }

    #[test]
    fn build_attempts_each_file_independently() {
        // One file, four attempts: accepted count is between 0 and 4 and is
        // deterministic for a fixed seed.
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("fib.py"), PY_SOURCE).expect("write fib.py");

        let first = builder(4, 11).build(dir.path()).expect("first build");
        let second = builder(4, 11).build(dir.path()).expect("second build");
        assert!(first.len() <= 4);
        assert_eq!(first, second, "same seed must reproduce the same dataset");
    }

    #[test]
    fn build_skips_files_below_minimum_length() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("tiny.c"), "int x;\n").expect("write tiny.c");

        let examples = builder(4, 1).build(dir.path()).expect("build");
        assert!(examples.is_empty());
    }

    #[test]
    fn examples_round_trip_through_json() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("dataset.json");
        let examples = vec![CompletionExample {
            prefix: "def f(".into(),
            middle: "x):\n    return x\n".into(),
            suffix: "print(f(1))".into(),
            language: "python".into(),
        }];
        save_examples(&examples, &path).expect("save");
        let loaded = load_examples(&path).expect("load");
        assert_eq!(loaded, examples);
    }

    #[test]
    fn tokenized_round_trip_preserves_language() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tokenized.json");
        let examples = vec![TokenizedExample {
            prefix: vec![1, 2, 3],
            middle: vec![4],
            suffix: vec![],
            language: "java".into(),
        }];
        save_tokenized(&examples, &path).expect("save");
        let loaded = load_tokenized(&path).expect("load");
        assert_eq!(loaded, examples);
    }

    #[test]
    fn load_examples_rejects_malformed_json() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").expect("write broken file");
        let err = load_examples(&path).expect_err("should fail");
        assert!(matches!(err, FimError::Serialization(_)));
    }

    #[test]
    fn load_examples_surfaces_missing_file() {
        let dir = tempdir().expect("tempdir");
        let err = load_examples(dir.path().join("absent.json")).expect_err("should fail");
        assert!(matches!(err, FimError::Io { .. }));
    }
}
