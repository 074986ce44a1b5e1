//! Fill-in-the-middle (FIM) dataset builder and evaluation harness.
//!
//! The crate exposes both a library API and a `fimbench` command line
//! interface.  A typical run builds a completion dataset from a tree of
//! Python/Java/C source files, tokenizes it with a Hugging Face tokenizer,
//! and scores a causal language model's greedy completions against the true
//! middles using exact match, chrF, Levenshtein distance, embedding cosine
//! similarity, and an approximate n-gram-precision score.
//!
//! ```no_run
//! use fimbench::{DatasetBuilder, SplitConfig};
//!
//! # fn main() -> fimbench::Result<()> {
//! let cfg = SplitConfig::builder()
//!     .examples_per_file(4)
//!     .seed(Some(42))
//!     .build()?;
//! let examples = DatasetBuilder::new(cfg)?.build("/path/to/sources")?;
//! fimbench::dataset::save_examples(&examples, "dataset.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting
//! the library portion only can disable default features to avoid the CLI
//! dependencies: `fimbench = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod model;
pub mod splitter;
pub mod tokenize;

pub use config::{GenerationConfig, SplitBuilder, SplitConfig, TokenizeConfig};
pub use dataset::{CompletionExample, DatasetBuilder, TokenizedExample};
pub use error::{FimError, Result};
pub use harness::{InferenceResult, InferenceRunner};
pub use metrics::ExampleMetrics;
pub use model::{CausalModel, HttpModel};
pub use tokenize::{HfTokenizer, TokenCodec, TokenId};
