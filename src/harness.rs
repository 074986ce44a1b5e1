//! Inference and evaluation harness scoring model completions against true middles.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::dataset::TokenizedExample;
use crate::error::{FimError, Result};
use crate::metrics::{
    chrf, cosine_similarity, exact_match, levenshtein, mean_pool, ngram_precision_score,
    ExampleMetrics,
};
use crate::model::CausalModel;
use crate::tokenize::TokenCodec;

/// Terminal report record for a single evaluated example.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceResult {
    /// Decoded prompt text fed to the model.
    pub input: String,
    /// Decoded continuation produced by the model (prompt tokens stripped).
    pub generated: String,
    /// Decoded reference middle the generation is scored against.
    pub true_middle: String,
    /// Language tag propagated from the dataset.
    pub language: String,
    /// Similarity scores comparing `generated` to `true_middle`.
    pub metrics: ExampleMetrics,
}

/// Runs greedy inference over a tokenized dataset and scores each generation.
///
/// Both collaborators are passed in explicitly so tests can substitute fakes;
/// any tokenizer or model failure aborts the whole run without partial
/// results.
#[derive(Debug)]
pub struct InferenceRunner<'a, C, M> {
    codec: &'a C,
    model: &'a M,
    generation: GenerationConfig,
}

impl<'a, C: TokenCodec, M: CausalModel> InferenceRunner<'a, C, M> {
    /// Creates a runner from the collaborators and a validated generation config.
    pub fn new(codec: &'a C, model: &'a M, generation: GenerationConfig) -> Result<Self> {
        generation.validate()?;
        Ok(Self {
            codec,
            model,
            generation,
        })
    }

    /// Evaluates every example in input order.
    pub fn run(&self, examples: &[TokenizedExample]) -> Result<Vec<InferenceResult>> {
        let mut results = Vec::with_capacity(examples.len());
        for (idx, entry) in examples.iter().enumerate() {
            let result = self.evaluate(entry)?;
            info!(
                "example {}/{}: exact_match={} chrf={:.2} levenshtein={} cosine={:.3} ngram={:.2}",
                idx + 1,
                examples.len(),
                result.metrics.exact_match,
                result.metrics.chrf,
                result.metrics.levenshtein_distance,
                result.metrics.cosine_similarity,
                result.metrics.codebleu,
            );
            results.push(result);
        }
        Ok(results)
    }

    /// Generates a continuation for one example and scores it.
    pub fn evaluate(&self, entry: &TokenizedExample) -> Result<InferenceResult> {
        let output = self.model.generate(&entry.prefix, &self.generation)?;
        let continuation = output.get(entry.prefix.len()..).unwrap_or(&[]);

        let input = self.codec.decode(&entry.prefix, true)?;
        let generated = self.codec.decode(continuation, true)?;
        let true_middle = self.codec.decode(&entry.middle, true)?;

        let metrics = ExampleMetrics {
            exact_match: exact_match(&generated, &true_middle),
            chrf: chrf(&generated, &true_middle),
            levenshtein_distance: levenshtein(&generated, &true_middle),
            cosine_similarity: self.embedding_similarity(&generated, &true_middle)?,
            codebleu: ngram_precision_score(&generated, &true_middle),
        };

        Ok(InferenceResult {
            input,
            generated,
            true_middle,
            language: entry.language.clone(),
            metrics,
        })
    }

    /// Cosine similarity of mean-pooled hidden-state embeddings of two texts.
    ///
    /// Returns `0.0` when either text tokenizes to nothing, since the model
    /// cannot embed an empty sequence.
    fn embedding_similarity(&self, generated: &str, reference: &str) -> Result<f32> {
        let generated_ids = self.codec.encode(generated)?;
        let reference_ids = self.codec.encode(reference)?;
        if generated_ids.is_empty() || reference_ids.is_empty() {
            return Ok(0.0);
        }
        let generated_embedding = mean_pool(&self.model.hidden_states(&generated_ids)?);
        let reference_embedding = mean_pool(&self.model.hidden_states(&reference_ids)?);
        Ok(cosine_similarity(&generated_embedding, &reference_embedding))
    }
}

/// Persists inference results as a pretty-printed JSON array.
pub fn save_results<P: AsRef<Path>>(results: &[InferenceResult], path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path.as_ref(), json)
        .map_err(|err| FimError::io(err, Some(path.as_ref().to_path_buf())))
}
