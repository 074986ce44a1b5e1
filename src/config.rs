//! Configuration builders controlling dataset splitting, tokenization, and generation.

use serde::{Deserialize, Serialize};

use crate::error::{FimError, Result};

/// Configuration for the fill-in-the-middle splitter and dataset builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitConfig {
    /// Minimum prefix length (in characters) required for an example to be accepted.
    pub min_prefix_length: usize,
    /// Minimum suffix length (in characters) required for an example to be accepted.
    pub min_suffix_length: usize,
    /// Upper bound on the number of additional lines consumed into the middle section.
    pub max_middle_lines: usize,
    /// Number of independent split attempts made per source file.
    pub examples_per_file: usize,
    /// RNG seed; `None` draws entropy from the OS at build time.
    pub seed: Option<u64>,
}

impl SplitConfig {
    /// Returns a builder initialised with [`SplitConfig::default`].
    #[must_use]
    pub fn builder() -> SplitBuilder {
        SplitBuilder::default()
    }

    /// Validates the invariants required for splitting.
    pub fn validate(&self) -> Result<()> {
        if self.max_middle_lines == 0 {
            return Err(FimError::InvalidConfig(
                "max_middle_lines must be greater than zero".into(),
            ));
        }
        if self.examples_per_file == 0 {
            return Err(FimError::InvalidConfig(
                "examples_per_file must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            min_prefix_length: 50,
            min_suffix_length: 0,
            max_middle_lines: 5,
            examples_per_file: 4,
            seed: None,
        }
    }
}

/// Builder for [`SplitConfig`].
#[derive(Debug, Default, Clone)]
pub struct SplitBuilder {
    cfg: SplitConfig,
}

impl SplitBuilder {
    /// Creates a builder with [`SplitConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum accepted prefix length in characters.
    #[must_use]
    pub fn min_prefix_length(mut self, value: usize) -> Self {
        self.cfg.min_prefix_length = value;
        self
    }

    /// Sets the minimum accepted suffix length in characters.
    #[must_use]
    pub fn min_suffix_length(mut self, value: usize) -> Self {
        self.cfg.min_suffix_length = value;
        self
    }

    /// Sets the upper bound on additional lines pulled into the middle section.
    #[must_use]
    pub fn max_middle_lines(mut self, value: usize) -> Self {
        self.cfg.max_middle_lines = value;
        self
    }

    /// Sets the number of split attempts per source file.
    #[must_use]
    pub fn examples_per_file(mut self, value: usize) -> Self {
        self.cfg.examples_per_file = value;
        self
    }

    /// Seeds the sampler for reproducible output.
    #[must_use]
    pub fn seed(mut self, value: Option<u64>) -> Self {
        self.cfg.seed = value;
        self
    }

    /// Finalises the builder, returning a validated [`SplitConfig`].
    pub fn build(self) -> Result<SplitConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration for per-field subword tokenization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenizeConfig {
    /// Maximum token-id sequence length per field; longer sequences are truncated.
    pub max_tokens: usize,
}

impl TokenizeConfig {
    /// Validates the invariants required for tokenization.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(FimError::InvalidConfig(
                "max_tokens must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TokenizeConfig {
    fn default() -> Self {
        Self { max_tokens: 1024 }
    }
}

/// Configuration for greedy continuation generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Maximum total sequence length (prompt plus continuation) produced by the model.
    pub max_length: usize,
}

impl GenerationConfig {
    /// Validates the invariants required for generation.
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(FimError::InvalidConfig(
                "max_length must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_length: 200 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let cfg = SplitConfig::builder()
            .min_prefix_length(10)
            .min_suffix_length(5)
            .examples_per_file(2)
            .seed(Some(7))
            .build()
            .expect("config should be valid");
        assert_eq!(cfg.min_prefix_length, 10);
        assert_eq!(cfg.min_suffix_length, 5);
        assert_eq!(cfg.examples_per_file, 2);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.max_middle_lines, 5);
    }

    #[test]
    fn validate_rejects_zero_middle_lines() {
        let cfg = SplitConfig {
            max_middle_lines: 0,
            ..SplitConfig::default()
        };
        let err = cfg.validate().expect_err("validation should fail");
        assert!(matches!(
            err,
            FimError::InvalidConfig(message) if message.contains("max_middle_lines")
        ));
    }

    #[test]
    fn validate_rejects_zero_max_tokens() {
        let cfg = TokenizeConfig { max_tokens: 0 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn generation_defaults_are_valid() {
        let cfg = GenerationConfig::default();
        cfg.validate().expect("defaults should validate");
        assert_eq!(cfg.max_length, 200);
    }
}
