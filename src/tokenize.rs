//! Subword tokenization of completion examples via the Hugging Face `tokenizers` crate.

use std::path::Path;

use tokenizers::Tokenizer;

use crate::config::TokenizeConfig;
use crate::dataset::{CompletionExample, TokenizedExample};
use crate::error::{FimError, Result};

/// Token identifier used throughout the crate.
pub type TokenId = u32;

/// Encode/decode seam between the pipeline and a concrete subword tokenizer.
///
/// The tokenizer is an external collaborator; keeping it behind a trait lets
/// tests substitute a fake vocabulary without loading a `tokenizer.json`.
pub trait TokenCodec {
    /// Encodes text into token identifiers without adding special tokens.
    fn encode(&self, text: &str) -> Result<Vec<TokenId>>;
    /// Decodes token identifiers back into text.
    fn decode(&self, tokens: &[TokenId], skip_special_tokens: bool) -> Result<String>;
}

/// Thin wrapper around a Hugging Face [`Tokenizer`].
#[derive(Debug, Clone)]
pub struct HfTokenizer {
    inner: Tokenizer,
}

impl HfTokenizer {
    /// Loads a tokenizer from a `tokenizer.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Tokenizer::from_file(path.as_ref())
            .map_err(|err| FimError::Tokenizers(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Wraps an already constructed tokenizer.
    #[must_use]
    pub fn from_tokenizer(inner: Tokenizer) -> Self {
        Self { inner }
    }

    /// Provides immutable access to the underlying tokenizer.
    #[must_use]
    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }
}

impl TokenCodec for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|err| FimError::Tokenizers(err.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, tokens: &[TokenId], skip_special_tokens: bool) -> Result<String> {
        self.inner
            .decode(tokens, skip_special_tokens)
            .map_err(|err| FimError::Tokenizers(err.to_string()))
    }
}

/// Tokenizes each field of a completion example independently, truncating to
/// `max_tokens` ids per field.  No cross-field joint encoding is performed.
pub fn tokenize_example<C: TokenCodec + ?Sized>(
    codec: &C,
    example: &CompletionExample,
    cfg: &TokenizeConfig,
) -> Result<TokenizedExample> {
    let encode_field = |text: &str| -> Result<Vec<TokenId>> {
        let mut ids = codec.encode(text)?;
        ids.truncate(cfg.max_tokens);
        Ok(ids)
    };
    Ok(TokenizedExample {
        prefix: encode_field(&example.prefix)?,
        middle: encode_field(&example.middle)?,
        suffix: encode_field(&example.suffix)?,
        language: example.language.clone(),
    })
}

/// Tokenizes a full dataset in input order; any tokenizer failure aborts the run.
pub fn tokenize_dataset<C: TokenCodec + ?Sized>(
    codec: &C,
    examples: &[CompletionExample],
    cfg: &TokenizeConfig,
) -> Result<Vec<TokenizedExample>> {
    cfg.validate()?;
    examples
        .iter()
        .map(|example| tokenize_example(codec, example, cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use tokenizers::models::bpe::BPE;

    /// Builds an in-memory character-level tokenizer over a tiny alphabet.
    fn char_tokenizer() -> HfTokenizer {
        let alphabet = "abcdefghijklmnopqrstuvwxyz (),.:=+-_\n";
        let vocab: HashMap<String, TokenId> = alphabet
            .chars()
            .enumerate()
            .map(|(idx, ch)| (ch.to_string(), idx as TokenId))
            .collect();
        let bpe = BPE::builder()
            .vocab_and_merges(vocab, Vec::new())
            .unk_token("a".into())
            .build()
            .expect("valid BPE model");
        HfTokenizer::from_tokenizer(Tokenizer::new(bpe))
    }

    fn sample(prefix: &str) -> CompletionExample {
        CompletionExample {
            prefix: prefix.to_owned(),
            middle: "return x".into(),
            suffix: "print(x)".into(),
            language: "python".into(),
        }
    }

    #[test]
    fn long_field_truncates_to_exactly_max_tokens() {
        let codec = char_tokenizer();
        let cfg = TokenizeConfig { max_tokens: 1024 };
        let example = sample(&"x".repeat(2000));
        let tokenized = tokenize_example(&codec, &example, &cfg).expect("tokenize");
        assert_eq!(tokenized.prefix.len(), 1024);
    }

    #[test]
    fn fields_are_encoded_independently() {
        let codec = char_tokenizer();
        let cfg = TokenizeConfig { max_tokens: 16 };
        let example = sample("def f(x):");
        let tokenized = tokenize_example(&codec, &example, &cfg).expect("tokenize");
        assert_eq!(tokenized.middle, codec.encode("return x").expect("encode"));
        assert_eq!(tokenized.suffix, codec.encode("print(x)").expect("encode"));
        assert_eq!(tokenized.language, "python");
    }

    #[test]
    fn tokenize_dataset_preserves_order() {
        let codec = char_tokenizer();
        let cfg = TokenizeConfig::default();
        let examples = vec![sample("first prefix"), sample("second prefix")];
        let tokenized = tokenize_dataset(&codec, &examples, &cfg).expect("tokenize");
        assert_eq!(tokenized.len(), 2);
        assert_eq!(
            tokenized[0].prefix,
            codec.encode("first prefix").expect("encode")
        );
    }

    #[test]
    fn tokenize_dataset_validates_config() {
        let codec = char_tokenizer();
        let cfg = TokenizeConfig { max_tokens: 0 };
        let err = tokenize_dataset(&codec, &[sample("p")], &cfg).expect_err("should fail");
        assert!(matches!(err, FimError::InvalidConfig(_)));
    }
}
