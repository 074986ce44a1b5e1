//! Causal language model collaborator used for generation and embeddings.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::error::{FimError, Result};
use crate::tokenize::TokenId;

/// Contract for the external causal language model.
///
/// `generate` performs greedy decoding and returns the full output sequence,
/// prompt tokens included.  `hidden_states` runs a plain forward pass and
/// returns the final hidden state for every input position, which callers
/// mean-pool into a sentence embedding.
pub trait CausalModel {
    /// Greedily generates a continuation of `prompt` up to `cfg.max_length` total tokens.
    fn generate(&self, prompt: &[TokenId], cfg: &GenerationConfig) -> Result<Vec<TokenId>>;
    /// Returns the final hidden-state sequence for `tokens` (one vector per position).
    fn hidden_states(&self, tokens: &[TokenId]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    tokens: &'a [TokenId],
    max_length: usize,
    greedy: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    tokens: Vec<TokenId>,
}

#[derive(Serialize)]
struct HiddenStatesRequest<'a> {
    tokens: &'a [TokenId],
}

#[derive(Deserialize)]
struct HiddenStatesResponse {
    hidden_states: Vec<Vec<f32>>,
}

/// Blocking HTTP client for a local inference sidecar.
///
/// The sidecar exposes two token-level JSON endpoints: `POST /generate` and
/// `POST /hidden_states`.  Calls are synchronous; a long generation simply
/// blocks the run.  Transport failures and non-success statuses abort the
/// whole run with [`FimError::Model`] — there are no retries.
pub struct HttpModel {
    agent: ureq::Agent,
    base_url: String,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(600)))
        .build()
        .new_agent()
}

impl HttpModel {
    /// Creates a client for the sidecar listening at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            agent: make_agent(),
            base_url,
        }
    }

    fn post<Req: Serialize, Resp: DeserializeOwned>(&self, route: &str, body: &Req) -> Result<Resp> {
        let url = format!("{}/{route}", self.base_url);
        let response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(|err| FimError::Model(format!("request to {url} failed: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.into_body().read_to_string().unwrap_or_default();
            return Err(FimError::Model(format!(
                "{url} returned {status}: {detail}"
            )));
        }
        response
            .into_body()
            .read_json()
            .map_err(|err| FimError::Model(format!("invalid response from {url}: {err}")))
    }
}

impl CausalModel for HttpModel {
    fn generate(&self, prompt: &[TokenId], cfg: &GenerationConfig) -> Result<Vec<TokenId>> {
        let request = GenerateRequest {
            tokens: prompt,
            max_length: cfg.max_length,
            greedy: true,
        };
        let response: GenerateResponse = self.post("generate", &request)?;
        Ok(response.tokens)
    }

    fn hidden_states(&self, tokens: &[TokenId]) -> Result<Vec<Vec<f32>>> {
        let request = HiddenStatesRequest { tokens };
        let response: HiddenStatesResponse = self.post("hidden_states", &request)?;
        Ok(response.hidden_states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let model = HttpModel::new("http://localhost:8800/");
        assert_eq!(model.base_url, "http://localhost:8800");
    }

    #[test]
    fn unreachable_sidecar_is_a_model_error() {
        // Port 1 is never bound in the test environment, so the connection
        // is refused immediately and the error mapping is exercised.
        let model = HttpModel::new("http://127.0.0.1:1");
        let err = model
            .generate(&[1, 2, 3], &GenerationConfig::default())
            .expect_err("no sidecar is listening");
        assert!(matches!(err, FimError::Model(_)));
    }
}
