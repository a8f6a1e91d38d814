//! # Completion endpoints
//!
//! The endpoint of the `PromptSpec -> prompt -> budget check` pipeline is an LLM, which consumes a prompt and produces
//! a completion. [CompletionEndpoint] is the seam to the remote API, [Completer] runs the whole pipeline: a prompt
//! that does not fit the context window of the model is rejected locally and never sent.
//!
//! No retry is done here. Whatever the endpoint reports is handed back as [CompletionError::RemoteRejection].

use std::error::Error;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::budget::{BudgetError, BudgetResult, TokenBudgetChecker};
use crate::config::{CompletionConfig, ConfigError};
use crate::prompt::{PromptBuilder, PromptSpec};
use crate::utils::token::CountToken;

pub mod openai;

/// What is sent to a completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// A remote text-completion API.
#[async_trait]
pub trait CompletionEndpoint: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    /// Send the request and return the generated text.
    async fn create_completion(&self, request: CompletionRequest) -> Result<String, Self::Error>;
}

/// Errors of [Completer::complete]. Everything but `RemoteRejection` happens before any request is sent.
#[derive(Debug, Error)]
pub enum CompletionError<E: Error + 'static> {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error("RemoteRejection: {0}")]
    RemoteRejection(#[source] E),
}

/// A completion together with the budget it was requested under.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub prompt: String,
    pub budget: BudgetResult,
    pub max_tokens: usize,
}

/// Builds, checks and sends prompts.
///
/// The counter must use the encoding of the models it is used with, see [ModelProfile::tokenizer](crate::config::ModelProfile::tokenizer).
/// A counter that reports its encoding is checked against the profile of every call.
#[derive(Debug, Clone)]
pub struct Completer<E: CompletionEndpoint, C: CountToken> {
    pub endpoint: E,
    pub counter: C,
    pub builder: PromptBuilder,
}

impl<E: CompletionEndpoint, C: CountToken> Completer<E, C> {
    pub fn new(endpoint: E, counter: C) -> Self {
        Self::with_builder(endpoint, counter, PromptBuilder::new())
    }

    pub fn with_builder(endpoint: E, counter: C, builder: PromptBuilder) -> Self {
        Self {
            endpoint,
            counter,
            builder,
        }
    }

    /// Validate the config, build the prompt, check it against the context window, then send it.
    ///
    /// When `config.max_tokens` is unset, the whole remaining budget is requested. A configured value above the
    /// remaining budget is sent as is, and the endpoint may reject it.
    pub async fn complete(&self, config: &CompletionConfig, spec: &PromptSpec) -> Result<Completion, CompletionError<E::Error>> {
        let (request, budget) = self.prepare_with_budget(config, spec)?;
        let max_tokens = request.max_tokens;
        let prompt = request.prompt.clone();
        let text = self.endpoint
            .create_completion(request)
            .await
            .map_err(CompletionError::RemoteRejection)?;
        Ok(Completion {
            text,
            prompt,
            budget,
            max_tokens,
        })
    }

    /// Everything [Completer::complete] does before sending: returns the request that would be sent.
    pub fn prepare(&self, config: &CompletionConfig, spec: &PromptSpec) -> Result<CompletionRequest, CompletionError<E::Error>> {
        self.prepare_with_budget(config, spec).map(|(request, _)| request)
    }

    fn prepare_with_budget(&self, config: &CompletionConfig, spec: &PromptSpec) -> Result<(CompletionRequest, BudgetResult), CompletionError<E::Error>> {
        config.validate()?;
        if let Some(actual) = self.counter.encoding() {
            if actual != config.profile.encoding {
                return Err(ConfigError::EncodingMismatch {
                    model: config.profile.model.clone(),
                    expected: config.profile.encoding,
                    actual,
                }.into());
            }
        }
        let checker = TokenBudgetChecker::new(&self.counter, config.profile.max_window);
        let (prompt, budget) = checker.check_spec(&self.builder, spec)?;
        let max_tokens = match config.max_tokens {
            Some(max_tokens) => {
                if max_tokens > budget.remaining {
                    warn!("max_tokens = {} exceeds the {} tokens left by a {} token prompt in the {} token window of {}, \
                    the endpoint may reject the request",
                        max_tokens, budget.remaining, budget.prompt_tokens, budget.max_window, config.profile.model);
                }
                max_tokens
            }
            None => budget.completion_tokens(None),
        };
        debug!("completion request for {}: {} prompt tokens, max_tokens = {}, temperature = {}",
            config.profile.model, budget.prompt_tokens, max_tokens, config.temperature);
        let request = CompletionRequest {
            model: config.profile.model.clone(),
            prompt,
            max_tokens,
            temperature: config.temperature,
        };
        Ok((request, budget))
    }
}

#[cfg(test)]
mod test_completer {
    use std::num::NonZeroUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::future::join_all;
    use thiserror::Error;

    use super::{Completer, CompletionEndpoint, CompletionError, CompletionRequest};
    use crate::budget::BudgetError;
    use crate::config::{CompletionConfig, ConfigError, ModelProfile};
    use crate::prompt::errors::InvalidSpec;
    use crate::prompt::PromptSpec;
    use crate::utils::token::test_token::whitespace_tokens;
    use crate::utils::token::tiktoken::{Encoding, Tiktoken};

    #[derive(Debug, Error, PartialEq)]
    #[error("context_length_exceeded: {0}")]
    struct ContextLengthExceeded(String);

    /// Echoes the prompt back, or rejects requests asking for more than `window` tokens in total.
    #[derive(Default)]
    struct MockEndpoint {
        window: usize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionEndpoint for MockEndpoint {
        type Error = ContextLengthExceeded;

        async fn create_completion(&self, request: CompletionRequest) -> Result<String, Self::Error> {
            self.requests.lock().unwrap().push(request.clone());
            let prompt_tokens = whitespace_tokens(&request.prompt).len();
            if prompt_tokens + request.max_tokens > self.window {
                Err(ContextLengthExceeded(format!("{} + {} > {}", prompt_tokens, request.max_tokens, self.window)))
            } else {
                Ok(format!("echo: {}", request.prompt.lines().last().unwrap_or_default()))
            }
        }
    }

    fn config(window: usize) -> CompletionConfig {
        CompletionConfig::new(ModelProfile::new("mock-davinci", Encoding::P50kBase, NonZeroUsize::new(window).unwrap()))
    }

    fn completer(window: usize) -> Completer<MockEndpoint, fn(&str) -> Vec<usize>> {
        let endpoint = MockEndpoint { window, ..MockEndpoint::default() };
        Completer::new(endpoint, whitespace_tokens as fn(&str) -> Vec<usize>)
    }

    fn cats() -> PromptSpec {
        PromptSpec::new()
            .instructions("Answer using context.")
            .context("Cats are mammals.")
            .query("What are cats?")
            .output_indicator("Answer:")
    }

    #[tokio::test]
    async fn test_complete_spends_remaining_budget() {
        let completer = completer(100);
        let completion = completer.complete(&config(100), &cats()).await.unwrap();
        // Answer using context. / ### / Contexts: / Cats are mammals. / ### / Question: What are cats? / Answer:
        assert_eq!(3 + 1 + 1 + 3 + 1 + 4 + 1, completion.budget.prompt_tokens);
        assert_eq!(100 - 14, completion.max_tokens);
        assert_eq!("echo: Answer:", completion.text);

        let requests = completer.endpoint.requests.lock().unwrap();
        assert_eq!(1, requests.len());
        assert_eq!("mock-davinci", requests[0].model);
        assert_eq!(completion.prompt, requests[0].prompt);
        assert_eq!(0.0, requests[0].temperature);
    }

    #[tokio::test]
    async fn test_over_long_prompt_is_not_sent() {
        let completer = completer(14);
        let error = completer.complete(&config(14), &cats()).await.unwrap_err();
        assert!(matches!(error, CompletionError::Budget(BudgetError::BudgetExceeded { prompt_tokens: 14, max_window: 14 })));
        assert!(completer.endpoint.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_inputs_are_not_sent() {
        let completer = completer(100);
        let error = completer.complete(&config(100), &PromptSpec::new()).await.unwrap_err();
        assert!(matches!(error, CompletionError::Budget(BudgetError::InvalidSpec(InvalidSpec))));

        let error = completer.complete(&config(100).with_temperature(1.5), &cats()).await.unwrap_err();
        assert!(matches!(error, CompletionError::InvalidConfig(ConfigError::InvalidTemperature(_))));
        assert!(completer.endpoint.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counter_must_match_profile_encoding() {
        let endpoint = MockEndpoint { window: 100, ..MockEndpoint::default() };
        let completer = Completer::new(endpoint, Tiktoken::new(Encoding::Cl100kBase).unwrap());
        let error = completer.complete(&config(100), &cats()).await.unwrap_err();
        match error {
            CompletionError::InvalidConfig(ConfigError::EncodingMismatch { model, expected, actual }) => {
                assert_eq!("mock-davinci", model);
                assert_eq!(Encoding::P50kBase, expected);
                assert_eq!(Encoding::Cl100kBase, actual);
            }
            other => panic!("expected an encoding mismatch, got {:?}", other),
        }
        assert!(completer.endpoint.requests.lock().unwrap().is_empty());

        let profile = ModelProfile::new("mock-turbo", Encoding::Cl100kBase, NonZeroUsize::new(100).unwrap());
        let request = completer.prepare(&CompletionConfig::new(profile), &cats()).unwrap();
        assert_eq!("mock-turbo", request.model);
    }

    #[tokio::test]
    async fn test_remote_rejection_is_passed_through() {
        // the local window is misconfigured above the remote one
        let completer = completer(50);
        let error = completer.complete(&config(100).with_max_tokens(64), &cats()).await.unwrap_err();
        match error {
            CompletionError::RemoteRejection(remote) => assert_eq!(ContextLengthExceeded("14 + 64 > 50".to_string()), remote),
            other => panic!("expected a remote rejection, got {:?}", other),
        }
        assert_eq!(1, completer.endpoint.requests.lock().unwrap().len());
    }

    #[tokio::test]
    async fn test_prepare_keeps_configured_max_tokens() {
        let completer = completer(100);
        let request = completer.prepare(&config(100).with_max_tokens(500).with_temperature(0.7), &cats()).unwrap();
        assert_eq!(500, request.max_tokens);
        assert_eq!(0.7, request.temperature);
        assert!(completer.endpoint.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_completions() {
        let completer = completer(100);
        let config = config(100);
        let specs: Vec<PromptSpec> = (0..8).map(|i| cats().query(format!("What are cats, take {}?", i))).collect();
        let completions = join_all(specs.iter().map(|spec| completer.complete(&config, spec))).await;
        for (i, completion) in completions.into_iter().enumerate() {
            let completion = completion.unwrap();
            assert!(completion.prompt.contains(&format!("take {}?", i)));
            assert_eq!(completion.budget.max_window - completion.budget.prompt_tokens, completion.budget.remaining);
        }
        assert_eq!(8, completer.endpoint.requests.lock().unwrap().len());
    }
}
