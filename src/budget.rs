//! # Token budget
//!
//! A model accepts a limited number of tokens, its context window, for the prompt and the completion together. The
//! [TokenBudgetChecker] counts the tokens of a prompt with a real tokenizer and tells how many tokens are left for the
//! completion, so an over-long prompt is rejected before it is sent instead of failing on the remote side.
//!
//! A prompt that fills the window exactly is rejected as well, since no token is left to generate.

use std::num::NonZeroUsize;

use log::debug;
use thiserror::Error;

use crate::prompt::errors::InvalidSpec;
use crate::prompt::{PromptBuilder, PromptSpec};
use crate::utils::token::CountToken;

/// The outcome of an accepted budget check. `remaining` is always `max_window - prompt_tokens` and never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[readonly::make]
pub struct BudgetResult {
    pub prompt_tokens: usize,
    pub max_window: usize,
    pub remaining: usize,
}

impl BudgetResult {
    /// Bound a requested completion length by the remaining budget. `None` asks for the whole remaining budget.
    pub fn completion_tokens(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.remaining, |requested| requested.min(self.remaining))
    }
}

/// Errors of budget checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error(transparent)]
    InvalidSpec(#[from] InvalidSpec),

    #[error("BudgetExceeded: the prompt takes {prompt_tokens} tokens of a {max_window} token context window, leaving no room for a completion")]
    BudgetExceeded { prompt_tokens: usize, max_window: usize },

    #[error("InsufficientBudget: the prompt takes {prompt_tokens} tokens of a {max_window} token context window, fewer than {min_completion} tokens are left for the completion")]
    InsufficientBudget { prompt_tokens: usize, max_window: usize, min_completion: usize },
}

/// Checks prompts against the context window of one model.
///
/// The counter must use the encoding of that model, otherwise the counts differ from the remote accounting.
#[derive(Debug, Clone)]
pub struct TokenBudgetChecker<'a, C: CountToken> {
    counter: &'a C,
    max_window: NonZeroUsize,
}

impl<'a, C: CountToken> TokenBudgetChecker<'a, C> {
    pub fn new(counter: &'a C, max_window: NonZeroUsize) -> Self {
        Self { counter, max_window }
    }

    pub fn max_window(&self) -> usize {
        self.max_window.get()
    }

    /// Count the prompt tokens and derive the remaining completion budget.
    /// Returns an error if the prompt alone meets or exceeds the context window.
    pub fn check(&self, prompt: &str) -> Result<BudgetResult, BudgetError> {
        let prompt_tokens = self.counter.count_token(prompt);
        self.check_count(prompt_tokens)
    }

    /// Same as [TokenBudgetChecker::check] for an already known token count.
    pub fn check_count(&self, prompt_tokens: usize) -> Result<BudgetResult, BudgetError> {
        let max_window = self.max_window();
        if prompt_tokens >= max_window {
            debug!("prompt of {} tokens rejected, context window is {}", prompt_tokens, max_window);
            return Err(BudgetError::BudgetExceeded { prompt_tokens, max_window });
        }
        let remaining = max_window - prompt_tokens;
        debug!("prompt of {} tokens accepted, {} of {} tokens remain", prompt_tokens, remaining, max_window);
        Ok(BudgetResult {
            prompt_tokens,
            max_window,
            remaining,
        })
    }

    /// Build the prompt of `spec` and check it. An empty spec fails before any token is counted.
    pub fn check_spec(&self, builder: &PromptBuilder, spec: &PromptSpec) -> Result<(String, BudgetResult), BudgetError> {
        let prompt = builder.build(spec)?;
        let budget = self.check(&prompt)?;
        Ok((prompt, budget))
    }

    /// Keep the longest prefix of the contexts of `spec` whose prompt leaves at least `min_completion` tokens, dropping
    /// contexts from the end. Returns the trimmed spec with its prompt and budget.
    /// Returns an error if the prompt does not leave that much room even without any context.
    pub fn fit_contexts(&self,
                        builder: &PromptBuilder,
                        spec: &PromptSpec,
                        min_completion: usize) -> Result<(PromptSpec, String, BudgetResult), BudgetError> {
        let needed = min_completion.max(1);
        let max_window = self.max_window();
        let mut candidate = spec.clone();
        loop {
            let prompt = builder.build(&candidate)?;
            let prompt_tokens = self.counter.count_token(&prompt);
            if max_window.checked_sub(prompt_tokens).map_or(false, |left| left >= needed) {
                if candidate.contexts.len() < spec.contexts.len() {
                    debug!("kept {} of {} contexts to leave {} completion tokens",
                        candidate.contexts.len(), spec.contexts.len(), needed);
                }
                let budget = self.check_count(prompt_tokens)?;
                return Ok((candidate, prompt, budget));
            }
            if candidate.contexts.pop().is_none() {
                return if prompt_tokens >= max_window {
                    Err(BudgetError::BudgetExceeded { prompt_tokens, max_window })
                } else {
                    Err(BudgetError::InsufficientBudget { prompt_tokens, max_window, min_completion: needed })
                };
            }
        }
    }
}
