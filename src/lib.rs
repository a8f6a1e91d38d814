//! # promptwise
//!
//! Prompt assembly and token-budget checks for text-completion LLM APIs
//!
//! ## Usage
//! ```toml
//! promptwise = { path = "../promptwise" }
//! ```
//!
//! ## Concepts and Design
//! `promptwise` is data-driven: a prompt is a plain value built from plain values, every step is a function of its
//! inputs and nothing is configured globally. The API hierarchy is kept flat so users can track every step that
//! composes a prompt.
//!
//! ### Prompt
//!
//! A prompt has up to four parts, always in this order:
//!
//! * **instructions**, telling the model what to do;
//! * **contexts**, external information the model should answer from;
//! * **query**, the input of the user;
//! * **output indicator**, marking where the generation begins, e.g. `Answer:`.
//!
//! They live in a [`PromptSpec`](crate::prompt::PromptSpec) and a [`PromptBuilder`](crate::prompt::PromptBuilder)
//! turns them into text, separating the contexts with distinctive delimiters (`###` around the section, `##` between
//! contexts). The same spec always gives the same text.
//!
//! ### Tokens and the context window
//!
//! A model accepts a limited number of tokens for the prompt and the completion together. Tokens are counted by the
//! tokenizer of the model (see [`CountToken`](crate::utils::token::CountToken) and
//! [`Tiktoken`](crate::utils::token::tiktoken::Tiktoken)), never estimated from characters or words.
//!
//! A [`TokenBudgetChecker`](crate::budget::TokenBudgetChecker) tells how many tokens are left for the completion and
//! rejects a prompt that leaves none, before anything is sent:
//!
//! ```
//! use std::num::NonZeroUsize;
//! use promptwise::budget::TokenBudgetChecker;
//! use promptwise::prompt::{PromptBuilder, PromptSpec};
//! use promptwise::utils::token::tiktoken::{Encoding, Tiktoken};
//!
//! let spec = PromptSpec::new()
//!     .instructions("Answer the question based on the context below.")
//!     .context("Cats are mammals.")
//!     .query("What are cats?")
//!     .output_indicator("Answer:");
//! let prompt = PromptBuilder::new().build(&spec).unwrap();
//!
//! let tokenizer = Tiktoken::new(Encoding::P50kBase).unwrap();
//! let checker = TokenBudgetChecker::new(&tokenizer, NonZeroUsize::new(4097).unwrap());
//! let budget = checker.check(&prompt).unwrap();
//! assert_eq!(4097 - budget.prompt_tokens, budget.remaining);
//! ```
//!
//! The encoding must match the model: `p50k_base` for `text-davinci-003`, `cl100k_base` for `text-embedding-ada-002`
//! and chat models. A wrong encoding does not fail, it silently gives counts that differ from the API's.
//!
//! ### Endpoint or LLM
//!
//! The endpoint of the `PromptSpec -> prompt -> budget` pipeline is an LLM. A
//! [`Completer`](crate::utils::llm::Completer) runs the pipeline and sends the prompt through a
//! [`CompletionEndpoint`](crate::utils::llm::CompletionEndpoint) with a per-call
//! [`CompletionConfig`](crate::config::CompletionConfig). Errors of the remote API are handed back unmodified and
//! never retried.
//!
//! ## Attribution
//! * `tiktoken-rs`: [crate::utils::token::tiktoken] wraps the encodings of this crate.
//! * `async-openai`: [crate::utils::llm::openai] sends completions through this crate.


pub mod prompt;
pub mod template;
pub mod few_shot;
pub mod budget;
pub mod config;
pub mod utils;
