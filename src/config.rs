//! # Configuration
//!
//! Nothing here is global. A [ModelProfile] describes a model, a [CompletionConfig] is handed to every completion
//! call and [ApiCredentials] to the endpoint that performs it.
//!
//! The crate ships no table of models: which encoding a model uses and how large its context window is changes as
//! models come and go, so callers supply it, in code or as JSON through [ModelRegistry::from_json]:
//!
//! ```
//! use promptwise::config::ModelRegistry;
//!
//! let registry = ModelRegistry::from_json(r#"[
//!     {"model": "text-davinci-003", "encoding": "p50k_base", "max_window": 4097},
//!     {"model": "text-embedding-ada-002", "encoding": "cl100k_base", "max_window": 8191}
//! ]"#).unwrap();
//! assert_eq!(4097, registry.get("text-davinci-003").unwrap().max_window.get());
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::utils::token::tiktoken::{Encoding, Tiktoken};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding an optional API base URL.
pub const API_BASE_ENV: &str = "OPENAI_API_BASE";

/// Errors of configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("InvalidTemperature: temperature must be within [0.0, 1.0], got {0}")]
    InvalidTemperature(f32),

    #[error("EmptyModel: the model identifier is empty")]
    EmptyModel,

    #[error("UnknownModel: no profile for model {model}, known models are {known:?}")]
    UnknownModel { model: String, known: Vec<String> },

    #[error("EncodingMismatch: model {model} uses {expected}, but the tokens are counted with {actual}")]
    EncodingMismatch { model: String, expected: Encoding, actual: Encoding },

    #[error("DuplicateModel: model {0} is listed more than once")]
    DuplicateModel(String),

    #[error("MissingApiKey: environment variable {0} is not set")]
    MissingApiKey(&'static str),

    #[error("InvalidApiBase: {0}")]
    InvalidApiBase(#[from] url::ParseError),

    #[error("MalformedModelTable: {0}")]
    MalformedModelTable(#[from] serde_json::Error),
}

/// The identity of a model as far as token accounting is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model: String,
    pub encoding: Encoding,
    /// The context window shared by the prompt and the completion
    pub max_window: NonZeroUsize,
}

impl ModelProfile {
    pub fn new(model: impl Into<String>, encoding: Encoding, max_window: NonZeroUsize) -> Self {
        Self {
            model: model.into(),
            encoding,
            max_window,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            Err(ConfigError::EmptyModel)
        } else {
            Ok(())
        }
    }

    /// A tokenizer with the encoding of this model.
    pub fn tokenizer(&self) -> anyhow::Result<Tiktoken> {
        Tiktoken::new(self.encoding)
    }
}

/// Caller-supplied table from model identifiers to their profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRegistry {
    profiles: BTreeMap<String, ModelProfile>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of profiles.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let profiles: Vec<ModelProfile> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for profile in profiles {
            if registry.profiles.contains_key(&profile.model) {
                return Err(ConfigError::DuplicateModel(profile.model));
            }
            registry.insert(profile)?;
        }
        Ok(registry)
    }

    /// Add or replace a profile. Returns the replaced one.
    pub fn insert(&mut self, profile: ModelProfile) -> Result<Option<ModelProfile>, ConfigError> {
        profile.validate()?;
        Ok(self.profiles.insert(profile.model.clone(), profile))
    }

    pub fn get(&self, model: &str) -> Result<&ModelProfile, ConfigError> {
        self.profiles.get(model).ok_or_else(|| ConfigError::UnknownModel {
            model: model.to_string(),
            known: self.profiles.keys().cloned().collect(),
        })
    }

    pub fn models(&self) -> impl Iterator<Item=&str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        let profiles: Vec<&ModelProfile> = self.profiles.values().collect();
        Ok(serde_json::to_string_pretty(&profiles)?)
    }
}

/// Per-call settings of a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub profile: ModelProfile,
    /// Completion length. `None` spends the whole remaining budget.
    pub max_tokens: Option<usize>,
    /// Sampling temperature, within [0.0, 1.0]
    pub temperature: f32,
}

impl CompletionConfig {
    pub const DEFAULT_TEMPERATURE: f32 = 0.0;

    pub fn new(profile: ModelProfile) -> Self {
        Self {
            profile,
            max_tokens: None,
            temperature: Self::DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.profile.validate()?;
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        Ok(())
    }
}

/// Credentials of the completion API.
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    /// `None` uses the default base of the endpoint
    pub api_base: Option<Url>,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: None,
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Result<Self, ConfigError> {
        self.api_base = Some(Url::parse(api_base)?);
        Ok(self)
    }

    /// Read [API_KEY_ENV] and, if set, [API_BASE_ENV].
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey(API_KEY_ENV))?;
        let credentials = Self::new(api_key);
        match env::var(API_BASE_ENV) {
            Ok(api_base) if !api_base.is_empty() => credentials.with_api_base(&api_base),
            _ => Ok(credentials),
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base.as_ref().map(Url::as_str))
            .finish()
    }
}
