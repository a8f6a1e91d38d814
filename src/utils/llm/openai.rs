use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{CreateCompletionRequest, CreateCompletionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use log::warn;

use crate::config::ApiCredentials;
use crate::utils::llm::{CompletionEndpoint, CompletionRequest};

/// Text-completion endpoint of the OpenAI API.
#[derive(Clone, Debug)]
pub struct OpenAICompletion {
    pub client: Client<OpenAIConfig>,
}

impl OpenAICompletion {
    pub fn new(credentials: &ApiCredentials) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(credentials.api_key.as_str());
        if let Some(api_base) = &credentials.api_base {
            config = config.with_api_base(api_base.as_str().trim_end_matches('/'));
        }
        Self {
            client: Client::with_config(config),
        }
    }
}

/// Map a request to the body of `POST /completions`. `max_tokens` beyond what the API accepts is clamped to `u16::MAX`.
pub fn to_openai_request(request: CompletionRequest) -> Result<CreateCompletionRequest, OpenAIError> {
    let max_tokens = u16::try_from(request.max_tokens).unwrap_or_else(|_| {
        warn!("max_tokens = {} does not fit the API, sending {}", request.max_tokens, u16::MAX);
        u16::MAX
    });
    CreateCompletionRequestArgs::default()
        .model(request.model)
        .prompt(request.prompt)
        .max_tokens(max_tokens)
        .temperature(request.temperature)
        .build()
}

#[async_trait]
impl CompletionEndpoint for OpenAICompletion {
    type Error = OpenAIError;

    /// Send a request to the OpenAI API. Returns the text of the first choice, or the error of the API as is.
    async fn create_completion(&self, request: CompletionRequest) -> Result<String, OpenAIError> {
        let create_request = to_openai_request(request)?;
        let response = self.client.completions().create(create_request).await?;
        Ok(response.choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .unwrap_or_default())
    }
}
