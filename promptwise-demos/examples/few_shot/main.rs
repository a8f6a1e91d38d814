//! Few-shot prompting: a witty assistant, once with temperature 0.0 and once with 1.0.

use std::num::NonZeroUsize;

use anyhow::{Context, Result};
use promptwise::config::{ApiCredentials, CompletionConfig, ModelProfile};
use promptwise::few_shot::FewShot;
use promptwise::prompt::{PromptBuilder, PromptLayout, PromptSpec};
use promptwise::utils::llm::openai::OpenAICompletion;
use promptwise::utils::llm::Completer;
use promptwise::utils::token::tiktoken::Encoding;

#[tokio::main]
async fn main() -> Result<()> {
    let examples = FewShot::new()
        .example("How are you?", "I can't complain but sometimes I still do.")
        .example("What time is it?", "It's time to get a watch.")
        .render()?;
    let spec = PromptSpec::new()
        .instructions(format!("The following are exerpts from conversations with an AI assistant. The assistant is \
        typically sarcastic and witty, producing creative and funny responses to the users questions. \
        Here are some examples:\n\n{}", examples))
        .query("What is the meaning of life?")
        .output_indicator("AI:");
    let builder = PromptBuilder::with_layout(PromptLayout {
        query_label: "User: ".to_string(),
        ..PromptLayout::default()
    });
    println!("{}\n", builder.build(&spec)?);

    let credentials = match ApiCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(error) => {
            println!("not sending the prompt: {}", error);
            return Ok(());
        }
    };
    let profile = ModelProfile::new("text-davinci-003", Encoding::P50kBase, NonZeroUsize::new(4097).context("the context window is positive")?);
    let completer = Completer::with_builder(OpenAICompletion::new(&credentials), profile.tokenizer()?, builder);
    for temperature in [0.0, 1.0] {
        let config = CompletionConfig::new(profile.clone()).with_max_tokens(256).with_temperature(temperature);
        let completion = completer.complete(&config, &spec).await?;
        println!("temperature {}: {}", temperature, completion.text.trim());
    }
    Ok(())
}
