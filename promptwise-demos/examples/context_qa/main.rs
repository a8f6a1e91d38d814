//! Assembles a question-answering prompt from several contexts, fits it into the context window of
//! `text-davinci-003` and, when `OPENAI_API_KEY` is set, sends it.

use anyhow::Result;
use promptwise::budget::TokenBudgetChecker;
use promptwise::config::{ApiCredentials, CompletionConfig, ModelRegistry};
use promptwise::prompt::{PromptBuilder, PromptSpec};
use promptwise::utils::llm::openai::OpenAICompletion;
use promptwise::utils::llm::Completer;

const MODELS: &str = r#"[
    {"model": "text-davinci-003", "encoding": "p50k_base", "max_window": 4097}
]"#;

const CONTEXTS: [&str; 3] = [
    "Large Language Models (LLMs) are the latest models used in NLP. Their superior performance over smaller models \
    has made them incredibly useful for developers building NLP enabled applications.",
    "Prompt engineering is the process of structuring prompts so that the model returns the output we want. \
    A prompt typically has instructions, external information or context, user input or a query, and an output indicator.",
    "The temperature parameter controls how often the model picks less likely tokens. At 0.0 the model always picks \
    the most likely token, higher values give more creative, less predictable output.",
];

#[tokio::main]
async fn main() -> Result<()> {
    let registry = ModelRegistry::from_json(MODELS)?;
    let profile = registry.get("text-davinci-003")?.clone();
    let tokenizer = profile.tokenizer()?;

    let spec = PromptSpec::new()
        .instructions("Answer the question based on the contexts below. If the question cannot be answered using \
        the information provided answer with \"I don't know\".")
        .contexts(CONTEXTS)
        .query("Give me two examples of how to use prompt engineering.")
        .output_indicator("Answer:");

    let builder = PromptBuilder::new();
    let checker = TokenBudgetChecker::new(&tokenizer, profile.max_window);
    let (spec, prompt, budget) = checker.fit_contexts(&builder, &spec, 256)?;
    println!("{}\n", prompt);
    println!("{} contexts kept, {} prompt tokens, {} of {} tokens left for the completion",
             spec.contexts.len(), budget.prompt_tokens, budget.remaining, budget.max_window);

    let credentials = match ApiCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(error) => {
            println!("not sending the prompt: {}", error);
            return Ok(());
        }
    };
    let completer = Completer::with_builder(OpenAICompletion::new(&credentials), tokenizer, builder);
    let config = CompletionConfig::new(profile).with_max_tokens(256).with_temperature(0.0);
    let completion = completer.complete(&config, &spec).await?;
    println!("{}", completion.text.trim());
    Ok(())
}
