pub mod token;
pub mod llm;
pub(crate) mod prompt_processing;
