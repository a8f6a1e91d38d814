//! # Prompt
//! A prompt is simply a string, assembled from four parts in a fixed order:
//!
//! 1. instructions, telling the model what to do;
//! 2. contexts, the external information the model should rely on;
//! 3. the query, the question of the user;
//! 4. the output indicator, marking where the generation begins.
//!
//! ## PromptSpec
//! A [PromptSpec] holds these parts. Any part may be absent, but not all of them.
//!
//! ## PromptBuilder
//! A [PromptBuilder] serializes a [PromptSpec] with the delimiter conventions of a [PromptLayout]. With the default
//! layout, a prompt looks like
//!
//! ```text
//! Answer the question based on the contexts below.
//!
//! ###
//!
//! Contexts:
//! First context
//!
//! ##
//!
//! Second context
//!
//! ###
//!
//! Question: What is the second context?
//!
//! Answer:
//! ```
//!
//! Contexts are inserted verbatim. If they come from users, sanitizing delimiter-like lines is up to the caller, see
//! [PromptLayout::contains_delimiter].


use log::warn;
use serde::{Deserialize, Serialize};

use crate::prompt::errors::InvalidSpec;

/// The parts of a prompt. Build the prompt text with [PromptBuilder::build].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub instructions: Option<String>,
    #[serde(default)]
    pub contexts: Vec<String>,
    pub query: Option<String>,
    pub output_indicator: Option<String>,
}

impl PromptSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Append one context after the existing ones.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.contexts.push(context.into());
        self
    }

    /// Append contexts in iteration order.
    pub fn contexts<I, S>(mut self, contexts: I) -> Self
        where I: IntoIterator<Item=S>,
              S: Into<String> {
        self.contexts.extend(contexts.into_iter().map(Into::into));
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn output_indicator(mut self, output_indicator: impl Into<String>) -> Self {
        self.output_indicator = Some(output_indicator.into());
        self
    }

    /// Whether no part carries any content. Whitespace-only parts count as empty.
    pub fn is_empty(&self) -> bool {
        non_blank(&self.instructions).is_none()
            && self.contexts.iter().all(|c| c.trim().is_empty())
            && non_blank(&self.query).is_none()
            && non_blank(&self.output_indicator).is_none()
    }

    pub fn validate(&self) -> Result<(), InvalidSpec> {
        if self.is_empty() {
            Err(InvalidSpec)
        } else {
            Ok(())
        }
    }
}

#[inline]
fn non_blank(part: &Option<String>) -> Option<&str> {
    part.as_deref().filter(|s| !s.trim().is_empty())
}

/// Delimiter conventions of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptLayout {
    /// Marker opening and closing the context section
    pub section_delimiter: String,
    /// Marker between two contexts
    pub context_separator: String,
    /// Line right after the opening section marker, skipped when empty
    pub context_header: String,
    /// Prefix of the query line
    pub query_label: String,
}

impl Default for PromptLayout {
    fn default() -> Self {
        Self {
            section_delimiter: "###".to_string(),
            context_separator: "##".to_string(),
            context_header: "Contexts:".to_string(),
            query_label: "Question: ".to_string(),
        }
    }
}

impl PromptLayout {
    /// Whether `text` has a line that reads as one of the delimiters, which would blur the context section.
    pub fn contains_delimiter(&self, text: &str) -> bool {
        text.lines()
            .map(str::trim)
            .any(|line| line == self.section_delimiter || line == self.context_separator)
    }
}

const BLOCK_SEPARATOR: &str = "\n\n";

/// Serializes a [PromptSpec] into prompt text.
#[derive(Debug, Clone, Default)]
#[readonly::make]
pub struct PromptBuilder {
    /// The delimiter conventions, readonly
    #[readonly]
    pub layout: PromptLayout,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: PromptLayout) -> Self {
        Self { layout }
    }

    /// Build the prompt text. Present parts are joined by blank lines, nothing follows the output indicator.
    /// Returns an error if the spec is empty.
    pub fn build(&self, spec: &PromptSpec) -> Result<String, InvalidSpec> {
        spec.validate()?;
        let mut blocks: Vec<String> = Vec::with_capacity(4);
        if let Some(instructions) = non_blank(&spec.instructions) {
            blocks.push(instructions.to_string());
        }
        if !spec.contexts.is_empty() {
            blocks.push(self.context_section(&spec.contexts));
        }
        if let Some(query) = non_blank(&spec.query) {
            blocks.push(format!("{}{}", self.layout.query_label, query));
        }
        if let Some(output_indicator) = non_blank(&spec.output_indicator) {
            blocks.push(output_indicator.to_string());
        }
        Ok(blocks.join(BLOCK_SEPARATOR))
    }

    fn context_section(&self, contexts: &[String]) -> String {
        for (idx, context) in contexts.iter().enumerate() {
            if self.layout.contains_delimiter(context) {
                warn!("Context #{} contains a line equal to a prompt delimiter ({:?} or {:?}). \
                It is inserted verbatim, so sanitize it if it comes from user input.",
                    idx, self.layout.section_delimiter, self.layout.context_separator);
            }
        }
        let layout = &self.layout;
        let separator = format!("{BLOCK_SEPARATOR}{}{BLOCK_SEPARATOR}", layout.context_separator);
        let body = contexts.join(&separator);
        let delimiter = &layout.section_delimiter;
        if layout.context_header.is_empty() {
            format!("{delimiter}{BLOCK_SEPARATOR}{body}{BLOCK_SEPARATOR}{delimiter}")
        } else {
            format!("{delimiter}{BLOCK_SEPARATOR}{}\n{body}{BLOCK_SEPARATOR}{delimiter}", layout.context_header)
        }
    }
}

pub mod errors {
    use thiserror::Error;

    /// Error when a prompt has no content in any part.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    #[error("InvalidSpec: a prompt needs instructions, contexts, a query or an output indicator, but all of them are empty")]
    pub struct InvalidSpec;
}

#[cfg(test)]
mod test_prompt {
    use super::{PromptBuilder, PromptLayout, PromptSpec};
    use crate::prompt::errors::InvalidSpec;

    fn cats() -> PromptSpec {
        PromptSpec::new()
            .instructions("Answer using context.")
            .context("Cats are mammals.")
            .query("What are cats?")
            .output_indicator("Answer:")
    }

    #[test]
    fn test_build_single_context() {
        let prompt = PromptBuilder::new().build(&cats()).unwrap();
        let expected = "Answer using context.\n\n###\n\nContexts:\nCats are mammals.\n\n###\n\nQuestion: What are cats?\n\nAnswer:";
        assert_eq!(expected, prompt);

        let positions: Vec<usize> = ["Answer using context.", "Cats are mammals.", "What are cats?", "Answer:"]
            .iter()
            .map(|part| prompt.find(part).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new();
        let spec = cats().context("Dogs are mammals too.");
        assert_eq!(builder.build(&spec).unwrap(), builder.build(&spec.clone()).unwrap());
    }

    #[test]
    fn test_contexts_keep_order_and_text() {
        let contexts = ["third: zebra", "first: {{not a placeholder}}", "second:\n  multi-line\ttext "];
        let spec = PromptSpec::new().contexts(contexts).query("Which?");
        let prompt = PromptBuilder::new().build(&spec).unwrap();
        let mut last = 0;
        for context in contexts {
            let idx = prompt[last..].find(context).expect("context must be present verbatim") + last;
            last = idx + context.len();
        }
        assert_eq!(2, prompt.matches("\n\n##\n\n").count());
    }

    #[test]
    fn test_absent_parts_are_skipped() {
        let builder = PromptBuilder::new();
        assert_eq!("Question: What are cats?\n\nAnswer:",
                   builder.build(&PromptSpec::new().query("What are cats?").output_indicator("Answer:")).unwrap());
        assert_eq!("Just do it.", builder.build(&PromptSpec::new().instructions("Just do it.").query("  ")).unwrap());
        assert!(!builder.build(&PromptSpec::new().query("q")).unwrap().contains("###"));
    }

    #[test]
    fn test_empty_spec_is_invalid() {
        let builder = PromptBuilder::new();
        assert_eq!(Err(InvalidSpec), builder.build(&PromptSpec::new()));
        let blank = PromptSpec::new().instructions(" ").context("\n").query("").output_indicator("\t");
        assert!(blank.is_empty());
        assert_eq!(Err(InvalidSpec), builder.build(&blank));
    }

    #[test]
    fn test_custom_layout() {
        let layout = PromptLayout {
            section_delimiter: "\"\"\"".to_string(),
            context_separator: "---".to_string(),
            context_header: String::new(),
            query_label: "User: ".to_string(),
        };
        let spec = PromptSpec::new().contexts(["a", "b"]).query("hi").output_indicator("AI:");
        let prompt = PromptBuilder::with_layout(layout).build(&spec).unwrap();
        assert_eq!("\"\"\"\n\na\n\n---\n\nb\n\n\"\"\"\n\nUser: hi\n\nAI:", prompt);
    }

    #[test]
    fn test_contains_delimiter() {
        let layout = PromptLayout::default();
        assert!(layout.contains_delimiter("intro\n##\noutro"));
        assert!(layout.contains_delimiter("  ###  "));
        assert!(!layout.contains_delimiter("## Markdown heading"));
        assert!(!layout.contains_delimiter("Cats are mammals."));
    }

    #[test]
    fn test_spec_from_json() {
        let spec: PromptSpec = serde_json::from_str(r#"{"query": "What are cats?", "output_indicator": "Answer:"}"#).unwrap();
        assert!(spec.contexts.is_empty());
        assert_eq!(Some("What are cats?"), spec.query.as_deref());
    }
}
