//! # Few-shot examples
//!
//! Few-shot prompting shows the model a handful of input/output pairs before the real input, so it picks up the
//! pattern of the expected answer. A [FewShot] renders the pairs through an example template and joins them with
//! blank lines. The result is plain text: put it into the instructions or a context of a
//! [PromptSpec](crate::prompt::PromptSpec).
//!
//! ```
//! use promptwise::few_shot::FewShot;
//!
//! let examples = FewShot::new()
//!     .example("How are you?", "I can't complain but sometimes I still do.")
//!     .example("What time is it?", "It's time to get a watch.");
//! assert_eq!(
//!     "User: How are you?\nAI: I can't complain but sometimes I still do.\n\n\
//!      User: What time is it?\nAI: It's time to get a watch.",
//!     examples.render().unwrap()
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::template::errors::TemplateError;
use crate::template::PromptTemplate;

/// One demonstration of the expected behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub input: String,
    pub output: String,
}

impl FewShotExample {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// An ordered list of examples plus how to render each of them.
#[derive(Debug, Clone)]
pub struct FewShot {
    example_template: PromptTemplate,
    examples: Vec<FewShotExample>,
    separator: String,
}

impl Default for FewShot {
    fn default() -> Self {
        Self::with_template(PromptTemplate::new(Self::DEFAULT_EXAMPLE_TEMPLATE_STR))
    }
}

impl FewShot {
    pub const INPUT_PLACEHOLDER: &'static str = "input";
    pub const OUTPUT_PLACEHOLDER: &'static str = "output";
    const DEFAULT_EXAMPLE_TEMPLATE_STR: &'static str = "User: {{input}}\nAI: {{output}}";

    pub fn new() -> Self {
        Self::default()
    }

    /// Render examples through a custom template. It may use `{{input}}` and `{{output}}` and nothing else.
    pub fn with_template(example_template: PromptTemplate) -> Self {
        Self {
            example_template,
            examples: Vec::new(),
            separator: "\n\n".to_string(),
        }
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn example(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.examples.push(FewShotExample::new(input, output));
        self
    }

    pub fn examples(mut self, examples: impl IntoIterator<Item=FewShotExample>) -> Self {
        self.examples.extend(examples);
        self
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    fn render_one(&self, example: &FewShotExample) -> Result<String, TemplateError> {
        let mut prompt = self.example_template.construct_prompt();
        for (placeholder, value) in [(Self::INPUT_PLACEHOLDER, &example.input), (Self::OUTPUT_PLACEHOLDER, &example.output)] {
            if self.example_template.placeholders.contains(placeholder) {
                prompt.try_fill(placeholder, value.as_str())?;
            }
        }
        Ok(prompt.complete()?)
    }

    /// Render all examples in order.
    /// Returns an error if the example template has placeholders other than `input` and `output`.
    pub fn render(&self) -> Result<String, TemplateError> {
        let rendered = self.examples
            .iter()
            .map(|example| self.render_one(example))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join(&self.separator))
    }
}

#[cfg(test)]
mod test_few_shot {
    use super::{FewShot, FewShotExample};
    use crate::prompt::{PromptBuilder, PromptLayout, PromptSpec};
    use crate::template::errors::TemplateError;
    use crate::template::PromptTemplate;

    #[test]
    fn test_render_in_order() {
        let few_shot = FewShot::new()
            .examples(vec![FewShotExample::new("1+1?", "2"), FewShotExample::new("2+2?", "4")]);
        assert_eq!(2, few_shot.len());
        assert_eq!("User: 1+1?\nAI: 2\n\nUser: 2+2?\nAI: 4", few_shot.render().unwrap());
        assert_eq!("", FewShot::new().render().unwrap());
    }

    #[test]
    fn test_custom_template() {
        let few_shot = FewShot::with_template(PromptTemplate::new("Q: {{input}} => {{output}}"))
            .separator("\n")
            .example("cat", "mammal")
            .example("trout", "fish");
        assert_eq!("Q: cat => mammal\nQ: trout => fish", few_shot.render().unwrap());
    }

    #[test]
    fn test_template_with_extra_placeholder() {
        let few_shot = FewShot::with_template(PromptTemplate::new("{{input}} {{output}} {{mood}}"))
            .example("a", "b");
        assert!(matches!(few_shot.render(), Err(TemplateError::UnfilledPlaceholders(_))));
    }

    #[test]
    fn test_few_shot_in_prompt() {
        let examples = FewShot::new()
            .example("How are you?", "I can't complain but sometimes I still do.")
            .render()
            .unwrap();
        let spec = PromptSpec::new()
            .instructions(format!("The assistant is sarcastic and witty. Here are some examples:\n\n{}", examples))
            .query("What is the meaning of life?")
            .output_indicator("AI:");
        let layout = PromptLayout {
            query_label: "User: ".to_string(),
            ..PromptLayout::default()
        };
        let prompt = PromptBuilder::with_layout(layout).build(&spec).unwrap();
        assert!(prompt.contains("User: How are you?\nAI: I can't complain"));
        assert!(prompt.ends_with("User: What is the meaning of life?\n\nAI:"));
    }
}
