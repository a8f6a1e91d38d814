//! # Prompt templates
//! A prompt template is a string with placeholders.
//!
//! ## Placeholder
//! A placeholder is a string in the format of `{{name}}`. The name is anything between the braces except line
//! breaks.
//!
//! ## PartialPrompt
//! A partial prompt is a prompt template with some placeholders filled. A partial prompt can be only constructed from
//! a prompt template via [PromptTemplate::construct_prompt].
//!
//! The placeholders are filled via [PartialPrompt::try_fill], which also updates values filled before. When all
//! placeholders are filled, [PartialPrompt::complete] replaces them and returns the prompt.
//!
//! Templates are handy for the parts of a [PromptSpec](crate::prompt::PromptSpec), for instance the instructions,
//! or for each example of a [FewShot](crate::few_shot::FewShot) block.


use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::warn;

use crate::template::errors::{PlaceholderNotExist, UnfilledPlaceholders};
use crate::utils::prompt_processing::{get_placeholders, replace_placeholders};
use crate::utils::token::CountToken;


/// A prompt template with some placeholders filled. A partial prompt can be only constructed from a prompt template via [PromptTemplate::construct_prompt].
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PartialPrompt {
    /// The template of the partial prompt, readonly
    #[readonly]
    pub template: PromptTemplate,

    /// Mapping from placeholder name to its filling value
    pub(crate) placeholder_to_vals: HashMap<String, Option<String>>,

    /// Record the placeholders that are not filled yet
    pub(crate) unfilled_placeholders: HashSet<String>,
}

impl PartialPrompt {
    /// Fill a placeholder in the partial prompt with the given value.
    /// Returns an error if the placeholder does not exist.
    pub fn try_fill(&mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Result<&mut Self, PlaceholderNotExist> {
        let placeholder = placeholder.into();
        if self.placeholder_to_vals.contains_key(&placeholder) {
            self.unfilled_placeholders.remove(&placeholder);
            self.placeholder_to_vals.insert(placeholder, Some(value.into()));
            Ok(self)
        } else {
            Err(PlaceholderNotExist::new(placeholder, value, &self.template.placeholders))
        }
    }

    /// Whether every placeholder has a value.
    pub fn is_complete(&self) -> bool {
        self.unfilled_placeholders.is_empty()
    }

    /// The prompt as it is now. Unfilled placeholders are kept as written.
    pub fn current(&self) -> String {
        replace_placeholders(self.template.str(), &self.placeholder_to_vals)
    }

    /// Count the number of tokens in the prompt as it is now. Unfilled placeholders are counted as written.
    pub fn current_token_num(&self, counter: &impl CountToken) -> usize {
        counter.count_token(&self.current())
    }

    /// Complete the partial prompt and return the completed prompt.
    /// Returns an error if there are still unfilled placeholders.
    pub fn complete(&self) -> Result<String, UnfilledPlaceholders> {
        if self.is_complete() {
            Ok(self.current())
        } else {
            Err(UnfilledPlaceholders::new(&self.template.placeholders, &self.unfilled_placeholders))
        }
    }
}

/// A prompt template with placeholders.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PromptTemplate {
    /// The template string, immutable
    template: Arc<String>,

    /// The placeholders in the template, readonly
    #[readonly]
    pub placeholders: HashSet<String>,
}

impl PromptTemplate {
    /// Create a prompt template from a string. Warns if the template does not have any placeholder.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let placeholders = get_placeholders(&template);
        if placeholders.is_empty() {
            warn!("Your prompt template does not have a placeholder. If this is intended, ignore this message. \
            Otherwise, check whether you have written placeholders correctly.\n\
            Got prompt template:\n\
            {}", template);
        }
        Self {
            template: Arc::new(template),
            placeholders,
        }
    }

    /// Get the prompt template as a string.
    #[inline]
    pub fn str(&self) -> &str {
        &self.template
    }

    /// Construct a partial prompt from the prompt template.
    pub fn construct_prompt(&self) -> PartialPrompt {
        PartialPrompt {
            template: self.clone(),
            placeholder_to_vals: self.placeholders.iter().map(|p| (p.clone(), None)).collect(),
            unfilled_placeholders: self.placeholders.clone(),
        }
    }
}

pub mod errors {
    use std::collections::HashSet;

    use thiserror::Error;

    fn sorted(placeholders: &HashSet<String>) -> Vec<String> {
        let mut placeholders: Vec<String> = placeholders.iter().cloned().collect();
        placeholders.sort();
        placeholders
    }

    /// Error when trying to complete a partial prompt but there are still unfilled placeholders.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("UnfilledPlaceholders: to complete the prompt template,\n  Requires Placeholders:{all_placeholders:?}\n  Unfilled Placeholders:{unfilled_placeholders:?}")]
    pub struct UnfilledPlaceholders {
        pub unfilled_placeholders: Vec<String>,
        pub all_placeholders: Vec<String>,
    }

    impl UnfilledPlaceholders {
        pub(crate) fn new(all_placeholders: &HashSet<String>, unfilled_placeholders: &HashSet<String>) -> Self {
            Self {
                unfilled_placeholders: sorted(unfilled_placeholders),
                all_placeholders: sorted(all_placeholders),
            }
        }
    }

    /// Error when trying to fill a placeholder that does not exist in the prompt template of the partial prompt.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("PlaceholderNotExist: try to fill placeholder = {try_fill_placeholder} with value = {value}, but available placeholders are {available_placeholders:?}")]
    pub struct PlaceholderNotExist {
        pub try_fill_placeholder: String,
        pub value: String,
        pub available_placeholders: Vec<String>,
    }

    impl PlaceholderNotExist {
        pub(crate) fn new(try_fill_placeholder: impl Into<String>,
                          value: impl Into<String>,
                          available_placeholders: &HashSet<String>) -> Self {
            PlaceholderNotExist {
                try_fill_placeholder: try_fill_placeholder.into(),
                value: value.into(),
                available_placeholders: sorted(available_placeholders),
            }
        }
    }

    /// Either template error, for callers that fill and complete in one go.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum TemplateError {
        #[error(transparent)]
        PlaceholderNotExist(#[from] PlaceholderNotExist),
        #[error(transparent)]
        UnfilledPlaceholders(#[from] UnfilledPlaceholders),
    }
}
