use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
pub use tiktoken_rs::CoreBPE;
use tiktoken_rs::{cl100k_base, p50k_base, p50k_edit, r50k_base};

use crate::utils::token::CountToken;

/// BPE encodings known to `tiktoken`.
///
/// Each model is served with exactly one encoding. Completion models such as `text-davinci-003` use `p50k_base`,
/// while embedding and chat models such as `text-embedding-ada-002` or `gpt-3.5-turbo` use `cl100k_base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "cl100k_base")]
    Cl100kBase,
    #[serde(rename = "p50k_base")]
    P50kBase,
    #[serde(rename = "p50k_edit")]
    P50kEdit,
    #[serde(rename = "r50k_base")]
    R50kBase,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::P50kBase => "p50k_base",
            Encoding::P50kEdit => "p50k_edit",
            Encoding::R50kBase => "r50k_base",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cl100k_base" => Ok(Encoding::Cl100kBase),
            "p50k_base" => Ok(Encoding::P50kBase),
            "p50k_edit" => Ok(Encoding::P50kEdit),
            "r50k_base" => Ok(Encoding::R50kBase),
            other => Err(UnknownEncoding(other.to_string())),
        }
    }
}

/// Error when parsing an encoding name that `tiktoken` does not ship.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("UnknownEncoding: {0} is not one of cl100k_base, p50k_base, p50k_edit, r50k_base")]
pub struct UnknownEncoding(pub String);

/// Counter using the Tiktoken tokenizer.
///
/// The counts only agree with the remote API when the encoding matches the target model. A mismatched encoding does
/// not fail, it silently produces different counts.
#[derive(Clone)]
#[readonly::make]
pub struct Tiktoken {
    /// The encoding of the tokenizer. read-only.
    #[readonly]
    pub encoding: Encoding,
    bpe: Arc<CoreBPE>,
}

impl Tiktoken {
    /// Create a new Tiktoken counter for an encoding.
    pub fn new(encoding: Encoding) -> Result<Self> {
        let bpe = match encoding {
            Encoding::Cl100kBase => cl100k_base(),
            Encoding::P50kBase => p50k_base(),
            Encoding::P50kEdit => p50k_edit(),
            Encoding::R50kBase => r50k_base(),
        }?;
        Ok(Self {
            encoding,
            bpe: Arc::new(bpe),
        })
    }

    /// Decode token ids back to text.
    pub fn decode(&self, tokens: Vec<usize>) -> Result<String> {
        self.bpe.decode(tokens)
    }
}

impl fmt::Debug for Tiktoken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tiktoken").field("encoding", &self.encoding).finish_non_exhaustive()
    }
}

impl CountToken for Tiktoken {
    fn encode(&self, string: &str) -> Vec<usize> {
        self.bpe.encode_with_special_tokens(string)
    }

    fn encoding(&self) -> Option<Encoding> {
        Some(self.encoding)
    }
}
