//! Token counting traits and utilities

pub mod tiktoken;

use tiktoken::Encoding;

/// Trait for turning a string into the ordered token ids of some encoding.
///
/// The token count of a string is the length of its encoding. Implementations must be deterministic: encoding the
/// same string twice yields the same ids.
pub trait CountToken {
    fn encode(&self, string: &str) -> Vec<usize>;

    #[inline]
    fn count_token(&self, string: &str) -> usize {
        self.encode(string).len()
    }

    /// The named encoding behind the ids, if any. Used to catch a counter paired with the profile of another model.
    fn encoding(&self) -> Option<Encoding> {
        None
    }
}

/// Blanket impl of CountToken for Fn(&str) -> Vec<usize>.
impl<F> CountToken for F where F: Fn(&str) -> Vec<usize> {
    fn encode(&self, string: &str) -> Vec<usize> {
        self(string)
    }
}

#[cfg(test)]
pub(crate) mod test_token {
    use super::CountToken;

    /// One token per whitespace separated word, the id being the word length.
    pub(crate) fn whitespace_tokens(string: &str) -> Vec<usize> {
        string.split_whitespace().map(str::len).collect()
    }

    #[test]
    fn test_fn_impl() {
        let counter = whitespace_tokens;
        assert_eq!(0, counter.count_token(""));
        assert_eq!(vec![5, 5], counter.encode("hello world"));
        assert_eq!(3, counter.count_token(" a  b\nc "));
        assert_eq!(None, counter.encoding());
    }
}
