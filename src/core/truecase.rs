/// True-casing: restore capitalization from corpus frequency statistics.

use crate::core::index::{CorpusIndex, FrequencyCounter};
use crate::schema::token::{capitalize, capitalize_first, tokenize, Token, SENTENCE_ENDERS};

/// Chooses the case each word most often takes in the corpus and formats
/// the final sentence.
pub struct TrueCaser<'a> {
    frequencies: &'a FrequencyCounter,
    token_order: &'a [String],
}

impl<'a> TrueCaser<'a> {
    pub fn new(frequencies: &'a FrequencyCounter, token_order: &'a [String]) -> Self {
        Self {
            frequencies,
            token_order,
        }
    }

    pub fn from_index(index: &'a CorpusIndex) -> Self {
        Self::new(&index.frequencies, &index.token_order)
    }

    /// Most frequent of the lowercase, capitalized and uppercase forms.
    ///
    /// Ties go to uppercase, then capitalized. A word seen in none of the
    /// three forms takes the case of its first corpus occurrence, or is
    /// returned unchanged.
    pub fn case_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        let upper = word.to_uppercase();
        let capital = capitalize(word);

        let lower_count = self.frequencies.count(&lower);
        let capital_count = self.frequencies.count(&capital);
        let upper_count = self.frequencies.count(&upper);

        if lower_count + capital_count + upper_count == 0 {
            return self
                .token_order
                .iter()
                .find(|t| t.to_lowercase() == lower)
                .cloned()
                .unwrap_or_else(|| word.to_string());
        }

        if upper_count >= capital_count && upper_count >= lower_count {
            upper
        } else if capital_count >= lower_count {
            capital
        } else {
            lower
        }
    }

    /// Case and join a token sequence into one sentence.
    ///
    /// Sentence delimiters survive only in the final token; a final
    /// punctuation token attaches to the preceding word without a space.
    pub fn truecase(&self, tokens: &[Token]) -> String {
        let tokens: Vec<&Token> = tokens
            .iter()
            .filter(|t| !matches!(t, Token::Boundary))
            .collect();
        let last = tokens.len().saturating_sub(1);

        let mut out = String::new();
        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Punct(p) if i == last => out.push_str(p),
                Token::Word(w) => {
                    let word = if i == last {
                        w.clone()
                    } else {
                        w.replace(SENTENCE_ENDERS, "")
                    };
                    if word.is_empty() {
                        continue;
                    }
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(&self.case_word(&word));
                }
                _ => {}
            }
        }

        capitalize_first(&out)
    }

    /// Tokenize `sentence` and true-case it.
    pub fn truecase_str(&self, sentence: &str) -> String {
        self.truecase(&tokenize(sentence))
    }

    pub fn bulk_truecase<S: AsRef<str>>(&self, sentences: &[S]) -> Vec<String> {
        sentences
            .iter()
            .map(|s| self.truecase_str(s.as_ref()))
            .collect()
    }
}
