use serde::{Deserialize, Serialize};

/// Characters that end a sentence.
pub const SENTENCE_ENDERS: &[char] = &['.', '!', '?'];

/// Text shown for the synthetic sentence-start padding token.
const BOUNDARY_TEXT: &str = "<S>";

/// A single corpus token.
///
/// Every sequence handled by the indexer, walker, assembler and true-caser
/// is a `Vec<Token>`; punctuation and padding are told apart by variant
/// rather than by inspecting string contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Token {
    /// Synthetic sentence-start padding. Only ever appears inside keys.
    Boundary,
    /// A whitespace-delimited word, contractions and commas included.
    Word(String),
    /// A run of sentence-ending punctuation: `.`, `?!`, `...`.
    Punct(String),
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Self::Word(text.into())
    }

    pub fn punct(text: impl Into<String>) -> Self {
        Self::Punct(text.into())
    }

    /// Surface text of the token.
    pub fn text(&self) -> &str {
        match self {
            Self::Boundary => BOUNDARY_TEXT,
            Self::Word(w) => w,
            Self::Punct(p) => p,
        }
    }

    /// True for the word `text`, compared exactly.
    pub fn is_word_eq(&self, text: &str) -> bool {
        matches!(self, Self::Word(w) if w == text)
    }

    /// Terminal tokens stop a walk: padding, sentence-ending punctuation,
    /// and uppercase-initial words (sentence openers once sentence-cased).
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Boundary | Self::Punct(_) => true,
            Self::Word(w) => w.chars().next().is_some_and(char::is_uppercase),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Returns true if any token in the sequence is terminal.
pub fn contains_terminal(tokens: &[Token]) -> bool {
    tokens.iter().any(Token::is_terminal)
}

/// Split text on whitespace, peeling trailing `.`/`?`/`!` runs off each
/// word into a separate `Punct` token.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for raw in text.split_whitespace() {
        let stem = raw.trim_end_matches(SENTENCE_ENDERS);
        if !stem.is_empty() {
            tokens.push(Token::word(stem));
        }
        if stem.len() < raw.len() {
            tokens.push(Token::punct(&raw[stem.len()..]));
        }
    }
    tokens
}

/// Split text into sentences, each ending in exactly one `Punct` token.
///
/// A trailing fragment with no terminal punctuation is closed with `.`.
/// Case is left untouched.
pub fn split_sentences(text: &str) -> Vec<Vec<Token>> {
    let mut sentences = Vec::new();
    let mut current: Vec<Token> = Vec::new();

    for token in tokenize(text) {
        match token {
            Token::Punct(_) if current.is_empty() => {}
            Token::Punct(_) => {
                current.push(token);
                sentences.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }

    if !current.is_empty() {
        current.push(Token::punct("."));
        sentences.push(current);
    }

    sentences
}

/// Lowercase every word and capitalize the sentence's first word.
pub fn sentence_case(sentence: &[Token]) -> Vec<Token> {
    let mut first = true;
    sentence
        .iter()
        .map(|token| match token {
            Token::Word(w) => {
                let lower = w.to_lowercase();
                if first {
                    first = false;
                    Token::Word(capitalize_first(&lower))
                } else {
                    Token::Word(lower)
                }
            }
            other => other.clone(),
        })
        .collect()
}

/// Uppercase the first character, leaving the rest alone.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(text: &str) -> String {
    capitalize_first(&text.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_peels_terminal_punctuation() {
        let tokens = tokenize("Well, it's blue?! Yes.");
        assert_eq!(
            tokens,
            vec![
                Token::word("Well,"),
                Token::word("it's"),
                Token::word("blue"),
                Token::punct("?!"),
                Token::word("Yes"),
                Token::punct("."),
            ]
        );
    }

    #[test]
    fn split_sentences_closes_trailing_fragment() {
        let sentences = split_sentences("The sky is blue. The grass");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].last(), Some(&Token::punct(".")));
        assert_eq!(
            sentences[1],
            vec![Token::word("The"), Token::word("grass"), Token::punct(".")]
        );
    }

    #[test]
    fn split_sentences_skips_orphan_punctuation() {
        let sentences = split_sentences("... Hello there!");
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0][0], Token::word("Hello"));
    }

    #[test]
    fn sentence_case_marks_only_the_opener() {
        let raw = tokenize("THE Sky over Iran.");
        let cased = sentence_case(&raw);
        assert_eq!(
            cased,
            vec![
                Token::word("The"),
                Token::word("sky"),
                Token::word("over"),
                Token::word("iran"),
                Token::punct("."),
            ]
        );
    }

    #[test]
    fn terminal_tokens() {
        assert!(Token::Boundary.is_terminal());
        assert!(Token::punct("?").is_terminal());
        assert!(Token::word("The").is_terminal());
        assert!(!Token::word("the").is_terminal());
        assert!(!Token::word("don't,").is_terminal());
        assert!(contains_terminal(&[Token::word("a"), Token::punct(".")]));
        assert!(!contains_terminal(&[Token::word("a"), Token::word("b")]));
    }

    #[test]
    fn capitalization_helpers() {
        assert_eq!(capitalize("iRAN"), "Iran");
        assert_eq!(capitalize_first("iRAN"), "IRAN");
        assert_eq!(capitalize(""), "");
    }
}
