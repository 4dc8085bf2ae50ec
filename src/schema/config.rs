/// Generator configuration and the external neighbor map.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be between 1 and the chain length {chain_len}, got {value}")]
    InvalidGramSize {
        name: &'static str,
        value: usize,
        chain_len: usize,
    },
    #[error("chain length must be at least 1")]
    ZeroChainLength,
    #[error("step budget must be at least 1")]
    ZeroStepBudget,
    #[error("at least one fallback sentence is required")]
    NoFallbackSentences,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// English stopwords used when a config does not supply its own.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "should", "now",
];

fn default_chain_len() -> usize {
    3
}

fn default_key_gram_size() -> usize {
    2
}

fn default_value_gram_size() -> usize {
    1
}

fn default_max_steps() -> usize {
    200
}

fn default_stopwords() -> Vec<String> {
    DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_fallback_sentences() -> Vec<String> {
    vec![
        "I have nothing to say about that.".to_string(),
        "Let me get back to you on that.".to_string(),
    ]
}

/// Everything the pipeline needs besides the corpus and the neighbor map.
///
/// Loaded from RON; every field is optional and falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Gram size of the index: key length and full successor length.
    #[serde(default = "default_chain_len")]
    pub chain_len: usize,
    #[serde(default = "default_key_gram_size")]
    pub key_gram_size: usize,
    #[serde(default = "default_value_gram_size")]
    pub value_gram_size: usize,
    /// Step budget for each walk direction.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub priority_words: Vec<String>,
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,
    /// Returned verbatim when a phrase cannot be expanded.
    #[serde(default = "default_fallback_sentences")]
    pub fallback_sentences: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            chain_len: default_chain_len(),
            key_gram_size: default_key_gram_size(),
            value_gram_size: default_value_gram_size(),
            max_steps: default_max_steps(),
            priority_words: Vec::new(),
            stopwords: default_stopwords(),
            fallback_sentences: default_fallback_sentences(),
        }
    }
}

impl GeneratorConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = ron::from_str(contents)?;
        Ok(config)
    }

    /// Check every field a generation request depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        WalkParams::new(
            self.key_gram_size,
            self.value_gram_size,
            self.chain_len,
            self.max_steps,
        )?;
        if self.fallback_sentences.is_empty() {
            return Err(ConfigError::NoFallbackSentences);
        }
        Ok(())
    }

    pub fn walk_params(&self) -> Result<WalkParams, ConfigError> {
        WalkParams::new(
            self.key_gram_size,
            self.value_gram_size,
            self.chain_len,
            self.max_steps,
        )
    }

    /// Priority words, lowercased.
    pub fn priority_set(&self) -> FxHashSet<String> {
        self.priority_words.iter().map(|w| w.to_lowercase()).collect()
    }

    /// Stopwords, lowercased.
    pub fn stopword_set(&self) -> FxHashSet<String> {
        self.stopwords.iter().map(|w| w.to_lowercase()).collect()
    }
}

/// Validated window sizes and step budget for one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkParams {
    /// Tokens of the acquired key that seed the working text.
    pub key_gram_size: usize,
    /// Tokens appended per step from a non-terminal successor.
    pub value_gram_size: usize,
    /// Trailing tokens forming the next lookup key.
    pub chain_len: usize,
    pub max_steps: usize,
}

impl WalkParams {
    pub fn new(
        key_gram_size: usize,
        value_gram_size: usize,
        chain_len: usize,
        max_steps: usize,
    ) -> Result<Self, ConfigError> {
        if chain_len == 0 {
            return Err(ConfigError::ZeroChainLength);
        }
        if !(1..=chain_len).contains(&key_gram_size) {
            return Err(ConfigError::InvalidGramSize {
                name: "key_gram_size",
                value: key_gram_size,
                chain_len,
            });
        }
        if !(1..=chain_len).contains(&value_gram_size) {
            return Err(ConfigError::InvalidGramSize {
                name: "value_gram_size",
                value: value_gram_size,
                chain_len,
            });
        }
        if max_steps == 0 {
            return Err(ConfigError::ZeroStepBudget);
        }
        Ok(Self {
            key_gram_size,
            value_gram_size,
            chain_len,
            max_steps,
        })
    }
}

/// Word → semantically related words, most related first.
///
/// Computed outside this crate; used to repair out-of-vocabulary seeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighborMap {
    entries: FxHashMap<String, Vec<String>>,
}

impl NeighborMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: impl Into<String>, neighbors: Vec<String>) {
        self.entries.insert(word.into(), neighbors);
    }

    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a map written as `{ "word": ["neighbor", ...], ... }`.
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let map: NeighborMap = ron::from_str(&contents)?;
        Ok(map)
    }
}

impl FromIterator<(String, Vec<String>)> for NeighborMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
