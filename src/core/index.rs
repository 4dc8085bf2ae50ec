/// Corpus indexing: tokenization, bidirectional tables, vocabulary and
/// frequency statistics, plus RON persistence.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::core::table::{Successor, TransitionTable};
use crate::schema::token::{sentence_case, split_sentences, Token};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("gram size must be at least 1, got {0}")]
    InvalidGramSize(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
}

/// Unique corpus words, with a lowercase shadow set for case-insensitive
/// membership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    words: FxHashSet<String>,
    lowercase: FxHashSet<String>,
}

impl Vocabulary {
    pub fn insert(&mut self, word: &str) {
        self.lowercase.insert(word.to_lowercase());
        self.words.insert(word.to_string());
    }

    /// Case-insensitive membership.
    pub fn contains(&self, word: &str) -> bool {
        self.lowercase.contains(&word.to_lowercase())
    }

    pub fn contains_exact(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut vocabulary = Vocabulary::default();
        for word in iter {
            vocabulary.insert(word);
        }
        vocabulary
    }
}

/// Case-sensitive occurrence counts of raw corpus tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyCounter {
    counts: FxHashMap<String, u32>,
}

impl FrequencyCounter {
    pub fn add(&mut self, token: &str) {
        *self.counts.entry(token.to_string()).or_default() += 1;
    }

    pub fn count(&self, token: &str) -> u32 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for FrequencyCounter {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::default();
        for token in iter {
            counter.add(token);
        }
        counter
    }
}

/// Summary numbers for a built index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub num_sentences: usize,
    /// Tokens across all sentences, punctuation included.
    pub num_tokens: usize,
    pub unique_words: usize,
}

/// Everything derived from one corpus. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusIndex {
    /// Key length of both tables; also the walk's chain length.
    pub gram_size: usize,
    /// Built left-to-right.
    pub forward: TransitionTable,
    /// Built on reversed sentences.
    pub backward: TransitionTable,
    pub vocabulary: Vocabulary,
    pub frequencies: FrequencyCounter,
    /// Raw-case corpus tokens in reading order.
    pub token_order: Vec<String>,
    pub stats: CorpusStats,
}

impl CorpusIndex {
    /// Read and index a corpus file.
    pub fn from_path(path: &Path, gram_size: usize) -> Result<Self, IndexError> {
        let text = std::fs::read_to_string(path)?;
        info!(path = %path.display(), bytes = text.len(), "loaded corpus");
        CorpusIndexer::build(&text, gram_size)
    }
}

/// Builds a [`CorpusIndex`] from raw corpus text.
pub struct CorpusIndexer;

impl CorpusIndexer {
    /// Index `text` with keys of `gram_size` tokens.
    ///
    /// Table tokens are sentence-cased so that an uppercase-initial word
    /// always marks a sentence opening; the raw casing is kept in the
    /// frequency counter and token order for true-casing.
    pub fn build(text: &str, gram_size: usize) -> Result<CorpusIndex, IndexError> {
        if gram_size < 1 {
            return Err(IndexError::InvalidGramSize(gram_size));
        }

        let mut forward = TransitionTable::new(gram_size);
        let mut backward = TransitionTable::new(gram_size);
        let mut vocabulary = Vocabulary::default();
        let mut frequencies = FrequencyCounter::default();
        let mut token_order = Vec::new();
        let mut stats = CorpusStats::default();

        for raw in split_sentences(text) {
            for token in &raw {
                frequencies.add(token.text());
                token_order.push(token.text().to_string());
            }

            let sentence = sentence_case(&raw);
            for token in &sentence {
                if let Token::Word(word) = token {
                    vocabulary.insert(word);
                }
            }

            add_sentence(&mut forward, &sentence);
            let reversed: Vec<Token> = sentence.iter().rev().cloned().collect();
            add_sentence(&mut backward, &reversed);

            stats.num_sentences += 1;
            stats.num_tokens += sentence.len();
        }
        stats.unique_words = vocabulary.len();

        info!(
            gram_size,
            sentences = stats.num_sentences,
            tokens = stats.num_tokens,
            unique_words = stats.unique_words,
            forward_keys = forward.len(),
            backward_keys = backward.len(),
            "corpus indexed"
        );

        Ok(CorpusIndex {
            gram_size,
            forward,
            backward,
            vocabulary,
            frequencies,
            token_order,
            stats,
        })
    }
}

/// Insert every key window of one sentence, padded on the left with a
/// single boundary token.
fn add_sentence(table: &mut TransitionTable, sentence: &[Token]) {
    let n = table.gram_size();
    let mut padded = Vec::with_capacity(sentence.len() + 1);
    padded.push(Token::Boundary);
    padded.extend(sentence.iter().cloned());

    for (start, key) in padded.windows(n).enumerate() {
        let rest = &padded[start + n..];
        let successor = if rest.len() >= n {
            Successor::Window(rest[..n].to_vec())
        } else {
            Successor::Tail(rest.to_vec())
        };
        table.insert(key.to_vec(), successor);
    }
}

/// Save a CorpusIndex to a RON file.
pub fn save_index(index: &CorpusIndex, path: &Path) -> Result<(), IndexError> {
    let serialized = ron::ser::to_string_pretty(index, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, serialized)?;
    info!(path = %path.display(), "index saved");
    Ok(())
}

/// Load a CorpusIndex from a RON file.
pub fn load_index(path: &Path) -> Result<CorpusIndex, IndexError> {
    let contents = std::fs::read_to_string(path)?;
    let index: CorpusIndex = ron::from_str(&contents)?;
    info!(
        path = %path.display(),
        gram_size = index.gram_size,
        sentences = index.stats.num_sentences,
        "index loaded"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(text: &str) -> Token {
        Token::word(text)
    }

    fn p(text: &str) -> Token {
        Token::punct(text)
    }

    #[test]
    fn zero_gram_size_rejected() {
        assert!(matches!(
            CorpusIndexer::build("The sky is blue.", 0),
            Err(IndexError::InvalidGramSize(0))
        ));
    }

    #[test]
    fn empty_corpus_yields_empty_index() {
        let index = CorpusIndexer::build("", 2).unwrap();
        assert!(index.forward.is_empty());
        assert!(index.backward.is_empty());
        assert!(index.vocabulary.is_empty());
        assert_eq!(index.stats, CorpusStats::default());
    }

    #[test]
    fn unigram_forward_table() {
        let index = CorpusIndexer::build("The sky is blue.", 1).unwrap();
        let f = &index.forward;
        assert_eq!(f.get(&[Token::Boundary]).unwrap(), [Successor::Window(vec![w("The")])]);
        assert_eq!(f.get(&[w("sky")]).unwrap(), [Successor::Window(vec![w("is")])]);
        assert_eq!(f.get(&[w("blue")]).unwrap(), [Successor::Window(vec![p(".")])]);
        assert_eq!(f.get(&[p(".")]).unwrap(), [Successor::Tail(vec![])]);
    }

    #[test]
    fn backward_table_reads_right_to_left() {
        let index = CorpusIndexer::build("The sky is blue.", 1).unwrap();
        let b = &index.backward;
        assert_eq!(b.get(&[Token::Boundary]).unwrap(), [Successor::Window(vec![p(".")])]);
        assert_eq!(b.get(&[w("sky")]).unwrap(), [Successor::Window(vec![w("The")])]);
        assert_eq!(b.get(&[w("The")]).unwrap(), [Successor::Tail(vec![])]);
    }

    #[test]
    fn bigram_windows_and_tails() {
        let index = CorpusIndexer::build("The sky is blue.", 2).unwrap();
        let f = &index.forward;
        assert_eq!(
            f.get(&[Token::Boundary, w("The")]).unwrap(),
            [Successor::Window(vec![w("sky"), w("is")])]
        );
        assert_eq!(
            f.get(&[w("sky"), w("is")]).unwrap(),
            [Successor::Window(vec![w("blue"), p(".")])]
        );
        assert_eq!(
            f.get(&[w("is"), w("blue")]).unwrap(),
            [Successor::Tail(vec![p(".")])]
        );
        assert_eq!(f.get(&[w("blue"), p(".")]).unwrap(), [Successor::Tail(vec![])]);
    }

    #[test]
    fn repeated_keys_keep_every_observation() {
        let index = CorpusIndexer::build("The sky is blue. The grass is green.", 1).unwrap();
        let successors = index.forward.get(&[w("is")]).unwrap();
        assert_eq!(successors.len(), 2);
        assert!(successors.contains(&Successor::Window(vec![w("blue")])));
        assert!(successors.contains(&Successor::Window(vec![w("green")])));
        assert_eq!(index.forward.get(&[w("The")]).unwrap().len(), 2);
    }

    #[test]
    fn every_key_and_window_has_gram_size_tokens() {
        let text = "Good evening, everybody. Tonight I want to talk about health care! \
                    Is it working? We will keep working, and we will not stop";
        for n in 1..=4 {
            let index = CorpusIndexer::build(text, n).unwrap();
            for table in [&index.forward, &index.backward] {
                for (key, successors) in table.iter() {
                    assert_eq!(key.len(), n);
                    assert!(!successors.is_empty());
                    for s in successors {
                        match s {
                            Successor::Window(tokens) => assert_eq!(tokens.len(), n),
                            Successor::Tail(tokens) => assert!(tokens.len() < n),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn casing_split_between_tables_and_counter() {
        let index = CorpusIndexer::build("We said no to Iran. We asked IRAN again.", 1).unwrap();
        assert!(index.vocabulary.contains_exact("iran"));
        assert!(!index.vocabulary.contains_exact("Iran"));
        assert!(index.vocabulary.contains("IRAN"));
        assert!(index.vocabulary.contains_exact("We"));
        assert_eq!(index.frequencies.count("Iran"), 1);
        assert_eq!(index.frequencies.count("IRAN"), 1);
        assert_eq!(index.frequencies.count("iran"), 0);
        assert_eq!(index.token_order[4], "Iran");
    }

    #[test]
    fn stats_are_counted() {
        let index = CorpusIndexer::build("The sky is blue. The grass is green.", 2).unwrap();
        assert_eq!(index.stats.num_sentences, 2);
        assert_eq!(index.stats.num_tokens, 10);
        assert_eq!(index.stats.unique_words, 6);
    }

    #[test]
    fn ron_round_trip_preserves_tables() {
        let index = CorpusIndexer::build("The sky is blue. The grass is green.", 2).unwrap();
        let serialized = ron::to_string(&index).unwrap();
        let restored: CorpusIndex = ron::from_str(&serialized).unwrap();
        assert!(restored.forward.same_transitions(&index.forward));
        assert!(restored.backward.same_transitions(&index.backward));
        assert_eq!(restored, index);
    }
}
