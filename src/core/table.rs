/// Transition tables: key windows mapped to the windows observed after them.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::schema::token::{contains_terminal, Token};

/// What follows a key in one corpus sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Successor {
    /// Exactly `gram_size` tokens.
    Window(Vec<Token>),
    /// The sentence ran out: fewer than `gram_size` tokens remained.
    Tail(Vec<Token>),
}

impl Successor {
    pub fn tokens(&self) -> &[Token] {
        match self {
            Self::Window(tokens) | Self::Tail(tokens) => tokens,
        }
    }

    pub fn is_tail(&self) -> bool {
        matches!(self, Self::Tail(_))
    }

    /// A successor that ends the walk is appended whole so its terminator
    /// survives.
    pub fn ends_walk(&self) -> bool {
        self.is_tail() || contains_terminal(self.tokens())
    }
}

/// Anything a walk can draw successors from.
pub trait TransitionSource {
    /// Length of every key.
    fn gram_size(&self) -> usize;

    fn keys(&self) -> Box<dyn Iterator<Item = &[Token]> + '_>;

    /// Draw one successor of `key`, reproducing the corpus distribution.
    fn sample(&self, key: &[Token], rng: &mut StdRng) -> Option<&Successor>;
}

/// Frequency-by-duplication table: a successor seen three times after a
/// key is stored three times, so a uniform draw is already weighted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionTable {
    gram_size: usize,
    entries: FxHashMap<Vec<Token>, Vec<Successor>>,
}

impl TransitionTable {
    pub fn new(gram_size: usize) -> Self {
        Self {
            gram_size,
            entries: FxHashMap::default(),
        }
    }

    pub fn gram_size(&self) -> usize {
        self.gram_size
    }

    /// Record one observation. Repeated keys accumulate, never overwrite.
    pub fn insert(&mut self, key: Vec<Token>, successor: Successor) {
        debug_assert_eq!(key.len(), self.gram_size);
        debug_assert!(successor.is_tail() || successor.tokens().len() == self.gram_size);
        self.entries.entry(key).or_default().push(successor);
    }

    pub fn get(&self, key: &[Token]) -> Option<&[Successor]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<Token>, &Vec<Successor>)> {
        self.entries.iter()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded observations across all keys.
    pub fn transition_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Equal as multisets of (key, successor list) pairs; successor order
    /// within a key is ignored.
    pub fn same_transitions(&self, other: &Self) -> bool {
        if self.gram_size != other.gram_size || self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries.iter().all(|(key, successors)| {
            other
                .entries
                .get(key)
                .is_some_and(|theirs| sorted(successors) == sorted(theirs))
        })
    }

    /// Collapse duplicates into explicit counts.
    pub fn to_weighted(&self) -> WeightedTable {
        let mut weighted = WeightedTable::new(self.gram_size);
        for (key, successors) in &self.entries {
            for successor in successors {
                weighted.add(key.clone(), successor.clone());
            }
        }
        weighted
    }
}

fn sorted(successors: &[Successor]) -> Vec<&Successor> {
    let mut refs: Vec<&Successor> = successors.iter().collect();
    refs.sort();
    refs
}

impl TransitionSource for TransitionTable {
    fn gram_size(&self) -> usize {
        self.gram_size
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &[Token]> + '_> {
        Box::new(self.entries.keys().map(Vec::as_slice))
    }

    fn sample(&self, key: &[Token], rng: &mut StdRng) -> Option<&Successor> {
        self.entries.get(key)?.choose(rng)
    }
}

/// Explicit-count table: `key → [(successor, count)]`.
///
/// Same behavior as [`TransitionTable`] with less memory on large corpora.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedTable {
    gram_size: usize,
    entries: FxHashMap<Vec<Token>, Vec<(Successor, u32)>>,
}

impl WeightedTable {
    pub fn new(gram_size: usize) -> Self {
        Self {
            gram_size,
            entries: FxHashMap::default(),
        }
    }

    /// Record one observation, incrementing the count if already present.
    pub fn add(&mut self, key: Vec<Token>, successor: Successor) {
        let entries = self.entries.entry(key).or_default();
        if let Some(entry) = entries.iter_mut().find(|(s, _)| s == &successor) {
            entry.1 += 1;
        } else {
            entries.push((successor, 1));
        }
    }

    pub fn get(&self, key: &[Token]) -> Option<&[(Successor, u32)]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of (successor, count) pairs across all keys.
    pub fn distinct_transitions(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Sum of counts under `key`; zero for unknown keys.
    pub fn total_weight(&self, key: &[Token]) -> u32 {
        self.get(key)
            .map(|options| options.iter().map(|(_, count)| count).sum())
            .unwrap_or(0)
    }
}

impl TransitionSource for WeightedTable {
    fn gram_size(&self) -> usize {
        self.gram_size
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &[Token]> + '_> {
        Box::new(self.entries.keys().map(Vec::as_slice))
    }

    fn sample(&self, key: &[Token], rng: &mut StdRng) -> Option<&Successor> {
        let options = self.entries.get(key)?;
        let dist = WeightedIndex::new(options.iter().map(|(_, count)| *count)).ok()?;
        Some(&options[dist.sample(rng)].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn w(text: &str) -> Token {
        Token::word(text)
    }

    fn sample_table() -> TransitionTable {
        let mut table = TransitionTable::new(1);
        table.insert(vec![w("sky")], Successor::Window(vec![w("is")]));
        table.insert(vec![w("grass")], Successor::Window(vec![w("is")]));
        table.insert(vec![w("is")], Successor::Window(vec![w("blue")]));
        table.insert(vec![w("is")], Successor::Window(vec![w("green")]));
        table.insert(vec![w("is")], Successor::Window(vec![w("blue")]));
        table
    }

    #[test]
    fn repeated_keys_accumulate() {
        let table = sample_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.transition_count(), 5);
        assert_eq!(table.get(&[w("is")]).unwrap().len(), 3);
    }

    #[test]
    fn ends_walk_on_terminal_or_tail() {
        assert!(Successor::Tail(vec![]).ends_walk());
        assert!(Successor::Window(vec![w("blue"), Token::punct(".")]).ends_walk());
        assert!(Successor::Window(vec![w("The")]).ends_walk());
        assert!(!Successor::Window(vec![w("blue"), w("sky")]).ends_walk());
    }

    #[test]
    fn weighted_counts_match_duplicates() {
        let weighted = sample_table().to_weighted();
        assert_eq!(weighted.len(), 3);
        assert_eq!(weighted.total_weight(&[w("is")]), 3);
        let options = weighted.get(&[w("is")]).unwrap();
        let blue = options
            .iter()
            .find(|(s, _)| s == &Successor::Window(vec![w("blue")]))
            .unwrap();
        assert_eq!(blue.1, 2);
        assert_eq!(weighted.distinct_transitions(), 4);
    }

    #[test]
    fn both_tables_sample_only_observed_successors() {
        let table = sample_table();
        let weighted = table.to_weighted();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let a = table.sample(&[w("is")], &mut rng).unwrap();
            let b = weighted.sample(&[w("is")], &mut rng).unwrap();
            for s in [a, b] {
                assert!(matches!(s.tokens()[0].text(), "blue" | "green"));
            }
        }
        assert!(table.sample(&[w("missing")], &mut rng).is_none());
        assert!(weighted.sample(&[w("missing")], &mut rng).is_none());
    }

    #[test]
    fn same_transitions_ignores_successor_order() {
        let a = sample_table();
        let mut b = TransitionTable::new(1);
        b.insert(vec![w("is")], Successor::Window(vec![w("blue")]));
        b.insert(vec![w("is")], Successor::Window(vec![w("blue")]));
        b.insert(vec![w("is")], Successor::Window(vec![w("green")]));
        b.insert(vec![w("grass")], Successor::Window(vec![w("is")]));
        b.insert(vec![w("sky")], Successor::Window(vec![w("is")]));
        assert!(a.same_transitions(&b));

        b.insert(vec![w("sky")], Successor::Window(vec![w("is")]));
        assert!(!a.same_transitions(&b));
    }
}
