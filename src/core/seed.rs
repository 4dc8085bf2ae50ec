/// Seed selection: resolve a user phrase to the word both walks grow from.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

use crate::core::index::Vocabulary;
use crate::schema::config::NeighborMap;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("input phrase has no candidate words")]
    NoSeed,
}

/// Characters removed from input before splitting.
const INPUT_STRIP: &[char] = &['?', '.', ',', '!'];

/// Lowercase, drop `? . , !`, split on whitespace.
pub fn normalize_input(input: &str) -> Vec<String> {
    input
        .to_lowercase()
        .replace(INPUT_STRIP, "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub struct SeedSelector;

impl SeedSelector {
    /// Pick one anchor word from `input`.
    ///
    /// Candidates come from the first non-empty tier: priority words, then
    /// non-stopwords, then every word. A candidate missing from the
    /// vocabulary is swapped for a random in-vocabulary neighbor;
    /// `Ok(None)` means no such neighbor exists.
    pub fn select(
        input: &str,
        priority: &FxHashSet<String>,
        stopwords: &FxHashSet<String>,
        vocabulary: &Vocabulary,
        neighbors: &NeighborMap,
        rng: &mut StdRng,
    ) -> Result<Option<String>, SeedError> {
        let words = normalize_input(input);

        let prioritized: Vec<&String> = words.iter().filter(|w| priority.contains(*w)).collect();
        let content: Vec<&String> = words.iter().filter(|w| !stopwords.contains(*w)).collect();
        let everything: Vec<&String> = words.iter().collect();

        let tier = [prioritized, content, everything]
            .into_iter()
            .find(|tier| !tier.is_empty())
            .ok_or(SeedError::NoSeed)?;
        let candidate = tier.choose(rng).ok_or(SeedError::NoSeed)?;

        if vocabulary.contains(candidate) {
            debug!(seed = %candidate, "seed selected");
            return Ok(Some(candidate.to_string()));
        }

        let repaired = Self::neighbor(candidate, vocabulary, neighbors, rng);
        debug!(candidate = %candidate, neighbor = ?repaired, "seed outside vocabulary");
        Ok(repaired)
    }

    /// A random neighbor of `word` that the corpus actually contains.
    fn neighbor(
        word: &str,
        vocabulary: &Vocabulary,
        neighbors: &NeighborMap,
        rng: &mut StdRng,
    ) -> Option<String> {
        let survivors: Vec<&String> = neighbors
            .get(word)?
            .iter()
            .filter(|n| vocabulary.contains(n))
            .collect();
        survivors.choose(rng).map(|n| n.to_lowercase())
    }
}
