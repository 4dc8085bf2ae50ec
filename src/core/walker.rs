/// Chain walker: bounded random walk from a seed word to a terminal token.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use crate::core::table::TransitionSource;
use crate::schema::config::WalkParams;
use crate::schema::token::{contains_terminal, Token};

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("no key contains seed {0:?}")]
    NoMatch(String),
    #[error("walk exceeded {0} steps without reaching a terminal token")]
    Timeout(usize),
}

pub struct ChainWalker;

impl ChainWalker {
    /// Expand `seed` through `table` until the working text holds a
    /// terminal token, the path runs out, or the step budget is spent.
    ///
    /// The returned tokens start with the seed. Direction is whatever the
    /// table encodes: a backward table yields the sentence head reversed.
    pub fn walk<T: TransitionSource + ?Sized>(
        seed: &str,
        table: &T,
        params: &WalkParams,
        rng: &mut StdRng,
    ) -> Result<Vec<Token>, WalkError> {
        debug_assert_eq!(params.chain_len, table.gram_size());
        let key = Self::acquire_key(seed, table, params.key_gram_size, rng)?;
        let start = key.len() - params.key_gram_size;

        // The key's leading tokens stay in `history` so lookups always
        // have a full chain_len window, even while the output is short.
        let mut history = key.clone();
        let mut current = key;
        let mut steps = 0;

        while !contains_terminal(&history[start..]) {
            if steps >= params.max_steps {
                debug!(seed, steps, "walk timed out");
                return Err(WalkError::Timeout(params.max_steps));
            }
            steps += 1;

            let Some(successor) = table.sample(&current, rng) else {
                debug!(seed, steps, "path exhausted");
                break;
            };

            if successor.ends_walk() {
                history.extend(successor.tokens().iter().cloned());
            } else {
                history.extend(
                    successor
                        .tokens()
                        .iter()
                        .take(params.value_gram_size)
                        .cloned(),
                );
            }

            if successor.is_tail() {
                break;
            }

            let from = history.len().saturating_sub(params.chain_len);
            current = history[from..].to_vec();
        }

        Ok(history.split_off(start))
    }

    /// A random key holding `seed` at `key_gram_size` tokens from its end.
    ///
    /// Candidates are sorted first so a seeded RNG picks the same key no
    /// matter how the table's hash map is laid out.
    fn acquire_key<T: TransitionSource + ?Sized>(
        seed: &str,
        table: &T,
        key_gram_size: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<Token>, WalkError> {
        let mut candidates: Vec<&[Token]> = table
            .keys()
            .filter(|key| {
                key.len()
                    .checked_sub(key_gram_size)
                    .is_some_and(|pos| key[pos].is_word_eq(seed))
            })
            .collect();
        candidates.sort_unstable();

        candidates
            .choose(rng)
            .map(|key| key.to_vec())
            .ok_or_else(|| WalkError::NoMatch(seed.to_string()))
    }
}
