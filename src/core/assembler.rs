/// Sentence assembly: stitch a backward and a forward walk around one seed.

use rand::rngs::StdRng;
use tracing::debug;

use crate::core::table::TransitionSource;
use crate::core::walker::{ChainWalker, WalkError};
use crate::schema::config::WalkParams;
use crate::schema::token::Token;

pub struct SentenceAssembler;

impl SentenceAssembler {
    /// Walk forward and backward from `seed` and merge the halves into one
    /// left-to-right token sequence containing the seed once.
    ///
    /// Trailing punctuation stays a separate `Punct` token; the true-caser
    /// renders it flush against the last word.
    pub fn assemble<T: TransitionSource + ?Sized>(
        seed: &str,
        forward: &T,
        backward: &T,
        params: &WalkParams,
        rng: &mut StdRng,
    ) -> Result<Vec<Token>, WalkError> {
        let tail = ChainWalker::walk(seed, forward, params, rng)?;
        let mut head = ChainWalker::walk(seed, backward, params, rng)?;
        debug!(seed, head = head.len(), tail = tail.len(), "walks complete");

        // Backward output reads seed-first; flip it and drop the seed,
        // which the forward half already opens with.
        head.reverse();
        head.pop();
        head.extend(tail);

        Ok(tidy(head))
    }
}

/// Drop padding and keep only the final punctuation run.
fn tidy(tokens: Vec<Token>) -> Vec<Token> {
    let last = tokens.len().saturating_sub(1);
    tokens
        .into_iter()
        .enumerate()
        .filter(|(i, token)| match token {
            Token::Boundary => false,
            Token::Punct(_) => *i == last,
            Token::Word(_) => true,
        })
        .map(|(_, token)| token)
        .collect()
}
