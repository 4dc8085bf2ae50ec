//! Markov Pastiche: seeded sentence generation from a fixed corpus.
//!
//! Builds forward and backward n-gram transition tables from a corpus,
//! resolves a user phrase to a seed word, random-walks outward from it in
//! both directions, and restores capitalization from corpus statistics.

pub mod core;
pub mod schema;
