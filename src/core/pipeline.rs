/// The generation pipeline: phrase → seed → walks → sentence → true-case.
///
/// Wires together seed selection, both chain walks, assembly and
/// true-casing, and turns recoverable failures into fallback sentences.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::assembler::SentenceAssembler;
use crate::core::index::{load_index, CorpusIndex, CorpusIndexer, IndexError};
use crate::core::seed::{SeedError, SeedSelector};
use crate::core::table::WeightedTable;
use crate::core::truecase::TrueCaser;
use crate::core::walker::WalkError;
use crate::schema::config::{ConfigError, GeneratorConfig, NeighborMap, WalkParams};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("seed error: {0}")]
    Seed(#[from] SeedError),
    #[error("walk error: {0}")]
    Walk(#[from] WalkError),
    #[error("no in-vocabulary seed or neighbor for {0:?}")]
    Unresolved(String),
    #[error("no corpus or index was supplied")]
    MissingIndex,
}

impl PipelineError {
    /// Recoverable errors are answered with a fallback sentence; the rest
    /// are configuration or startup failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Seed(_) | Self::Walk(_) | Self::Unresolved(_))
    }
}

/// Explicit-count copies of both tables.
struct WeightedTables {
    forward: WeightedTable,
    backward: WeightedTable,
}

/// The top-level generator. Built via `PasticheEngine::builder()`.
///
/// The index is never mutated after build, so `generate_with_rng` can be
/// called through a shared reference with a per-request RNG.
pub struct PasticheEngine {
    index: CorpusIndex,
    config: GeneratorConfig,
    neighbors: NeighborMap,
    priority: FxHashSet<String>,
    stopwords: FxHashSet<String>,
    weighted: Option<WeightedTables>,
    seed: u64,
    generation_count: u64,
}

/// Builder for constructing a `PasticheEngine`.
pub struct PasticheEngineBuilder {
    corpus_path: Option<String>,
    index_path: Option<String>,
    config_path: Option<String>,
    neighbors_path: Option<String>,
    weighted: bool,
    seed: u64,
    /// Directly provided corpus text (for testing without files).
    corpus_text: Option<String>,
    /// Directly provided index (for testing without files).
    index: Option<CorpusIndex>,
    /// Directly provided config (for testing without files).
    config: Option<GeneratorConfig>,
    /// Directly provided neighbor map (for testing without files).
    neighbors: Option<NeighborMap>,
}

impl PasticheEngine {
    pub fn builder() -> PasticheEngineBuilder {
        PasticheEngineBuilder {
            corpus_path: None,
            index_path: None,
            config_path: None,
            neighbors_path: None,
            weighted: false,
            seed: 0,
            corpus_text: None,
            index: None,
            config: None,
            neighbors: None,
        }
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one sentence for `input` with explicit gram sizes.
    ///
    /// Each call draws from a fresh RNG derived from the engine seed and a
    /// generation counter, so a given engine seed replays the same
    /// sequence of outputs.
    pub fn generate(
        &mut self,
        input: &str,
        key_gram_size: usize,
        value_gram_size: usize,
    ) -> Result<String, PipelineError> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.generation_count));
        self.generation_count += 1;
        self.generate_with_rng(input, key_gram_size, value_gram_size, &mut rng)
    }

    /// Generate using the configured gram sizes.
    pub fn generate_default(&mut self, input: &str) -> Result<String, PipelineError> {
        let (key, value) = (self.config.key_gram_size, self.config.value_gram_size);
        self.generate(input, key, value)
    }

    /// Generate `count` sentences for the same phrase.
    pub fn generate_variants(
        &mut self,
        input: &str,
        count: usize,
    ) -> Result<Vec<String>, PipelineError> {
        let mut results = Vec::with_capacity(count);
        for _ in 0..count {
            results.push(self.generate_default(input)?);
        }
        Ok(results)
    }

    /// Generate with a caller-owned RNG.
    ///
    /// Invalid gram sizes are returned as errors; every other failure
    /// yields one of the configured fallback sentences verbatim.
    pub fn generate_with_rng(
        &self,
        input: &str,
        key_gram_size: usize,
        value_gram_size: usize,
        rng: &mut StdRng,
    ) -> Result<String, PipelineError> {
        let params = WalkParams::new(
            key_gram_size,
            value_gram_size,
            self.index.gram_size,
            self.config.max_steps,
        )?;

        match self.compose(input, &params, rng) {
            Ok(sentence) => Ok(sentence),
            Err(e) if e.is_recoverable() => {
                warn!(input, error = %e, "generation failed, using fallback sentence");
                Ok(self.fallback(rng))
            }
            Err(e) => Err(e),
        }
    }

    /// Run the full pipeline without fallback handling.
    pub fn compose(
        &self,
        input: &str,
        params: &WalkParams,
        rng: &mut StdRng,
    ) -> Result<String, PipelineError> {
        let seed = SeedSelector::select(
            input,
            &self.priority,
            &self.stopwords,
            &self.index.vocabulary,
            &self.neighbors,
            rng,
        )?
        .ok_or_else(|| PipelineError::Unresolved(input.to_string()))?;

        let tokens = match &self.weighted {
            Some(tables) => {
                SentenceAssembler::assemble(&seed, &tables.forward, &tables.backward, params, rng)?
            }
            None => SentenceAssembler::assemble(
                &seed,
                &self.index.forward,
                &self.index.backward,
                params,
                rng,
            )?,
        };

        let sentence = TrueCaser::from_index(&self.index).truecase(&tokens);
        debug!(input, seed = %seed, sentence = %sentence, "generated");
        Ok(sentence)
    }

    fn fallback(&self, rng: &mut StdRng) -> String {
        // validate() guarantees at least one entry
        self.config
            .fallback_sentences
            .choose(rng)
            .cloned()
            .unwrap_or_default()
    }
}

impl PasticheEngineBuilder {
    /// Corpus text file to index at build time.
    pub fn corpus_path(mut self, path: &str) -> Self {
        self.corpus_path = Some(path.to_string());
        self
    }

    /// Previously saved RON index; takes precedence over a corpus file.
    pub fn index_path(mut self, path: &str) -> Self {
        self.index_path = Some(path.to_string());
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn neighbors_path(mut self, path: &str) -> Self {
        self.neighbors_path = Some(path.to_string());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sample from explicit-count tables instead of duplicated entries.
    pub fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    /// Provide corpus text directly (for testing without files).
    pub fn with_corpus_text(mut self, text: &str) -> Self {
        self.corpus_text = Some(text.to_string());
        self
    }

    /// Provide an index directly (for testing without files).
    pub fn with_index(mut self, index: CorpusIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Provide a config directly (for testing without files).
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide a neighbor map directly (for testing without files).
    pub fn with_neighbors(mut self, neighbors: NeighborMap) -> Self {
        self.neighbors = Some(neighbors);
        self
    }

    pub fn build(self) -> Result<PasticheEngine, PipelineError> {
        let config = match (self.config, &self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => GeneratorConfig::load_from_ron(Path::new(path))?,
            (None, None) => GeneratorConfig::default(),
        };
        config.validate()?;

        let neighbors = match (self.neighbors, &self.neighbors_path) {
            (Some(neighbors), _) => neighbors,
            (None, Some(path)) => NeighborMap::load_from_ron(Path::new(path))?,
            (None, None) => NeighborMap::default(),
        };

        let index = if let Some(index) = self.index {
            index
        } else if let Some(ref path) = self.index_path {
            load_index(Path::new(path))?
        } else if let Some(ref text) = self.corpus_text {
            CorpusIndexer::build(text, config.chain_len)?
        } else if let Some(ref path) = self.corpus_path {
            CorpusIndex::from_path(Path::new(path), config.chain_len)?
        } else {
            return Err(PipelineError::MissingIndex);
        };

        // A restored index fixes the chain length; the configured gram
        // sizes must still fit inside it.
        if index.gram_size != config.chain_len {
            warn!(
                index_gram_size = index.gram_size,
                config_chain_len = config.chain_len,
                "index gram size overrides configured chain length"
            );
        }
        WalkParams::new(
            config.key_gram_size,
            config.value_gram_size,
            index.gram_size,
            config.max_steps,
        )?;

        let weighted = self.weighted.then(|| WeightedTables {
            forward: index.forward.to_weighted(),
            backward: index.backward.to_weighted(),
        });

        info!(
            gram_size = index.gram_size,
            vocabulary = index.vocabulary.len(),
            neighbors = neighbors.len(),
            weighted = weighted.is_some(),
            "engine ready"
        );

        Ok(PasticheEngine {
            priority: config.priority_set(),
            stopwords: config.stopword_set(),
            index,
            config,
            neighbors,
            weighted,
            seed: self.seed,
            generation_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKY: &str = "The sky is blue. The grass is green.";

    fn sky_config() -> GeneratorConfig {
        GeneratorConfig {
            chain_len: 1,
            key_gram_size: 1,
            value_gram_size: 1,
            fallback_sentences: vec!["Nothing comes to mind.".to_string()],
            ..GeneratorConfig::default()
        }
    }

    fn build_sky_engine() -> PasticheEngine {
        PasticheEngine::builder()
            .seed(42)
            .with_corpus_text(SKY)
            .with_config(sky_config())
            .build()
            .unwrap()
    }

    #[test]
    fn generates_sentence_around_seed() {
        let mut engine = build_sky_engine();
        for _ in 0..10 {
            let sentence = engine.generate("sky", 1, 1).unwrap();
            assert!(
                sentence == "The sky is blue." || sentence == "The sky is green.",
                "got {}",
                sentence
            );
        }
    }

    #[test]
    fn unknown_word_returns_fallback() {
        let mut engine = build_sky_engine();
        let sentence = engine.generate("volcano", 1, 1).unwrap();
        assert_eq!(sentence, "Nothing comes to mind.");
    }

    #[test]
    fn empty_input_returns_fallback() {
        let mut engine = build_sky_engine();
        assert_eq!(engine.generate("?!", 1, 1).unwrap(), "Nothing comes to mind.");
    }

    #[test]
    fn empty_corpus_returns_fallback() {
        let mut engine = PasticheEngine::builder()
            .with_corpus_text("")
            .with_config(sky_config())
            .build()
            .unwrap();
        assert_eq!(engine.generate("sky", 1, 1).unwrap(), "Nothing comes to mind.");
    }

    #[test]
    fn endless_cycle_returns_fallback() {
        use crate::core::index::{CorpusStats, FrequencyCounter};
        use crate::core::table::{Successor, TransitionTable};
        use crate::schema::token::Token;

        let mut table = TransitionTable::new(1);
        table.insert(vec![Token::word("round")], Successor::Window(vec![Token::word("and")]));
        table.insert(vec![Token::word("and")], Successor::Window(vec![Token::word("round")]));
        let index = CorpusIndex {
            gram_size: 1,
            forward: table.clone(),
            backward: table,
            vocabulary: ["round", "and"].into_iter().collect(),
            frequencies: FrequencyCounter::default(),
            token_order: Vec::new(),
            stats: CorpusStats::default(),
        };
        let mut engine = PasticheEngine::builder()
            .with_index(index)
            .with_config(GeneratorConfig {
                max_steps: 10,
                ..sky_config()
            })
            .build()
            .unwrap();
        assert_eq!(engine.generate("round", 1, 1).unwrap(), "Nothing comes to mind.");
    }

    #[test]
    fn opener_only_word_returns_fallback() {
        // "Nobody" is in the vocabulary but only as a sentence opener, so no
        // key holds the lowercase seed.
        let mut engine = PasticheEngine::builder()
            .with_corpus_text("Nobody came.")
            .with_config(sky_config())
            .build()
            .unwrap();
        assert!(engine.index().vocabulary.contains("nobody"));
        assert_eq!(engine.generate("nobody", 1, 1).unwrap(), "Nothing comes to mind.");
    }

    #[test]
    fn neighbor_rescues_unknown_word() {
        let mut neighbors = NeighborMap::new();
        neighbors.insert("lawn", vec!["turf".to_string(), "grass".to_string()]);
        let mut engine = PasticheEngine::builder()
            .with_corpus_text(SKY)
            .with_config(sky_config())
            .with_neighbors(neighbors)
            .build()
            .unwrap();
        let sentence = engine.generate("lawn", 1, 1).unwrap();
        assert!(sentence.starts_with("The grass is "), "got {}", sentence);
    }

    #[test]
    fn bad_gram_sizes_are_errors() {
        let mut engine = build_sky_engine();
        assert!(matches!(
            engine.generate("sky", 2, 1),
            Err(PipelineError::Config(ConfigError::InvalidGramSize { .. }))
        ));
        assert!(matches!(
            engine.generate("sky", 1, 0),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn build_requires_a_corpus() {
        let result = PasticheEngine::builder().build();
        assert!(matches!(result, Err(PipelineError::MissingIndex)));
    }

    #[test]
    fn build_rejects_oversized_key_for_index() {
        let index = CorpusIndexer::build(SKY, 1).unwrap();
        let result = PasticheEngine::builder()
            .with_index(index)
            .with_config(GeneratorConfig::default())
            .build();
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn same_seed_same_outputs() {
        let corpus = "The cat sat on the mat. The dog sat on the rug. A cat ran to the dog.";
        let config = GeneratorConfig {
            chain_len: 2,
            key_gram_size: 1,
            value_gram_size: 1,
            ..GeneratorConfig::default()
        };
        let build = || {
            PasticheEngine::builder()
                .seed(7)
                .with_corpus_text(corpus)
                .with_config(config.clone())
                .build()
                .unwrap()
        };
        let mut a = build();
        let mut b = build();
        assert_eq!(
            a.generate_variants("cat", 5).unwrap(),
            b.generate_variants("cat", 5).unwrap()
        );
    }

    #[test]
    fn weighted_engine_generates() {
        let mut engine = PasticheEngine::builder()
            .with_corpus_text(SKY)
            .with_config(sky_config())
            .weighted(true)
            .build()
            .unwrap();
        let sentence = engine.generate("grass", 1, 1).unwrap();
        assert!(sentence.starts_with("The grass is "), "got {}", sentence);
        assert!(sentence.ends_with('.'));
    }

    #[test]
    fn recoverable_classification() {
        assert!(PipelineError::Seed(SeedError::NoSeed).is_recoverable());
        assert!(PipelineError::Walk(WalkError::Timeout(5)).is_recoverable());
        assert!(PipelineError::Unresolved("x".to_string()).is_recoverable());
        assert!(!PipelineError::MissingIndex.is_recoverable());
        assert!(!PipelineError::Config(ConfigError::ZeroStepBudget).is_recoverable());
    }
}
