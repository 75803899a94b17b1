/// The generation engine: a compiled grammar plus its random source.
///
/// Wires together configuration, compilation (desugar, table, unfold),
/// and seeded generation behind one builder.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::config::EngineConfig;
use crate::core::expand::{ExpansionError, TraceStep};
use crate::core::grammar::{Grammar, GrammarError};
use crate::schema::symbol::Symbol;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("expansion error: {0}")]
    Expansion(#[from] ExpansionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("no grammar source, file, or config grammar path given")]
    NoGrammar,
}

/// The top-level engine. Built via `Polygen::builder()`.
pub struct Polygen {
    grammar: Grammar,
    rng: StdRng,
    seed: Option<u64>,
    generation_count: u64,
}

/// Builder for constructing a `Polygen`.
///
/// Explicit builder values win over the config file, which wins over the
/// defaults.
#[derive(Default)]
pub struct PolygenBuilder {
    source: Option<String>,
    grammar_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    seed: Option<u64>,
    max_expansion_depth: Option<usize>,
    max_unfold_passes: Option<usize>,
    /// Directly provided config (for testing without files).
    config: Option<EngineConfig>,
    /// Directly provided grammar, used as compiled.
    grammar: Option<Grammar>,
}

impl Polygen {
    pub fn builder() -> PolygenBuilder {
        PolygenBuilder::default()
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The seed in use, if the engine was seeded.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Successful generations since build or the last reseed.
    pub fn generation_count(&self) -> u64 {
        self.generation_count
    }

    /// Generate one sentence from `$s`.
    pub fn generate(&mut self) -> Result<String, EngineError> {
        let text = self.grammar.generate(&mut self.rng)?;
        self.generation_count += 1;
        Ok(text)
    }

    /// Generate from any symbol of the table, e.g. `"$name"`.
    pub fn generate_from(&mut self, symbol: &str) -> Result<String, EngineError> {
        let symbol = Symbol::parse(symbol)
            .ok_or_else(|| GrammarError::InvalidSymbolName(symbol.to_string()))?;
        let text = self.grammar.generate_from(&symbol, &mut self.rng)?;
        self.generation_count += 1;
        Ok(text)
    }

    /// Generate `count` sentences in sequence. Stops at the first error.
    pub fn generate_variants(&mut self, count: usize) -> Result<Vec<String>, EngineError> {
        let mut results = Vec::with_capacity(count);
        for _ in 0..count {
            results.push(self.generate()?);
        }
        Ok(results)
    }

    /// Generate one sentence along with the symbol visits that produced it.
    pub fn generate_traced(&mut self) -> Result<(String, Vec<TraceStep>), EngineError> {
        let result = self.grammar.generate_traced(&mut self.rng)?;
        self.generation_count += 1;
        Ok(result)
    }

    /// Restart the random sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = Some(seed);
        self.generation_count = 0;
    }
}

impl PolygenBuilder {
    /// Grammar source text.
    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn grammar_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.grammar_file = Some(path.into());
        self
    }

    /// RON engine config, see [`EngineConfig`].
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Provide config directly (for testing without files).
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = Some(depth);
        self
    }

    pub fn max_unfold_passes(mut self, passes: usize) -> Self {
        self.max_unfold_passes = Some(passes);
        self
    }

    /// Provide a compiled grammar. It keeps the limits it was compiled
    /// with.
    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn build(self) -> Result<Polygen, EngineError> {
        let config = match (self.config, &self.config_file) {
            (Some(config), _) => config,
            (None, Some(path)) => EngineConfig::load_from_ron(path)?,
            (None, None) => EngineConfig::default(),
        };

        let mut limits = config.limits();
        if let Some(depth) = self.max_expansion_depth {
            limits.max_expansion_depth = depth;
        }
        if let Some(passes) = self.max_unfold_passes {
            limits.max_unfold_passes = passes;
        }

        let grammar = if let Some(grammar) = self.grammar {
            grammar
        } else if let Some(ref source) = self.source {
            Grammar::compile_with(source, limits)?
        } else if let Some(ref path) = self.grammar_file {
            Grammar::load_from_file_with(path, limits)?
        } else if let Some(ref path) = config.grammar {
            Grammar::load_from_file_with(path, limits)?
        } else {
            return Err(EngineError::NoGrammar);
        };

        let seed = self.seed.or(config.seed);
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Polygen {
            grammar,
            rng,
            seed,
            generation_count: 0,
        })
    }
}
