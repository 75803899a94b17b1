/// Compiled grammars — error types, limits, compilation, and generation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::expand::{ExpansionError, Expander, TraceStep};
use crate::core::postprocess::normalize;
use crate::core::random::RandomSource;
use crate::core::table::{self, Table};
use crate::core::{preprocess, unfold};
use crate::schema::symbol::Symbol;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid symbol name: {0}, must be $ followed by letters, digits or _")]
    InvalidSymbolName(String),
    #[error("no content for symbol {0}")]
    EmptyProduction(Symbol),
    #[error("missing starting symbol: $s")]
    MissingStartSymbol,
    #[error("symbol {0} is defined more than once")]
    DuplicateSymbol(Symbol),
    #[error("symbol {symbol} forces undefined symbol {reference}")]
    UndefinedForcedReference { symbol: Symbol, reference: Symbol },
    /// `path` holds the forced references that lead back to an earlier
    /// symbol; it is empty when the pass limit ran out first.
    #[error("forced substitution in {symbol} never settles: {}", describe_unfold_cycle(.passes, .path))]
    UnfoldCycle {
        symbol: Symbol,
        passes: usize,
        path: Vec<Symbol>,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_unfold_cycle(passes: &usize, path: &[Symbol]) -> String {
    if path.is_empty() {
        return format!("gave up after {} passes", passes);
    }
    let names: Vec<&str> = path.iter().map(Symbol::as_str).collect();
    format!("cycle {}", names.join(" > "))
}

/// Bounds that keep compilation and expansion finite on cyclic input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarLimits {
    /// Deepest allowed chain of nested symbol expansions.
    pub max_expansion_depth: usize,
    /// Passes the unfolder may spend on one symbol.
    pub max_unfold_passes: usize,
}

impl Default for GrammarLimits {
    fn default() -> Self {
        Self {
            max_expansion_depth: 256,
            max_unfold_passes: 64,
        }
    }
}

/// A compiled grammar: the expansion table plus its start symbol.
///
/// Immutable once compiled. Every generation walks the table afresh, so
/// one grammar can serve any number of calls, from any number of threads.
#[derive(Debug, Clone)]
pub struct Grammar {
    table: Table,
    start: Symbol,
    limits: GrammarLimits,
}

impl Grammar {
    /// Compile grammar source with the default limits.
    pub fn compile(source: &str) -> Result<Grammar, GrammarError> {
        Self::compile_with(source, GrammarLimits::default())
    }

    /// Desugar groups, build the table, and resolve forced substitutions.
    pub fn compile_with(source: &str, limits: GrammarLimits) -> Result<Grammar, GrammarError> {
        let desugared = preprocess::desugar(source);
        let mut table = table::parse(&desugared)?;
        unfold::unfold_all(&mut table, limits.max_unfold_passes)?;

        Ok(Grammar {
            table,
            start: Symbol::start(),
            limits,
        })
    }

    /// Load and compile a grammar file.
    pub fn load_from_file(path: &Path) -> Result<Grammar, GrammarError> {
        Self::load_from_file_with(path, GrammarLimits::default())
    }

    pub fn load_from_file_with(path: &Path, limits: GrammarLimits) -> Result<Grammar, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::compile_with(&contents, limits)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn start(&self) -> &Symbol {
        &self.start
    }

    pub fn limits(&self) -> GrammarLimits {
        self.limits
    }

    /// Render one random instantiation of the start symbol.
    pub fn generate<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<String, ExpansionError> {
        self.generate_from(&self.start, rng)
    }

    /// Render one random instantiation of any symbol.
    pub fn generate_from<R: RandomSource + ?Sized>(
        &self,
        symbol: &Symbol,
        rng: &mut R,
    ) -> Result<String, ExpansionError> {
        let raw = self.expand_raw(symbol, rng)?;
        Ok(finish(&raw))
    }

    /// Expand without postprocessing: whitespace runs and `^`/`\` markers
    /// are still in the result.
    pub fn expand_raw<R: RandomSource + ?Sized>(
        &self,
        symbol: &Symbol,
        rng: &mut R,
    ) -> Result<String, ExpansionError> {
        Expander::new(&self.table, self.limits.max_expansion_depth).expand(symbol, rng)
    }

    /// Like [`Grammar::generate`], also returning every symbol visit.
    pub fn generate_traced<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(String, Vec<TraceStep>), ExpansionError> {
        let mut expander = Expander::new(&self.table, self.limits.max_expansion_depth).traced();
        let raw = expander.expand(&self.start, rng)?;
        Ok((finish(&raw), expander.take_trace()))
    }
}

/// Postprocess and drop whitespace left at the ends by empty expansions.
fn finish(raw: &str) -> String {
    normalize(raw).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn outcomes(source: &str, trials: u64) -> HashSet<String> {
        let grammar = Grammar::compile(source).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        (0..trials).map(|_| grammar.generate(&mut rng).unwrap()).collect()
    }

    #[test]
    fn two_alternatives() {
        let seen = outcomes("$s = cat|dog;", 100);
        let expected: HashSet<String> = ["cat", "dog"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn optional_group_both_branches() {
        let seen = outcomes("$s = the [big ]dog;", 200);
        let expected: HashSet<String> =
            ["the dog", "the big dog"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn glued_optional_group() {
        let seen = outcomes("$s = [re]do it;", 200);
        let expected: HashSet<String> = ["redo it", "do it"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn independent_occurrences() {
        let seen = outcomes("$s = $a $a; $a = x|y;", 400);
        for pair in ["x x", "x y", "y x", "y y"] {
            assert!(seen.contains(pair), "never saw {:?}", pair);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn forced_substitution_is_resolved_at_compile_time() {
        let source = "$s = >$c hat; $c = red|blue;";
        let grammar = Grammar::compile(source).unwrap();
        let s = grammar.table().get("$s").unwrap();
        let alternatives: Vec<String> = s.alternatives().iter().map(ToString::to_string).collect();
        assert_eq!(alternatives, vec!["red hat", "blue hat"]);

        let seen = outcomes(source, 100);
        let expected: HashSet<String> = ["red hat", "blue hat"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn two_forced_references_cross() {
        let seen = outcomes("$s = >$c hat, >$c scarf; $c = red|blue;", 400);
        let expected: HashSet<String> = [
            "red hat, red scarf",
            "red hat, blue scarf",
            "blue hat, red scarf",
            "blue hat, blue scarf",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn postprocessing_applies() {
        let seen = outcomes("$s = \\hello , world ^s !;", 5);
        assert_eq!(seen.len(), 1);
        assert!(seen.contains("Hello, worlds!"));
    }

    #[test]
    fn missing_start_symbol() {
        assert!(matches!(
            Grammar::compile("$a = x;"),
            Err(GrammarError::MissingStartSymbol)
        ));
    }

    #[test]
    fn undefined_symbol_reports_stack() {
        let grammar = Grammar::compile("$s = $missing;").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        match grammar.generate(&mut rng) {
            Err(ExpansionError::UndefinedSymbol { symbol, stack }) => {
                assert_eq!(symbol.as_str(), "$missing");
                assert!(stack.contains(&Symbol::start()));
            }
            other => panic!("expected UndefinedSymbol, got {:?}", other),
        }
    }

    #[test]
    fn grammar_survives_runtime_error() {
        let grammar = Grammar::compile("$s = ok|$missing;").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ok = 0;
        let mut failed = 0;
        for _ in 0..100 {
            match grammar.generate(&mut rng) {
                Ok(text) => {
                    assert_eq!(text, "ok");
                    ok += 1;
                }
                Err(_) => failed += 1,
            }
        }
        assert!(ok > 0 && failed > 0);
    }

    #[test]
    fn cyclic_grammar_is_reported() {
        let limits = GrammarLimits {
            max_expansion_depth: 32,
            ..GrammarLimits::default()
        };
        let grammar = Grammar::compile_with("$s = $a; $a = x $s;", limits).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        match grammar.generate(&mut rng) {
            Err(ExpansionError::CyclicGrammar { depth, stack, .. }) => {
                assert_eq!(depth, 32);
                assert_eq!(stack.len(), 32);
            }
            other => panic!("expected CyclicGrammar, got {:?}", other),
        }
    }

    #[test]
    fn same_seed_same_output() {
        let grammar = Grammar::compile("$s = $a $a $a; $a = a|b|c|d|e;").unwrap();
        let mut rng1 = StdRng::seed_from_u64(2024);
        let mut rng2 = StdRng::seed_from_u64(2024);
        for _ in 0..10 {
            assert_eq!(
                grammar.generate(&mut rng1).unwrap(),
                grammar.generate(&mut rng2).unwrap()
            );
        }
    }

    #[test]
    fn expand_raw_keeps_markup() {
        let grammar = Grammar::compile("$s = a  ,^ b;").unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(grammar.expand_raw(grammar.start(), &mut rng).unwrap(), "a  ,^ b");
        assert_eq!(grammar.generate(&mut rng).unwrap(), "a,b");
    }

    #[test]
    fn traced_generation() {
        let grammar = Grammar::compile("$s = $a; $a = x;").unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let (text, trace) = grammar.generate_traced(&mut rng).unwrap();
        assert_eq!(text, "x");
        let visited: Vec<&str> = trace.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(visited, vec!["$s", "$a"]);
        assert_eq!(trace[1].depth, 1);
    }

    #[test]
    fn grammar_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Grammar>();
    }

    #[test]
    fn load_fixture_file() {
        let path = std::path::PathBuf::from("tests/fixtures/animals.pg");
        let grammar = Grammar::load_from_file(&path).unwrap();
        assert!(grammar.table().contains("$animal"));
    }

    #[test]
    fn load_missing_file() {
        let path = std::path::PathBuf::from("tests/fixtures/does_not_exist.pg");
        assert!(matches!(
            Grammar::load_from_file(&path),
            Err(GrammarError::Io(_))
        ));
    }
}
