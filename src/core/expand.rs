/// Stochastic expansion of a symbol into raw text.

use serde::Serialize;
use thiserror::Error;

use crate::core::random::RandomSource;
use crate::core::table::Table;
use crate::schema::alternative::Segment;
use crate::schema::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    #[error("cannot visit undefined symbol {symbol} (stack: {})", format_stack(.stack))]
    UndefinedSymbol { symbol: Symbol, stack: Vec<Symbol> },
    #[error("expanding {symbol} exceeded the maximum depth of {depth} (stack: {})", format_stack(.stack))]
    CyclicGrammar {
        symbol: Symbol,
        depth: usize,
        stack: Vec<Symbol>,
    },
}

fn format_stack(stack: &[Symbol]) -> String {
    if stack.is_empty() {
        return "empty".to_string();
    }
    stack
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(" > ")
}

/// One symbol visit during a traced expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    /// Number of enclosing symbols.
    pub depth: usize,
    pub symbol: Symbol,
    /// Index of the chosen alternative.
    pub choice: usize,
    /// How many alternatives there were to choose from.
    pub alternatives: usize,
}

/// Walks a table from a symbol to terminal text.
///
/// References are resolved depth first, left to right, each occurrence
/// with its own random choice. The stack of symbols being expanded is kept
/// for diagnostics, and its length is the recursion depth that
/// `max_depth` bounds.
pub struct Expander<'t> {
    table: &'t Table,
    max_depth: usize,
    stack: Vec<Symbol>,
    trace: Option<Vec<TraceStep>>,
}

impl<'t> Expander<'t> {
    pub fn new(table: &'t Table, max_depth: usize) -> Self {
        Self {
            table,
            max_depth,
            stack: Vec::new(),
            trace: None,
        }
    }

    /// Record a [`TraceStep`] for every symbol visited.
    pub fn traced(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    /// Expand `symbol` into raw text. Postprocessing markup is left in.
    pub fn expand<R: RandomSource + ?Sized>(
        &mut self,
        symbol: &Symbol,
        rng: &mut R,
    ) -> Result<String, ExpansionError> {
        self.stack.clear();
        let mut out = String::new();
        self.visit(symbol, rng, &mut out)?;
        Ok(out)
    }

    /// Steps recorded so far; empty unless built with [`Expander::traced`].
    pub fn take_trace(&mut self) -> Vec<TraceStep> {
        self.trace.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn visit<R: RandomSource + ?Sized>(
        &mut self,
        symbol: &Symbol,
        rng: &mut R,
        out: &mut String,
    ) -> Result<(), ExpansionError> {
        let table = self.table;
        let production = table
            .get(symbol.as_str())
            .ok_or_else(|| ExpansionError::UndefinedSymbol {
                symbol: symbol.clone(),
                stack: self.stack.clone(),
            })?;

        if self.stack.len() >= self.max_depth {
            return Err(ExpansionError::CyclicGrammar {
                symbol: symbol.clone(),
                depth: self.max_depth,
                stack: self.stack.clone(),
            });
        }

        let choice = rng.pick_index(production.len());
        if let Some(trace) = self.trace.as_mut() {
            trace.push(TraceStep {
                depth: self.stack.len(),
                symbol: symbol.clone(),
                choice,
                alternatives: production.len(),
            });
        }

        self.stack.push(symbol.clone());
        for segment in production.alternatives()[choice].segments() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                // Compiled tables hold no forced references; a hand-built
                // table may, and they expand like ordinary ones.
                Segment::Ref(reference) | Segment::Forced(reference) => {
                    self.visit(reference, rng, out)?
                }
            }
        }
        self.stack.pop();

        Ok(())
    }
}
