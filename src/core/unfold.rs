/// Forced substitution — compile-time resolution of `>$symbol` markers.
///
/// `$s = a >$c hat; $c = red|blue` unfolds to `$s = a red hat|a blue hat`.
/// Ordinary references are re-randomized on every occurrence during
/// expansion; a forced reference is fixed into the alternative instead.

use crate::core::grammar::GrammarError;
use crate::core::table::Table;
use crate::schema::alternative::{Alternative, Segment};
use crate::schema::symbol::Symbol;
use rustc_hash::FxHashSet;

/// Resolve the forced references of every symbol flagged at parse time.
pub fn unfold_all(table: &mut Table, max_passes: usize) -> Result<(), GrammarError> {
    for symbol in table.take_forced() {
        unfold(table, &symbol, max_passes)?;
    }
    Ok(())
}

/// Rewrite one symbol's alternatives until none contains a forced
/// reference.
///
/// Each pass resolves the leftmost marker of every alternative, producing
/// one alternative per alternative of the referenced symbol. Markers are
/// therefore resolved left to right, one per pass. A symbol that is
/// already free of markers is left untouched.
///
/// A symbol whose forced references lead back to itself, directly or
/// through other symbols, fails with `UnfoldCycle` before any splicing.
pub fn unfold(table: &mut Table, symbol: &Symbol, max_passes: usize) -> Result<(), GrammarError> {
    if let Some(path) = forced_cycle(table, symbol) {
        return Err(GrammarError::UnfoldCycle {
            symbol: symbol.clone(),
            passes: 0,
            path,
        });
    }

    let mut passes = 0;

    loop {
        let production = match table.get(symbol.as_str()) {
            Some(production) => production,
            None => return Ok(()),
        };
        if !production.has_forced() {
            return Ok(());
        }
        if passes == max_passes {
            return Err(GrammarError::UnfoldCycle {
                symbol: symbol.clone(),
                passes,
                path: Vec::new(),
            });
        }

        let next = unfold_pass(table, symbol, production.alternatives())?;
        table.replace(symbol, next);
        passes += 1;
    }
}

/// Depth-first walk over forced references only. Returns the path from
/// `symbol` to the first reference that revisits a symbol on that path.
fn forced_cycle(table: &Table, symbol: &Symbol) -> Option<Vec<Symbol>> {
    let mut path = vec![symbol.clone()];
    let mut done = FxHashSet::default();
    if walk_forced(table, &mut path, &mut done) {
        Some(path)
    } else {
        None
    }
}

fn walk_forced(table: &Table, path: &mut Vec<Symbol>, done: &mut FxHashSet<Symbol>) -> bool {
    let production = match path.last().and_then(|s| table.get(s.as_str())) {
        Some(production) => production,
        None => return false,
    };

    for alternative in production.alternatives() {
        for segment in alternative.segments() {
            let reference = match segment {
                Segment::Forced(reference) => reference,
                _ => continue,
            };
            if path.contains(reference) {
                path.push(reference.clone());
                return true;
            }
            if done.contains(reference) {
                continue;
            }
            path.push(reference.clone());
            if walk_forced(table, path, done) {
                return true;
            }
            if let Some(finished) = path.pop() {
                done.insert(finished);
            }
        }
    }
    false
}

fn unfold_pass(
    table: &Table,
    symbol: &Symbol,
    alternatives: &[Alternative],
) -> Result<Vec<Alternative>, GrammarError> {
    let mut unfolded = Vec::with_capacity(alternatives.len());

    for alternative in alternatives {
        let (index, reference) = match alternative.first_forced() {
            Some(found) => found,
            None => {
                unfolded.push(alternative.clone());
                continue;
            }
        };

        let target = table
            .get(reference.as_str())
            .ok_or_else(|| GrammarError::UndefinedForcedReference {
                symbol: symbol.clone(),
                reference: reference.clone(),
            })?;

        unfolded.extend(
            target
                .alternatives()
                .iter()
                .map(|choice| alternative.splice(index, choice)),
        );
    }

    Ok(unfolded)
}
