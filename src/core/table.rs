/// Expansion table — statement parsing and the symbol→production map.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

use crate::core::grammar::GrammarError;
use crate::core::preprocess::{ALTERNATIVE_SEPARATOR, COMMENT_MARKER, STATEMENT_TERMINATOR};
use crate::schema::alternative::Alternative;
use crate::schema::symbol::{Symbol, START_SYMBOL};

/// Separates a symbol from its content.
pub const DEFINITION_SEPARATOR: char = '=';

/// The ordered alternatives of one symbol. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Production {
    alternatives: Vec<Alternative>,
}

impl Production {
    /// Split content on `|` and tokenize each alternative.
    pub fn parse(content: &str) -> Production {
        Production {
            alternatives: content
                .split(ALTERNATIVE_SEPARATOR)
                .map(Alternative::parse)
                .collect(),
        }
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn has_forced(&self) -> bool {
        self.alternatives.iter().any(Alternative::has_forced)
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", ALTERNATIVE_SEPARATOR)?;
            }
            write!(f, "{}", alternative)?;
        }
        Ok(())
    }
}

/// Symbol → production map, plus definition order and the symbols that
/// still hold forced references.
#[derive(Debug, Clone, Default)]
pub struct Table {
    productions: FxHashMap<Symbol, Production>,
    order: Vec<Symbol>,
    forced: Vec<Symbol>,
}

impl Table {
    pub fn get(&self, symbol: &str) -> Option<&Production> {
        self.productions.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.productions.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Symbols in definition order (synthetic group symbols last).
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter()
    }

    /// Symbols with their productions, in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Production)> {
        self.order
            .iter()
            .filter_map(|symbol| self.productions.get(symbol).map(|p| (symbol, p)))
    }

    /// Symbols recorded at parse time as containing `>` references and not
    /// yet unfolded.
    pub fn forced_symbols(&self) -> &[Symbol] {
        &self.forced
    }

    pub(crate) fn insert(&mut self, symbol: Symbol, production: Production) -> Result<(), GrammarError> {
        if self.productions.contains_key(&symbol) {
            return Err(GrammarError::DuplicateSymbol(symbol));
        }
        if production.has_forced() {
            self.forced.push(symbol.clone());
        }
        self.order.push(symbol.clone());
        self.productions.insert(symbol, production);
        Ok(())
    }

    pub(crate) fn replace(&mut self, symbol: &Symbol, alternatives: Vec<Alternative>) {
        if let Some(production) = self.productions.get_mut(symbol) {
            production.alternatives = alternatives;
        }
    }

    pub(crate) fn take_forced(&mut self) -> Vec<Symbol> {
        std::mem::take(&mut self.forced)
    }
}

/// Build a table from desugared source.
///
/// Statements end at `;`; newlines inside them are plain whitespace.
/// Blank statements and `#` comments are skipped. Everything after the
/// first `=` is content, so content may contain `=` itself.
pub fn parse(text: &str) -> Result<Table, GrammarError> {
    let mut table = Table::default();

    for statement in text.split(STATEMENT_TERMINATOR) {
        let line = statement.replace(['\r', '\n'], " ");
        let line = line.trim();

        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        let (name, content) = match line.split_once(DEFINITION_SEPARATOR) {
            Some((name, content)) => (name.trim(), content.trim()),
            None => (line, ""),
        };

        let symbol =
            Symbol::parse(name).ok_or_else(|| GrammarError::InvalidSymbolName(name.to_string()))?;

        // `()` desugars to a synthetic symbol with nothing after `=`.
        if content.is_empty() && !symbol.is_synthetic() {
            return Err(GrammarError::EmptyProduction(symbol));
        }

        table.insert(symbol, Production::parse(content))?;
    }

    if !table.contains(START_SYMBOL) {
        return Err(GrammarError::MissingStartSymbol);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternatives_of(table: &Table, symbol: &str) -> Vec<String> {
        table
            .get(symbol)
            .unwrap()
            .alternatives()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn parse_basic_table() {
        let table = parse("$s = $a and $b;\n$a = x | y ;\n$b = z").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(alternatives_of(&table, "$s"), vec!["$a and $b"]);
        assert_eq!(alternatives_of(&table, "$a"), vec!["x", "y"]);
        let order: Vec<&str> = table.symbols().map(Symbol::as_str).collect();
        assert_eq!(order, vec!["$s", "$a", "$b"]);
    }

    #[test]
    fn newlines_are_whitespace() {
        let table = parse("$s = one\ntwo|\nthree;").unwrap();
        assert_eq!(alternatives_of(&table, "$s"), vec!["one two", "three"]);
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let table = parse("# header;\n  # indented comment;\n;;\n$s = ok;").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn content_may_contain_equals() {
        let table = parse("$s = 1 + 1 = 2").unwrap();
        assert_eq!(alternatives_of(&table, "$s"), vec!["1 + 1 = 2"]);
    }

    #[test]
    fn empty_alternatives_are_kept() {
        let table = parse("$s = | a |").unwrap();
        assert_eq!(table.get("$s").unwrap().len(), 3);
        assert!(table.get("$s").unwrap().alternatives()[0].is_empty());
    }

    #[test]
    fn invalid_symbol_name() {
        assert!(matches!(
            parse("s = x"),
            Err(GrammarError::InvalidSymbolName(name)) if name == "s"
        ));
        assert!(matches!(
            parse("just some words"),
            Err(GrammarError::InvalidSymbolName(_))
        ));
    }

    #[test]
    fn empty_production() {
        assert!(matches!(
            parse("$s = x; $a ="),
            Err(GrammarError::EmptyProduction(symbol)) if symbol.as_str() == "$a"
        ));
        assert!(matches!(
            parse("$s"),
            Err(GrammarError::EmptyProduction(_))
        ));
    }

    #[test]
    fn synthetic_symbols_may_be_empty() {
        let table = parse("$s = a$_grp0;\n$_grp0 = ").unwrap();
        assert_eq!(table.get("$_grp0").unwrap().len(), 1);
    }

    #[test]
    fn duplicate_symbol() {
        assert!(matches!(
            parse("$s = a; $s = b"),
            Err(GrammarError::DuplicateSymbol(symbol)) if symbol.as_str() == "$s"
        ));
    }

    #[test]
    fn missing_start_symbol() {
        assert!(matches!(parse("$a = x;"), Err(GrammarError::MissingStartSymbol)));
        assert!(matches!(parse(""), Err(GrammarError::MissingStartSymbol)));
    }

    #[test]
    fn forced_symbols_are_flagged() {
        let table = parse("$s = >$c hat; $c = red|blue; $d = a >$c").unwrap();
        let flagged: Vec<&str> = table.forced_symbols().iter().map(Symbol::as_str).collect();
        assert_eq!(flagged, vec!["$s", "$d"]);
    }

    #[test]
    fn production_display() {
        let table = parse("$s = a|$b c|").unwrap();
        assert_eq!(table.get("$s").unwrap().to_string(), "a|$b c|");
    }
}
