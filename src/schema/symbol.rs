use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// The reserved leading character of every symbol name.
pub const SIGIL: char = '$';

/// Name of the mandatory start symbol.
pub const START_SYMBOL: &str = "$s";

/// Name prefix of the productions minted for `[...]` groups.
pub const OPTIONAL_GROUP_PREFIX: &str = "$_optgrp";

/// Name prefix of the productions minted for `(...)` groups.
pub const GROUP_PREFIX: &str = "$_grp";

/// Characters allowed after the sigil: letters, ASCII digits, underscore.
/// "Letter" means Unicode `Alphabetic`, which also admits letter numbers
/// such as `Ⅻ` and alphabetic combining marks.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || c == '_'
}

/// A non-terminal name, sigil included (e.g. `$color`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Parse a symbol name. Returns `None` unless the text is the sigil
    /// followed by one or more identifier characters.
    pub fn parse(text: &str) -> Option<Symbol> {
        let rest = text.strip_prefix(SIGIL)?;
        if rest.is_empty() || !rest.chars().all(is_identifier_char) {
            return None;
        }
        Some(Symbol(text.to_string()))
    }

    /// Build a symbol from an identifier that is already known to be valid
    /// (no sigil).
    pub(crate) fn from_identifier(identifier: &str) -> Symbol {
        let mut name = String::with_capacity(identifier.len() + 1);
        name.push(SIGIL);
        name.push_str(identifier);
        Symbol(name)
    }

    /// The reserved start symbol `$s`.
    pub fn start() -> Symbol {
        Symbol(START_SYMBOL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without its sigil.
    pub fn identifier(&self) -> &str {
        &self.0[SIGIL.len_utf8()..]
    }

    /// True for names minted by the group preprocessor.
    pub fn is_synthetic(&self) -> bool {
        is_synthetic_name(&self.0, OPTIONAL_GROUP_PREFIX) || is_synthetic_name(&self.0, GROUP_PREFIX)
    }
}

fn is_synthetic_name(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_names() {
        assert_eq!(Symbol::parse("$s").unwrap().as_str(), "$s");
        assert_eq!(Symbol::parse("$color_2").unwrap().identifier(), "color_2");
        assert!(Symbol::parse("$città").is_some());
    }

    #[test]
    fn alphabetic_covers_letter_numbers() {
        assert!(is_identifier_char('Ⅻ'));
        assert!(Symbol::parse("$chapterⅫ").is_some());
        assert!(!is_identifier_char('٣'));
        assert!(Symbol::parse("$x٣").is_none());
    }

    #[test]
    fn parse_rejects_bad_names() {
        assert!(Symbol::parse("color").is_none());
        assert!(Symbol::parse("$").is_none());
        assert!(Symbol::parse("$two words").is_none());
        assert!(Symbol::parse("$a-b").is_none());
        assert!(Symbol::parse("").is_none());
    }

    #[test]
    fn synthetic_names() {
        assert!(Symbol::parse("$_optgrp0").unwrap().is_synthetic());
        assert!(Symbol::parse("$_grp12").unwrap().is_synthetic());
        assert!(!Symbol::parse("$_grp").unwrap().is_synthetic());
        assert!(!Symbol::parse("$_grpx").unwrap().is_synthetic());
        assert!(!Symbol::parse("$grp0").unwrap().is_synthetic());
    }

    #[test]
    fn start_symbol() {
        assert_eq!(Symbol::start(), Symbol::parse("$s").unwrap());
    }
}
