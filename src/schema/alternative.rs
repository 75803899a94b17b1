use serde::{Deserialize, Serialize};
use std::fmt;

use super::symbol::{is_identifier_char, Symbol, SIGIL};

/// Prefix marking a forced substitution: `>$color`.
pub const FORCED_MARKER: char = '>';

/// A piece of a parsed alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// Text emitted as-is (markers for the postprocessor included).
    Literal(String),
    /// Ordinary reference: `$name` or `${name}`, re-randomized per occurrence.
    Ref(Symbol),
    /// Forced reference: `>$name`, spliced in at compile time.
    Forced(Symbol),
}

/// One `|`-separated choice of a production.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Alternative {
    segments: Vec<Segment>,
}

impl Alternative {
    /// Tokenize the text of one alternative. Surrounding whitespace is
    /// trimmed first.
    ///
    /// - `$name` and `${name}` → `Ref`
    /// - `>$name` and `>${name}` → `Forced`
    /// - everything else, including a lone `$` or `>` → `Literal`
    pub fn parse(input: &str) -> Alternative {
        let chars: Vec<char> = input.trim().chars().collect();
        let len = chars.len();
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let mut i = 0;

        while i < len {
            let (forced, at) = if chars[i] == FORCED_MARKER {
                (true, i + 1)
            } else {
                (false, i)
            };

            if let Some((symbol, next)) = read_reference(&chars, at) {
                if !literal_buf.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal_buf)));
                }
                segments.push(if forced {
                    Segment::Forced(symbol)
                } else {
                    Segment::Ref(symbol)
                });
                i = next;
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(Segment::Literal(literal_buf));
        }

        Alternative { segments }
    }

    /// Build an alternative from segments, merging adjacent literals and
    /// dropping empty ones.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Alternative {
        let mut merged: Vec<Segment> = Vec::new();
        for segment in segments {
            if let Segment::Literal(text) = &segment {
                if text.is_empty() {
                    continue;
                }
                if let Some(Segment::Literal(prev)) = merged.last_mut() {
                    prev.push_str(text);
                    continue;
                }
            }
            merged.push(segment);
        }
        Alternative { segments: merged }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every symbol this alternative mentions, forced or not, in order.
    pub fn references(&self) -> impl Iterator<Item = &Symbol> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Ref(symbol) | Segment::Forced(symbol) => Some(symbol),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_forced(&self) -> bool {
        self.first_forced().is_some()
    }

    /// Position and target of the leftmost forced reference.
    pub fn first_forced(&self) -> Option<(usize, &Symbol)> {
        self.segments.iter().enumerate().find_map(|(i, s)| match s {
            Segment::Forced(symbol) => Some((i, symbol)),
            _ => None,
        })
    }

    /// Replace the segment at `index` with the segments of `replacement`.
    pub fn splice(&self, index: usize, replacement: &Alternative) -> Alternative {
        let prefix = self.segments[..index].iter().cloned();
        let suffix = self.segments[index + 1..].iter().cloned();
        Alternative::from_segments(
            prefix
                .chain(replacement.segments.iter().cloned())
                .chain(suffix),
        )
    }
}

/// Read `$name` or `${name}` starting at `at`. Returns the symbol and the
/// index just past it.
fn read_reference(chars: &[char], at: usize) -> Option<(Symbol, usize)> {
    if chars.get(at) != Some(&SIGIL) {
        return None;
    }
    let start = at + 1;

    if chars.get(start) == Some(&'{') {
        let close = chars[start..].iter().position(|&c| c == '}')? + start;
        let identifier = &chars[start + 1..close];
        if identifier.is_empty() || !identifier.iter().all(|&c| is_identifier_char(c)) {
            return None;
        }
        let identifier: String = identifier.iter().collect();
        return Some((Symbol::from_identifier(&identifier), close + 1));
    }

    let end = chars[start..]
        .iter()
        .position(|&c| !is_identifier_char(c))
        .map_or(chars.len(), |p| p + start);
    if end == start {
        return None;
    }
    let identifier: String = chars[start..end].iter().collect();
    Some((Symbol::from_identifier(&identifier), end))
}

impl fmt::Display for Alternative {
    /// Renders back to DSL source. A reference followed by an identifier
    /// character is written in braced form so it re-parses the same way.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            let symbol = match segment {
                Segment::Literal(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Segment::Ref(symbol) => symbol,
                Segment::Forced(symbol) => {
                    write!(f, "{}", FORCED_MARKER)?;
                    symbol
                }
            };
            let glued = matches!(
                self.segments.get(i + 1),
                Some(Segment::Literal(next)) if next.starts_with(is_identifier_char)
            );
            if glued {
                write!(f, "{}{{{}}}", SIGIL, symbol.identifier())?;
            } else {
                write!(f, "{}", symbol)?;
            }
        }
        Ok(())
    }
}
