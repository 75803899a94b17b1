/// Group desugaring — rewrites `[...]` and `(...)` into synthetic productions.
///
/// ```text
/// $s = the [blue|red] shoes
/// =>
/// $s = the $_optgrp0 shoes;
/// $_optgrp0 = | $_grp0;
/// $_grp0 = blue|red
/// ```

use crate::schema::symbol::{is_identifier_char, GROUP_PREFIX, OPTIONAL_GROUP_PREFIX, SIGIL};

/// Separates statements in grammar source.
pub const STATEMENT_TERMINATOR: char = ';';
/// Starts a comment statement.
pub const COMMENT_MARKER: char = '#';
/// Separates the alternatives of a production.
pub const ALTERNATIVE_SEPARATOR: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    /// `[...]`, may be omitted.
    Optional,
    /// `(...)`, plain grouping.
    Plain,
}

impl GroupKind {
    fn delimiters(self) -> (char, char) {
        match self {
            GroupKind::Optional => ('[', ']'),
            GroupKind::Plain => ('(', ')'),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            GroupKind::Optional => OPTIONAL_GROUP_PREFIX,
            GroupKind::Plain => GROUP_PREFIX,
        }
    }

    fn production(self, name: &str, inner: &str) -> String {
        match self {
            GroupKind::Optional => format!("{} = | ({})", name, inner),
            GroupKind::Plain => format!("{} = {}", name, inner),
        }
    }
}

/// Rewrite all group syntax into flat `symbol = alt|alt` statements.
///
/// Optional groups are resolved first, then plain groups over the whole
/// result, so the `(...)` wrapped around every optional group body is
/// desugared too. Text without groups comes back unchanged, and so does
/// a delimiter with no partner, such as the `)` in `$s = smile :)`.
pub fn desugar(source: &str) -> String {
    let text = desugar_kind(source, GroupKind::Optional);
    desugar_kind(&text, GroupKind::Plain)
}

fn desugar_kind(text: &str, kind: GroupKind) -> String {
    let mut productions = Vec::new();

    let statements: Vec<String> = text
        .split(STATEMENT_TERMINATOR)
        .map(|statement| {
            if is_comment(statement) {
                statement.to_string()
            } else {
                rewrite_statement(statement, kind, &mut productions)
            }
        })
        .collect();

    let mut out = statements.join(&STATEMENT_TERMINATOR.to_string());
    if !productions.is_empty() {
        let separator = format!("{}\n", STATEMENT_TERMINATOR);
        out.push_str(&separator);
        out.push_str(&productions.join(&separator));
    }
    out
}

pub(crate) fn is_comment(statement: &str) -> bool {
    statement.trim_start().starts_with(COMMENT_MARKER)
}

/// Replace every group of `kind` in one statement, innermost first.
///
/// Each open delimiter starts a new buffer; the matching close delimiter
/// pops it, mints the next synthetic name, and writes the reference into
/// the enclosing buffer. Closing order is also the numbering order.
/// Unmatched delimiters stay in the text as literals.
fn rewrite_statement(statement: &str, kind: GroupKind, productions: &mut Vec<String>) -> String {
    let (open, close) = kind.delimiters();
    let chars: Vec<char> = statement.chars().collect();
    let mut outer = String::with_capacity(statement.len());
    let mut stack: Vec<String> = Vec::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == open {
            stack.push(String::new());
            continue;
        }

        if c != close {
            stack.last_mut().unwrap_or(&mut outer).push(c);
            continue;
        }

        let inner = match stack.pop() {
            Some(inner) => inner,
            None => {
                outer.push(c);
                continue;
            }
        };
        let name = format!("{}{}", kind.prefix(), productions.len());
        productions.push(kind.production(&name, &inner));

        let (lead, trail) = hoisted_edges(&inner);
        let glued = !trail && chars.get(i + 1).is_some_and(|&next| is_identifier_char(next));

        let buf = stack.last_mut().unwrap_or(&mut outer);
        if lead {
            buf.push(' ');
        }
        if glued {
            buf.push(SIGIL);
            buf.push('{');
            buf.push_str(&name[SIGIL.len_utf8()..]);
            buf.push('}');
        } else {
            buf.push_str(&name);
        }
        if trail {
            buf.push(' ');
        }
    }

    // Groups still open at the end were never groups.
    while let Some(unclosed) = stack.pop() {
        let buf = stack.last_mut().unwrap_or(&mut outer);
        buf.push(open);
        buf.push_str(&unclosed);
    }

    outer
}

/// Whether every top-level alternative of a group body starts (and ends)
/// with whitespace. That whitespace belongs around the group, not inside
/// it, since alternatives are trimmed when the table is built.
fn hoisted_edges(inner: &str) -> (bool, bool) {
    let alternatives = split_top_level(inner);
    let lead = alternatives.iter().all(|a| a.starts_with(char::is_whitespace));
    let trail = alternatives.iter().all(|a| a.ends_with(char::is_whitespace));
    (lead, trail)
}

/// Split on `|` outside any nested `(...)` or `[...]`.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ALTERNATIVE_SEPARATOR if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_text_is_unchanged() {
        let src = "$s = $a and $b;\n$a = x|y;\n$b = z;";
        assert_eq!(desugar(src), src);
    }

    #[test]
    fn optional_and_plain_groups() {
        let out = desugar("$s = the [blue|red] shoes");
        assert_eq!(
            out,
            "$s = the $_optgrp0 shoes;\n$_optgrp0 = | $_grp0;\n$_grp0 = blue|red"
        );
    }

    #[test]
    fn plain_group() {
        let out = desugar("$s = a (b|c) d");
        assert_eq!(out, "$s = a $_grp0 d;\n$_grp0 = b|c");
    }

    #[test]
    fn nested_groups_numbered_inside_out() {
        let out = desugar("$s = [x [y] z] [w]");
        assert_eq!(
            out,
            "$s = $_optgrp1 $_optgrp2;\n\
             $_optgrp0 = | $_grp0;\n\
             $_optgrp1 = | $_grp1;\n\
             $_optgrp2 = | $_grp2;\n\
             $_grp0 = y;\n\
             $_grp1 = x $_optgrp0 z;\n\
             $_grp2 = w"
        );
    }

    #[test]
    fn deep_nesting() {
        let out = desugar("$s = ((((a))))");
        assert!(out.starts_with("$s = $_grp3;"));
        assert!(out.contains("$_grp0 = a"));
        assert!(out.contains("$_grp3 = $_grp2"));
    }

    #[test]
    fn edge_whitespace_is_hoisted() {
        let out = desugar("$s = the [big ]dog");
        assert!(out.starts_with("$s = the $_optgrp0 dog;"), "{}", out);
    }

    #[test]
    fn glued_reference_uses_braces() {
        let out = desugar("$s = [re]do");
        assert!(out.starts_with("$s = ${_optgrp0}do;"), "{}", out);
    }

    #[test]
    fn empty_groups() {
        let out = desugar("$s = a[]b");
        assert!(out.contains("$_optgrp0 = | $_grp0"));
        assert!(out.ends_with("$_grp0 = "));

        let out = desugar("$s = x()");
        assert_eq!(out, "$s = x$_grp0;\n$_grp0 = ");
    }

    #[test]
    fn comments_are_left_alone() {
        let src = "# a [stray bracket;\n$s = ok";
        assert_eq!(desugar(src), src);
    }

    #[test]
    fn unmatched_delimiters_are_literal() {
        for src in [
            "$s = smile :)",
            "$s = 1) first item",
            "$s = a [b",
            "$s = oops]",
            "$s = (a|b",
            "$s = x ( y ( z",
        ] {
            assert_eq!(desugar(src), src);
        }
    }

    #[test]
    fn unmatched_delimiter_beside_a_group() {
        let out = desugar("$s = (a|b) :)");
        assert_eq!(out, "$s = $_grp0 :);\n$_grp0 = a|b");

        let out = desugar("$s = ( (a|b)");
        assert_eq!(out, "$s = ( $_grp0;\n$_grp0 = a|b");
    }

    #[test]
    fn split_respects_nesting() {
        assert_eq!(split_top_level("a|(b|c)|d"), vec!["a", "(b|c)", "d"]);
        assert_eq!(split_top_level(""), vec![""]);
    }
}
