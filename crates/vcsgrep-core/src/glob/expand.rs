//! Brace and bracket group expansion.
//!
//! `{a,b}` expands into one variant per alternative (alternatives may contain
//! further groups), `[xyz]` into one variant per character, with `a-c` ranges
//! spelled out. Groups compose as a cartesian product:
//!
//! ```
//! use vcsgrep_core::glob::expand::expand;
//!
//! let variants = expand(".{[ch]pp,asm}").unwrap();
//! assert_eq!(variants, vec![".cpp", ".hpp", ".asm"]);
//! ```
//!
//! Wildcards (`*`, `?`) are left in place for the compilers.

use super::{PatternError, SyntaxReason};

/// Upper bound on the number of variants a single pattern may expand into.
pub const MAX_VARIANTS: usize = 4096;

#[derive(Debug)]
enum Item {
    Text(String),
    Alternatives(Vec<Vec<Item>>),
    Chars(Vec<char>),
}

/// Expand every group in `pattern`.
///
/// Returns the variants in expansion order with duplicates removed. A pattern
/// without groups expands to itself.
pub fn expand(pattern: &str) -> Result<Vec<String>, PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut parser = Parser {
        pattern,
        chars: &chars,
        pos: 0,
    };
    let items = parser.sequence(0)?;

    let mut variants = vec![String::new()];
    expand_items(pattern, &items, &mut variants)?;

    let mut unique: Vec<String> = Vec::with_capacity(variants.len());
    for variant in variants {
        if !unique.contains(&variant) {
            unique.push(variant);
        }
    }
    Ok(unique)
}

struct Parser<'a> {
    pattern: &'a str,
    chars: &'a [char],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: SyntaxReason) -> PatternError {
        PatternError::syntax(self.pattern, reason)
    }

    /// Parse items until the end of input, or until a `,`/`}` that belongs to
    /// an enclosing brace group.
    fn sequence(&mut self, depth: usize) -> Result<Vec<Item>, PatternError> {
        let mut items = Vec::new();
        let mut text = String::new();

        while let Some(&c) = self.chars.get(self.pos) {
            match c {
                '{' => {
                    flush_text(&mut text, &mut items);
                    self.pos += 1;
                    items.push(self.alternatives(depth + 1)?);
                }
                '}' | ',' if depth > 0 => break,
                '}' => return Err(self.error(SyntaxReason::UnexpectedBrace)),
                '[' => {
                    flush_text(&mut text, &mut items);
                    self.pos += 1;
                    items.push(self.bracket()?);
                }
                _ => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }

        flush_text(&mut text, &mut items);
        Ok(items)
    }

    fn alternatives(&mut self, depth: usize) -> Result<Item, PatternError> {
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.sequence(depth)?);
            match self.chars.get(self.pos) {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(Item::Alternatives(alternatives));
                }
                _ => return Err(self.error(SyntaxReason::UnclosedBrace)),
            }
        }
    }

    fn bracket(&mut self) -> Result<Item, PatternError> {
        let start = self.pos;
        if matches!(self.chars.get(start), Some('!' | '^')) {
            return Err(self.error(SyntaxReason::NegatedBracket));
        }
        // a `]` right after the opener is a member, not the close
        let search_from = if self.chars.get(start) == Some(&']') {
            start + 1
        } else {
            start
        };
        let end = self.chars[search_from..]
            .iter()
            .position(|&c| c == ']')
            .map(|offset| search_from + offset)
            .ok_or_else(|| self.error(SyntaxReason::UnclosedBracket))?;
        let body = &self.chars[start..end];
        self.pos = end + 1;

        let mut set: Vec<char> = Vec::new();
        let mut i = 0;
        while i < body.len() {
            if i + 2 < body.len() && body[i + 1] == '-' && body[i] <= body[i + 2] {
                for c in body[i]..=body[i + 2] {
                    if set.len() >= MAX_VARIANTS {
                        return Err(self.error(SyntaxReason::TooManyVariants));
                    }
                    if !set.contains(&c) {
                        set.push(c);
                    }
                }
                i += 3;
            } else {
                if !set.contains(&body[i]) {
                    set.push(body[i]);
                }
                i += 1;
            }
        }
        Ok(Item::Chars(set))
    }
}

fn flush_text(text: &mut String, items: &mut Vec<Item>) {
    if !text.is_empty() {
        items.push(Item::Text(std::mem::take(text)));
    }
}

fn expand_items(
    pattern: &str,
    items: &[Item],
    variants: &mut Vec<String>,
) -> Result<(), PatternError> {
    for item in items {
        match item {
            Item::Text(text) => {
                for variant in variants.iter_mut() {
                    variant.push_str(text);
                }
            }
            Item::Chars(chars) => {
                let suffixes: Vec<String> = chars.iter().map(|c| c.to_string()).collect();
                *variants = product(pattern, variants, &suffixes)?;
            }
            Item::Alternatives(alternatives) => {
                let mut suffixes = Vec::new();
                for alternative in alternatives {
                    let mut expanded = vec![String::new()];
                    expand_items(pattern, alternative, &mut expanded)?;
                    suffixes.extend(expanded);
                }
                *variants = product(pattern, variants, &suffixes)?;
            }
        }
    }
    Ok(())
}

fn product(
    pattern: &str,
    prefixes: &[String],
    suffixes: &[String],
) -> Result<Vec<String>, PatternError> {
    if prefixes.len().saturating_mul(suffixes.len()) > MAX_VARIANTS {
        return Err(PatternError::syntax(pattern, SyntaxReason::TooManyVariants));
    }
    let mut out = Vec::with_capacity(prefixes.len() * suffixes.len());
    for prefix in prefixes {
        for suffix in suffixes {
            out.push(format!("{prefix}{suffix}"));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_reason(pattern: &str) -> SyntaxReason {
        match expand(pattern).unwrap_err() {
            PatternError::Syntax { reason, .. } => reason,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_expand_without_groups_is_identity() {
        assert_eq!(expand(".c").unwrap(), vec![".c"]);
        assert_eq!(expand("lib/**.c").unwrap(), vec!["lib/**.c"]);
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand(".{cpp,h,asm}").unwrap(), vec![".cpp", ".h", ".asm"]);
    }

    #[test]
    fn test_expand_bracket() {
        assert_eq!(expand(".[ch]pp").unwrap(), vec![".cpp", ".hpp"]);
    }

    #[test]
    fn test_expand_bracket_range() {
        assert_eq!(expand("v[1-3]").unwrap(), vec!["v1", "v2", "v3"]);
        // A dash that is not between two characters is literal.
        assert_eq!(expand("[a-]").unwrap(), vec!["a", "-"]);
    }

    #[test]
    fn test_expand_cartesian_product() {
        assert_eq!(
            expand(".{c,h}[px]").unwrap(),
            vec![".cp", ".cx", ".hp", ".hx"]
        );
    }

    #[test]
    fn test_expand_nested_groups() {
        assert_eq!(
            expand("main.{[ch],[ch]pp,*zzz}").unwrap(),
            vec!["main.c", "main.h", "main.cpp", "main.hpp", "main.*zzz"]
        );
        assert_eq!(expand("{foo,ba{r,z}}").unwrap(), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_expand_empty_alternative() {
        assert_eq!(expand(".c{,pp}").unwrap(), vec![".c", ".cpp"]);
    }

    #[test]
    fn test_expand_removes_duplicates() {
        assert_eq!(expand(".{c,c,h}").unwrap(), vec![".c", ".h"]);
    }

    #[test]
    fn test_comma_outside_braces_is_literal() {
        assert_eq!(expand("a,b").unwrap(), vec!["a,b"]);
    }

    #[test]
    fn test_expand_syntax_errors() {
        assert_eq!(syntax_reason("foo{bar"), SyntaxReason::UnclosedBrace);
        assert_eq!(syntax_reason("foo{bar}}"), SyntaxReason::UnexpectedBrace);
        assert_eq!(syntax_reason(".[ch"), SyntaxReason::UnclosedBracket);
        assert_eq!(syntax_reason(".[]"), SyntaxReason::UnclosedBracket);
        assert_eq!(syntax_reason(".[!c]"), SyntaxReason::NegatedBracket);
    }

    #[test]
    fn test_expand_rejects_explosion() {
        let pattern = "[a-z][a-z][a-z]";
        assert_eq!(syntax_reason(pattern), SyntaxReason::TooManyVariants);
    }

    #[test]
    fn test_leading_close_bracket_is_member() {
        assert_eq!(expand("x[]ch]").unwrap(), vec!["x]", "xc", "xh"]);
        assert_eq!(expand("[]]").unwrap(), vec!["]"]);
    }
}
