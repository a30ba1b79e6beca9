//! Line-oriented relationship scan over raw schema text.
//!
//! Runs independently of the AST and only produces hints; the results are
//! merged and deduplicated with the AST-derived relationships.

use crate::model::{Relationship, RelationshipKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// `type Name` anywhere on a line
static TYPE_DECL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btype\s+(\w+)").unwrap());

/// A line that starts a new top-level type block
static TYPE_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*type\s").unwrap());

/// `books: [Book] @hasMany`, tolerating non-null markers
static HAS_MANY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+)\s*:\s*\[?\s*(\w+)\s*!?\s*\]?\s*!?\s*@hasMany\b").unwrap()
});

/// `author: Author @belongsTo`
static BELONGS_TO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*(\w+)\s*!?\s*@belongsTo\b").unwrap());

/// Scan the `@model` block of `entity_name` for relationship directives.
///
/// The block starts at the line declaring `type <entity_name>` with `@model`
/// and ends at its closing brace or at the next line starting with `type`,
/// whichever comes first. Description strings are not skipped, so SDL quoted
/// inside a `"""` block on those lines is scanned like any other text.
pub fn scan_relationships(entity_name: &str, source: &str) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    let mut in_block = false;
    let mut braces = BraceState::default();

    for raw_line in source.lines() {
        let line = strip_comment(raw_line);

        let body = if in_block {
            if TYPE_LINE_RE.is_match(line) {
                break;
            }
            line
        } else {
            match find_declaration(line, entity_name) {
                Some(offset) => {
                    in_block = true;
                    &line[offset..]
                }
                None => continue,
            }
        };

        let (body, closed) = braces.clip(body);
        collect_matches(body, &mut relationships);

        if closed {
            break;
        }
    }

    relationships
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Byte offset of `type <entity_name>` when the rest of the line carries `@model`.
fn find_declaration(line: &str, entity_name: &str) -> Option<usize> {
    TYPE_DECL_RE.captures_iter(line).find_map(|caps| {
        let whole = caps.get(0)?;
        let name = caps.get(1)?;
        (name.as_str() == entity_name && line[whole.end()..].contains("@model"))
            .then_some(whole.start())
    })
}

/// Brace depth of the type block, carried across lines. Braces inside
/// directive arguments (`@auth(rules: [{ allow: owner }])`) are skipped.
#[derive(Default)]
struct BraceState {
    depth: usize,
    parens: usize,
    opened: bool,
}

impl BraceState {
    /// Cut `body` at the brace that closes the block, if it is on this line.
    fn clip<'a>(&mut self, body: &'a str) -> (&'a str, bool) {
        for (idx, c) in body.char_indices() {
            match c {
                '(' => self.parens += 1,
                ')' => self.parens = self.parens.saturating_sub(1),
                '{' if self.parens == 0 => {
                    self.depth += 1;
                    self.opened = true;
                }
                '}' if self.parens == 0 => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.opened && self.depth == 0 {
                        return (&body[..=idx], true);
                    }
                }
                _ => {}
            }
        }
        (body, false)
    }
}

fn collect_matches(body: &str, out: &mut Vec<Relationship>) {
    let mut found: Vec<(usize, Relationship)> = Vec::new();

    for (re, kind) in [
        (&*HAS_MANY_RE, RelationshipKind::HasMany),
        (&*BELONGS_TO_RE, RelationshipKind::BelongsTo),
    ] {
        for caps in re.captures_iter(body) {
            let (Some(whole), Some(field), Some(target)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            // a field carrying both directives counts as @hasMany only
            let tail = &body[whole.end()..];
            if kind == RelationshipKind::BelongsTo
                && followed_by_directive(tail, RelationshipKind::HasMany.directive())
            {
                continue;
            }
            found.push((
                whole.start(),
                Relationship {
                    kind,
                    target_entity: target.as_str().to_string(),
                    field_name: field.as_str().to_string(),
                },
            ));
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    out.extend(found.into_iter().map(|(_, rel)| rel));
}

/// Whether the directives trailing a match on the same field include `@name`.
fn followed_by_directive(tail: &str, name: &str) -> bool {
    let mut rest = tail;
    loop {
        rest = skip_arguments(rest).trim_start();
        let Some(after_at) = rest.strip_prefix('@') else {
            return false;
        };
        let end = after_at
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(after_at.len());
        if &after_at[..end] == name {
            return true;
        }
        rest = &after_at[end..];
    }
}

/// Skip a parenthesised argument list at the start of `s`, if there is one.
fn skip_arguments(s: &str) -> &str {
    let trimmed = s.trim_start();
    if !trimmed.starts_with('(') {
        return s;
    }
    let mut depth = 0usize;
    for (idx, c) in trimmed.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &trimmed[idx + 1..];
                }
            }
            _ => {}
        }
    }
    ""
}
