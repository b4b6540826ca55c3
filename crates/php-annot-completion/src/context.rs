//! Completion context detection.
//!
//! Decides what the cursor position asks for: an annotation tag name inside
//! a docblock, a property inside a tag's parentheses, or their `#[...]`
//! attribute equivalents.

use php_annot_parser::target::{ancestor_of_kind, smallest_node_at};
use tree_sitter::{Point, Tree};

/// What kind of completion the position calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// Cursor after `@` in a docblock: complete annotation class names.
    TagName { prefix: String },
    /// Cursor inside `@Name(...)`: complete the annotation's properties.
    TagProperty { annotation: String, prefix: String },
    /// Cursor after `#[` (or a comma inside it): complete attribute names.
    AttributeName { prefix: String },
    /// Cursor inside `#[Name(...)]`: complete the attribute's properties.
    AttributeProperty { annotation: String, prefix: String },
    /// Not a place annotations are completed.
    None,
}

/// Detect the completion context at an LSP position.
pub fn detect_context(tree: &Tree, source: &str, line: u32, character: u32) -> CompletionContext {
    let point = Point::new(line as usize, character as usize);
    let node = match smallest_node_at(tree.root_node(), point) {
        Some(n) => n,
        None => return CompletionContext::None,
    };

    if let Some(_attr_list) = ancestor_of_kind(node, "attribute_list") {
        let before = line_before_cursor(source, line, character);
        if let Some(args) = ancestor_of_kind(node, "arguments") {
            let attr = match ancestor_of_kind(args, "attribute") {
                Some(a) => a,
                None => return CompletionContext::None,
            };
            let annotation = attr
                .named_child(0)
                .map(|n| source[n.byte_range()].to_string())
                .unwrap_or_default();
            return CompletionContext::AttributeProperty {
                annotation,
                prefix: trailing_identifier(before),
            };
        }
        return CompletionContext::AttributeName {
            prefix: trailing_name(before),
        };
    }

    let comment = if node.kind() == "comment" {
        Some(node)
    } else {
        ancestor_of_kind(node, "comment")
    };
    match comment {
        Some(c) if source[c.byte_range()].starts_with("/**") => {
            docblock_context(line_before_cursor(source, line, character))
        }
        _ => CompletionContext::None,
    }
}

/// Classify a docblock position from the line text before the cursor.
///
/// `* @Ro` is a tag-name context with prefix `Ro`; `* @Route(na` is a
/// property context for `Route` with prefix `na`; past the closing paren
/// there is nothing to complete.
fn docblock_context(before: &str) -> CompletionContext {
    let at = match before.rfind('@') {
        Some(idx) => idx,
        None => return CompletionContext::None,
    };
    let rest = &before[at + 1..];

    match rest.find('(') {
        Some(paren) => {
            let annotation = &rest[..paren];
            if annotation.is_empty() || !is_name(annotation) {
                return CompletionContext::None;
            }
            let args = &rest[paren + 1..];
            if args.contains(')') {
                return CompletionContext::None;
            }
            CompletionContext::TagProperty {
                annotation: annotation.to_string(),
                prefix: trailing_identifier(args),
            }
        }
        None => {
            if is_name(rest) {
                CompletionContext::TagName {
                    prefix: rest.to_string(),
                }
            } else {
                CompletionContext::None
            }
        }
    }
}

/// Text of the line strictly before the cursor. The LSP character offset
/// counts UTF-16 code units, so it is converted to a byte offset instead of
/// being used as one.
fn line_before_cursor(source: &str, line: u32, character: u32) -> &str {
    let text = source.lines().nth(line as usize).unwrap_or("");
    let target = character as usize;
    let mut units = 0usize;
    for (byte_idx, ch) in text.char_indices() {
        if units >= target {
            return &text[..byte_idx];
        }
        units += ch.len_utf16();
    }
    text
}

/// True for a (possibly empty, possibly qualified) PHP name.
fn is_name(s: &str) -> bool {
    s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '\\')
}

/// Trailing run of identifier characters, as the prefix being typed.
fn trailing_identifier(s: &str) -> String {
    s.chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}

/// Like `trailing_identifier`, but allows namespace separators.
fn trailing_name(s: &str) -> String {
    s.chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '\\')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}
