//! Docblock parser for annotation declarations.
//!
//! Reads the Doctrine conventions from a class docblock: the `@Annotation`
//! marker that makes a class an annotation, and the `@Target(...)` tag that
//! constrains where it may be applied.

use php_annot_types::TargetKind;

/// Parsed docblock facts relevant to annotation definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocblockInfo {
    /// First paragraph of free text, joined to one line.
    pub summary: Option<String>,
    /// True when the docblock carries the `@Annotation` marker tag.
    pub is_annotation: bool,
    /// Targets declared via `@Target(...)`. Empty when the tag is absent
    /// (unconstrained) or names nothing recognizable.
    pub targets: Vec<TargetKind>,
}

/// Parse a docblock comment string, including the `/**` and `*/` markers.
pub fn parse_docblock(comment: &str) -> DocblockInfo {
    let mut info = DocblockInfo::default();

    let mut summary_lines: Vec<String> = Vec::new();
    let mut in_summary = true;

    for line in strip_comment_markers(comment) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if in_summary && !summary_lines.is_empty() {
                in_summary = false;
            }
            continue;
        }

        if let Some(tag) = trimmed.strip_prefix('@') {
            in_summary = false;
            parse_tag(tag, &mut info);
        } else if in_summary {
            summary_lines.push(trimmed.to_string());
        }
    }

    if !summary_lines.is_empty() {
        info.summary = Some(summary_lines.join(" "));
    }

    info
}

fn strip_comment_markers(comment: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for line in comment.lines() {
        let trimmed = line.trim();
        let mut stripped = if let Some(rest) = trimmed.strip_prefix("/**") {
            rest.trim()
        } else if trimmed.starts_with("*/") {
            continue;
        } else if let Some(rest) = trimmed.strip_prefix('*') {
            rest.trim_start()
        } else {
            trimmed
        };
        if stripped.ends_with("*/") {
            stripped = stripped[..stripped.len() - 2].trim_end();
        }
        if !stripped.is_empty() {
            lines.push(stripped.to_string());
        }
    }
    lines
}

fn parse_tag(tag: &str, info: &mut DocblockInfo) {
    // Marker tag: "@Annotation", bare or with trailing text.
    if tag == "Annotation" || tag.starts_with("Annotation ") {
        info.is_annotation = true;
        return;
    }

    if let Some(rest) = tag.strip_prefix("Target") {
        let rest = rest.trim();
        if let Some(args) = rest.strip_prefix('(') {
            let args = args.split(')').next().unwrap_or(args);
            info.targets = parse_target_args(args);
        }
    }
}

/// Parse the argument list of `@Target`: either a single quoted token
/// (`"ALL"`) or a braced list (`{"CLASS", "METHOD"}`).
///
/// Unrecognized tokens become `Unknown` rather than being dropped, so an
/// annotation with an unparseable constraint still completes everywhere.
fn parse_target_args(args: &str) -> Vec<TargetKind> {
    let mut targets = Vec::new();
    for token in args.split(',') {
        let token = token
            .trim()
            .trim_matches(|c| c == '{' || c == '}' || c == '"' || c == '\'')
            .trim();
        if token.is_empty() {
            continue;
        }
        let kind = TargetKind::from_doctrine_token(token).unwrap_or(TargetKind::Unknown);
        if !targets.contains(&kind) {
            targets.push(kind);
        }
    }
    targets
}
