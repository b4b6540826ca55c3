//! Resolve annotation references to fully qualified names.
//!
//! An annotation reference like `@Route` or `#[Listen]` is resolved against
//! the file's use statements and namespace, following PHP name resolution:
//! a leading backslash is already fully qualified, an alias or imported name
//! matches a use statement (including `use A\B;` + `B\C` partial matches),
//! and anything else is relative to the current namespace.

use php_annot_types::{FileAnnotations, UseKind};

/// Resolve an annotation reference to an FQN (without leading backslash).
pub fn resolve_annotation_name(name: &str, file: &FileAnnotations) -> String {
    if let Some(stripped) = name.strip_prefix('\\') {
        return stripped.to_string();
    }

    let (head, rest) = match name.split_once('\\') {
        Some((head, rest)) => (head, Some(rest)),
        None => (name, None),
    };

    for stmt in &file.use_statements {
        if stmt.kind != UseKind::Class {
            continue;
        }
        let imported = stmt
            .alias
            .as_deref()
            .unwrap_or_else(|| stmt.fqn.rsplit('\\').next().unwrap_or(&stmt.fqn));
        if imported == head {
            return match rest {
                Some(rest) => format!("{}\\{}", stmt.fqn, rest),
                None => stmt.fqn.clone(),
            };
        }
    }

    match &file.namespace {
        Some(ns) if !ns.is_empty() => format!("{}\\{}", ns, name),
        _ => name.to_string(),
    }
}
