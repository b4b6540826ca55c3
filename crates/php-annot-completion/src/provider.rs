//! Build LSP completion items from a detected context.

use crate::context::CompletionContext;
use crate::matcher::{resolve_candidates, resolve_properties};
use lsp_types::{CompletionItem, CompletionItemKind};
use php_annot_index::AnnotationCatalog;
use php_annot_parser::resolve::resolve_annotation_name;
use php_annot_types::{AnnotationDefinition, FileAnnotations, PropertyDescriptor, TargetKind};
use serde_json::json;
use std::sync::Arc;

/// Produce completion items for a context.
///
/// Name contexts need a classified target; when the cursor annotates
/// nothing, there is nothing to offer and the result is empty.
pub fn provide_completions(
    context: &CompletionContext,
    target: Option<TargetKind>,
    catalog: &AnnotationCatalog,
    file: &FileAnnotations,
) -> Vec<CompletionItem> {
    match context {
        CompletionContext::TagName { prefix } | CompletionContext::AttributeName { prefix } => {
            let target = match target {
                Some(t) => t,
                None => return Vec::new(),
            };
            let candidates = resolve_candidates(target, &catalog.snapshot());
            tracing::debug!("{} annotation candidates at {} site", candidates.len(), target);
            candidates
                .iter()
                .filter(|def| matches_prefix(def, prefix, file))
                .enumerate()
                .map(|(idx, def)| annotation_item(def, idx))
                .collect()
        }
        CompletionContext::TagProperty { annotation, prefix }
        | CompletionContext::AttributeProperty { annotation, prefix } => {
            let prefix_lower = prefix.to_lowercase();
            resolve_properties(annotation, file, catalog)
                .iter()
                .filter(|p| p.name.to_lowercase().starts_with(&prefix_lower))
                .enumerate()
                .map(|(idx, prop)| property_item(prop, idx))
                .collect()
        }
        CompletionContext::None => Vec::new(),
    }
}

/// Prefix match for annotation names: a plain prefix matches the short
/// class name; a qualified prefix (`ORM\Col`) is resolved through the
/// file's imports and matched against the FQN.
fn matches_prefix(def: &Arc<AnnotationDefinition>, prefix: &str, file: &FileAnnotations) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if prefix.contains('\\') {
        let resolved = resolve_annotation_name(prefix, file);
        return def.fqn.to_lowercase().starts_with(&resolved.to_lowercase());
    }
    def.name.to_lowercase().starts_with(&prefix.to_lowercase())
}

fn annotation_item(def: &Arc<AnnotationDefinition>, idx: usize) -> CompletionItem {
    CompletionItem {
        label: def.name.clone(),
        kind: Some(CompletionItemKind::CLASS),
        detail: Some(def.fqn.clone()),
        sort_text: Some(format!("{:04}", idx)),
        // The FQN travels with the item so completionItem/resolve can find
        // the definition again.
        data: Some(json!(def.fqn)),
        ..Default::default()
    }
}

fn property_item(prop: &PropertyDescriptor, idx: usize) -> CompletionItem {
    let detail = match &prop.default_value {
        Some(default) => format!("{} (default: {})", prop.value_kind, default),
        None => prop.value_kind.to_string(),
    };
    CompletionItem {
        label: prop.name.clone(),
        kind: Some(CompletionItemKind::FIELD),
        detail: Some(detail),
        sort_text: Some(format!("{:04}", idx)),
        ..Default::default()
    }
}
