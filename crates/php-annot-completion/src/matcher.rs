//! Candidate and property resolution.
//!
//! `resolve_candidates` narrows the catalog to the annotations applicable at
//! a target; `resolve_properties` looks up the property descriptors for an
//! annotation reference written in a file. Both come back empty rather than
//! erroring when nothing matches.

use php_annot_index::AnnotationCatalog;
use php_annot_parser::resolve::resolve_annotation_name;
use php_annot_types::{AnnotationDefinition, FileAnnotations, PropertyDescriptor, TargetKind};
use std::sync::Arc;

/// Annotations applicable at the given target, sorted by FQN ascending.
///
/// An annotation with no target constraint applies everywhere, and so do
/// `All`, `Unknown` and `Undefined` constraints; only a concrete constraint
/// that excludes the target filters a definition out.
pub fn resolve_candidates(
    target: TargetKind,
    definitions: &[Arc<AnnotationDefinition>],
) -> Vec<Arc<AnnotationDefinition>> {
    let mut candidates: Vec<Arc<AnnotationDefinition>> = definitions
        .iter()
        .filter(|def| def.matches_target(target))
        .cloned()
        .collect();
    candidates.sort_by(|a, b| a.fqn.cmp(&b.fqn));
    candidates
}

/// Property descriptors for an annotation reference, in declaration order.
///
/// The reference is resolved against the file's imports and namespace; an
/// unresolvable reference yields no properties.
pub fn resolve_properties(
    reference: &str,
    file: &FileAnnotations,
    catalog: &AnnotationCatalog,
) -> Vec<PropertyDescriptor> {
    let fqn = resolve_annotation_name(reference, file);
    match catalog.resolve_fqn(&fqn) {
        Some(def) => def.properties.clone(),
        None => Vec::new(),
    }
}
