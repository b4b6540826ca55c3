//! Global catalog of annotation definitions.

use dashmap::DashMap;
use php_annot_types::{AnnotationDefinition, FileAnnotations};
use std::sync::Arc;

/// All annotation definitions known to the workspace, keyed by FQN, plus
/// the per-file extraction results they came from.
pub struct AnnotationCatalog {
    /// FQN → definition for every known annotation class.
    definitions: DashMap<String, Arc<AnnotationDefinition>>,

    /// File URI → extracted annotation facts for that file.
    files: DashMap<String, FileAnnotations>,
}

impl AnnotationCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        AnnotationCatalog {
            definitions: DashMap::new(),
            files: DashMap::new(),
        }
    }

    /// Update definitions from a single file. Removes the file's old
    /// definitions first so renames and deletions are reflected.
    pub fn update_file(&self, uri: &str, file: FileAnnotations) {
        self.remove_file(uri);

        for def in &file.definitions {
            self.definitions
                .insert(def.fqn.clone(), Arc::new(def.clone()));
        }

        self.files.insert(uri.to_string(), file);
    }

    /// Remove all definitions contributed by a file. Bundled builtins are
    /// never keyed by file, so they survive.
    pub fn remove_file(&self, uri: &str) {
        if let Some((_, old)) = self.files.remove(uri) {
            for def in &old.definitions {
                self.definitions.remove(&def.fqn);
            }
        }
    }

    /// Insert a definition that does not belong to any workspace file
    /// (bundled framework stubs).
    pub fn insert_builtin(&self, def: AnnotationDefinition) {
        self.definitions.insert(def.fqn.clone(), Arc::new(def));
    }

    /// Look up a definition by fully qualified name.
    pub fn resolve_fqn(&self, fqn: &str) -> Option<Arc<AnnotationDefinition>> {
        self.definitions.get(fqn).map(|r| r.value().clone())
    }

    /// Snapshot of every known definition, sorted by FQN so callers get a
    /// stable order.
    pub fn snapshot(&self) -> Vec<Arc<AnnotationDefinition>> {
        let mut defs: Vec<Arc<AnnotationDefinition>> = self
            .definitions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        defs.sort_by(|a, b| a.fqn.cmp(&b.fqn));
        defs
    }

    /// Number of known definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for AnnotationCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_def(name: &str, fqn: &str, uri: &str) -> AnnotationDefinition {
        AnnotationDefinition {
            name: name.to_string(),
            fqn: fqn.to_string(),
            targets: vec![],
            properties: vec![],
            uri: uri.to_string(),
            summary: None,
            is_builtin: false,
        }
    }

    fn file_with(defs: Vec<AnnotationDefinition>) -> FileAnnotations {
        FileAnnotations {
            namespace: Some("App".to_string()),
            use_statements: vec![],
            definitions: defs,
        }
    }

    #[test]
    fn test_update_and_resolve() {
        let catalog = AnnotationCatalog::new();
        catalog.update_file(
            "file:///a.php",
            file_with(vec![make_def("Route", "App\\Route", "file:///a.php")]),
        );

        let found = catalog.resolve_fqn("App\\Route");
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "Route");
    }

    #[test]
    fn test_remove_file() {
        let catalog = AnnotationCatalog::new();
        catalog.update_file(
            "file:///a.php",
            file_with(vec![make_def("Route", "App\\Route", "file:///a.php")]),
        );
        assert!(catalog.resolve_fqn("App\\Route").is_some());

        catalog.remove_file("file:///a.php");
        assert!(catalog.resolve_fqn("App\\Route").is_none());
    }

    #[test]
    fn test_update_replaces_old() {
        let catalog = AnnotationCatalog::new();
        catalog.update_file(
            "file:///a.php",
            file_with(vec![make_def("Old", "App\\Old", "file:///a.php")]),
        );
        catalog.update_file(
            "file:///a.php",
            file_with(vec![make_def("New", "App\\New", "file:///a.php")]),
        );

        assert!(catalog.resolve_fqn("App\\Old").is_none());
        assert!(catalog.resolve_fqn("App\\New").is_some());
    }

    #[test]
    fn test_snapshot_sorted_by_fqn() {
        let catalog = AnnotationCatalog::new();
        catalog.update_file(
            "file:///a.php",
            file_with(vec![
                make_def("Zeta", "App\\Zeta", "file:///a.php"),
                make_def("Alpha", "App\\Alpha", "file:///a.php"),
            ]),
        );

        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].fqn, "App\\Alpha");
        assert_eq!(snapshot[1].fqn, "App\\Zeta");
    }

    #[test]
    fn test_builtins_survive_file_removal() {
        let catalog = AnnotationCatalog::new();
        let mut builtin = make_def("Entity", "Doctrine\\ORM\\Mapping\\Entity", "");
        builtin.is_builtin = true;
        catalog.insert_builtin(builtin);

        catalog.update_file(
            "file:///a.php",
            file_with(vec![make_def("Route", "App\\Route", "file:///a.php")]),
        );
        catalog.remove_file("file:///a.php");

        assert!(catalog.resolve_fqn("Doctrine\\ORM\\Mapping\\Entity").is_some());
        assert!(catalog.resolve_fqn("App\\Route").is_none());
    }
}
