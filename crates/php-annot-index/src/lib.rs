//! Workspace-wide annotation catalog for php-annot-lsp.
//!
//! Collects annotation definitions extracted from workspace files and
//! bundled framework stubs, and maps composer.json autoload configuration
//! to the source directories worth scanning.

pub mod builtin;
pub mod catalog;
pub mod composer;

pub use catalog::AnnotationCatalog;
pub use composer::{parse_composer_json, parse_composer_json_str, NamespaceMap};
