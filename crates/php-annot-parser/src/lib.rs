//! PHP parsing for php-annot-lsp.
//!
//! Wraps tree-sitter-php for incremental parsing and provides docblock
//! parsing, annotation-definition extraction, annotation name resolution,
//! and position-to-target-kind classification.

pub mod docblock;
pub mod extract;
pub mod parser;
pub mod resolve;
pub mod target;
