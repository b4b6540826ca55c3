//! Annotation completion for php-annot-lsp.
//!
//! Splits the work in three: `context` decides what the cursor position is
//! asking for, `matcher` narrows the catalog to applicable candidates, and
//! `provider` turns the result into LSP completion items.

pub mod context;
pub mod matcher;
pub mod provider;

pub use context::{detect_context, CompletionContext};
pub use matcher::{resolve_candidates, resolve_properties};
pub use provider::provide_completions;
