//! php-annot-lsp server library.
//!
//! Exposes the backend so integration tests can drive it through an
//! in-process `LspService`.

pub mod server;

pub use server::PhpAnnotBackend;
