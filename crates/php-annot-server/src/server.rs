//! LSP server implementation — LanguageServer trait.

use dashmap::DashMap;
use php_annot_completion::context::{detect_context, CompletionContext};
use php_annot_completion::provider::provide_completions;
use php_annot_index::builtin::load_builtins;
use php_annot_index::composer::{parse_composer_json, NamespaceMap};
use php_annot_index::AnnotationCatalog;
use php_annot_parser::extract::extract_file_annotations;
use php_annot_parser::parser::FileParser;
use php_annot_parser::target::target_at;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

/// Main LSP backend holding all state.
pub struct PhpAnnotBackend {
    /// Client handle for sending notifications to the editor.
    client: Client,
    /// Open document parsers (URI string → FileParser).
    open_files: Arc<DashMap<String, FileParser>>,
    /// Workspace-wide annotation catalog.
    catalog: Arc<AnnotationCatalog>,
    /// Workspace root path (set during initialize).
    workspace_root: Mutex<Option<PathBuf>>,
    /// Namespace map from composer.json.
    namespace_map: Mutex<Option<NamespaceMap>>,
    /// Whether annotation completion is enabled (client setting).
    enabled: AtomicBool,
}

impl PhpAnnotBackend {
    pub fn new(client: Client) -> Self {
        PhpAnnotBackend {
            client,
            open_files: Arc::new(DashMap::new()),
            catalog: Arc::new(AnnotationCatalog::new()),
            workspace_root: Mutex::new(None),
            namespace_map: Mutex::new(None),
            enabled: AtomicBool::new(true),
        }
    }

    /// Re-extract annotation facts for a document and refresh the catalog.
    fn reindex_document(&self, uri: &str, parser: &FileParser) {
        if let Some(tree) = parser.tree() {
            let source = parser.source();
            let file = extract_file_annotations(tree, &source, uri);
            let def_count = file.definitions.len();
            self.catalog.update_file(uri, file);
            if def_count > 0 {
                tracing::debug!("Indexed {} annotation definitions from {}", def_count, uri);
            }
        }
    }
}

/// Collect all .php files from the given directories.
fn collect_php_files(directories: &[&Path], root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in directories {
        let abs_dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        };
        if abs_dir.is_dir() {
            collect_php_files_recursive(&abs_dir, &mut files);
        }
    }
    files
}

/// Recursively collect .php files from a directory.
fn collect_php_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            // Skip hidden directories and vendor
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.starts_with('.') || name_str == "vendor" || name_str == "node_modules" {
                continue;
            }
            collect_php_files_recursive(&path, files);
        } else if path.extension().and_then(|e| e.to_str()) == Some("php") {
            files.push(path);
        }
    }
}

/// Convert a file path to a file:// URI.
fn path_to_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Background workspace scan: parse every PHP file under the autoload
/// directories and collect annotation definitions into the catalog.
async fn scan_workspace(
    client: &Client,
    catalog: &AnnotationCatalog,
    root: &Path,
    namespace_map: Option<&NamespaceMap>,
) {
    let php_files = if let Some(ns_map) = namespace_map {
        let source_dirs = ns_map.source_directories();
        if source_dirs.is_empty() {
            collect_php_files(&[root], root)
        } else {
            collect_php_files(&source_dirs, root)
        }
    } else {
        collect_php_files(&[root], root)
    };

    let total = php_files.len();
    tracing::info!("Scanning {} PHP files for annotation definitions", total);

    let mut definitions = 0usize;
    for (i, file_path) in php_files.iter().enumerate() {
        match std::fs::read_to_string(file_path) {
            Ok(source) => {
                let mut parser = FileParser::new();
                parser.parse_full(&source);
                if let Some(tree) = parser.tree() {
                    let uri = path_to_uri(file_path);
                    let file = extract_file_annotations(tree, &source, &uri);
                    definitions += file.definitions.len();
                    catalog.update_file(&uri, file);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", file_path.display(), e);
            }
        }

        // Yield to allow other tasks to run
        if i % 50 == 0 {
            tokio::task::yield_now().await;
        }
    }

    tracing::info!(
        "Workspace scan complete: {} definitions in {} files",
        definitions,
        total
    );
    client
        .log_message(
            MessageType::INFO,
            format!(
                "php-annot-lsp: found {} annotation definitions in {} files",
                definitions, total
            ),
        )
        .await;
}

#[tower_lsp::async_trait]
impl LanguageServer for PhpAnnotBackend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("php-annot-lsp: initialize");

        #[allow(deprecated)]
        let root_path = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok())
            .or_else(|| params.root_path.as_ref().map(PathBuf::from));

        if let Some(ref root) = root_path {
            tracing::info!("Workspace root: {}", root.display());
            *self.workspace_root.lock().await = Some(root.clone());
        }

        if let Some(ref opts) = params.initialization_options {
            if let Some(enabled) = opts.pointer("/annotations/enabled").and_then(|v| v.as_bool()) {
                tracing::info!("Annotation completion enabled: {}", enabled);
                self.enabled.store(enabled, Ordering::Relaxed);
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                        ..Default::default()
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![
                        "@".to_string(),
                        "[".to_string(),
                        "(".to_string(),
                    ]),
                    resolve_provider: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "php-annot-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        tracing::info!("php-annot-lsp: initialized");

        let loaded = load_builtins(&self.catalog);
        tracing::info!("Loaded {} bundled annotation definitions", loaded);

        let workspace_root = self.workspace_root.lock().await.clone();
        if let Some(root) = workspace_root {
            let ns_map = {
                let composer_path = root.join("composer.json");
                if composer_path.exists() {
                    match parse_composer_json(&composer_path) {
                        Ok(ns_map) => {
                            tracing::info!(
                                "Parsed composer.json with {} PSR-4 entries",
                                ns_map.psr4.len()
                            );
                            Some(ns_map)
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse composer.json: {}", e);
                            None
                        }
                    }
                } else {
                    tracing::info!("No composer.json found, will scan all PHP files");
                    None
                }
            };
            *self.namespace_map.lock().await = ns_map.clone();

            let client = self.client.clone();
            let catalog = self.catalog.clone();
            tokio::spawn(async move {
                scan_workspace(&client, &catalog, &root, ns_map.as_ref()).await;
            });
        } else {
            tracing::warn!("No workspace root, skipping scan");
        }
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("php-annot-lsp: shutdown");
        Ok(())
    }

    // --- Document Synchronization ---

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri_str = params.text_document.uri.to_string();
        tracing::debug!("didOpen: {}", uri_str);

        let mut parser = FileParser::new();
        parser.parse_full(&params.text_document.text);
        self.reindex_document(&uri_str, &parser);
        self.open_files.insert(uri_str, parser);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri_str = params.text_document.uri.to_string();
        tracing::debug!("didChange: {}", uri_str);

        if let Some(mut parser) = self.open_files.get_mut(&uri_str) {
            for change in &params.content_changes {
                if let Some(range) = change.range {
                    parser.apply_edit(
                        range.start.line,
                        range.start.character,
                        range.end.line,
                        range.end.character,
                        &change.text,
                    );
                } else {
                    // Full content replacement
                    parser.parse_full(&change.text);
                }
            }
            self.reindex_document(&uri_str, &parser);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri_str = params.text_document.uri.to_string();
        tracing::debug!("didClose: {}", uri_str);
        // The file still exists in the workspace, so its definitions stay
        // in the catalog; only the parser state is dropped.
        self.open_files.remove(&uri_str);
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        tracing::debug!("didSave: {}", params.text_document.uri.as_str());
    }

    // --- Completion ---

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        if !self.enabled.load(Ordering::Relaxed) {
            return Ok(None);
        }

        let uri_str = params.text_document_position.text_document.uri.to_string();
        let pos = params.text_document_position.position;
        tracing::debug!("completion: {}:{}:{}", uri_str, pos.line, pos.character);

        let parser = match self.open_files.get(&uri_str) {
            Some(p) => p,
            None => return Ok(None),
        };
        let tree = match parser.tree() {
            Some(t) => t,
            None => return Ok(None),
        };
        let source = parser.source();
        let file = extract_file_annotations(tree, &source, &uri_str);

        let context = detect_context(tree, &source, pos.line, pos.character);
        if context == CompletionContext::None {
            return Ok(None);
        }

        // Name contexts need to know what the annotation would apply to;
        // property contexts do not.
        let target = match context {
            CompletionContext::TagName { .. } | CompletionContext::AttributeName { .. } => {
                target_at(tree, &source, pos.line, pos.character)
            }
            _ => None,
        };

        let items = provide_completions(&context, target, &self.catalog, &file);
        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn completion_resolve(&self, mut item: CompletionItem) -> Result<CompletionItem> {
        // The FQN travels in item.data
        let fqn = match item.data.as_ref().and_then(|d| d.as_str()) {
            Some(fqn) => fqn.to_string(),
            None => return Ok(item),
        };

        if let Some(def) = self.catalog.resolve_fqn(&fqn) {
            let mut doc_parts = Vec::new();
            if let Some(ref summary) = def.summary {
                doc_parts.push(summary.clone());
            }
            if def.targets.is_empty() {
                doc_parts.push("Applies anywhere.".to_string());
            } else {
                let targets: Vec<String> = def.targets.iter().map(|t| t.to_string()).collect();
                doc_parts.push(format!("Applies to: {}", targets.join(", ")));
            }
            if !def.properties.is_empty() {
                let props: Vec<String> = def
                    .properties
                    .iter()
                    .map(|p| format!("- `{}` ({})", p.name, p.value_kind))
                    .collect();
                doc_parts.push(format!("Properties:\n{}", props.join("\n")));
            }

            item.documentation = Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: doc_parts.join("\n\n"),
            }));
        }

        Ok(item)
    }
}
