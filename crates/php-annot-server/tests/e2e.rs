//! End-to-end tests for the annotation LSP server.
//!
//! These tests exercise the full LSP protocol stack using tower-lsp's
//! in-process service, sending JSON-RPC requests and verifying responses.

use futures::StreamExt;
use serde_json::json;
use tower::{Service, ServiceExt};
use tower_lsp::jsonrpc::Request;
use tower_lsp::LspService;

use php_annot_server::PhpAnnotBackend;

fn initialize_request(id: i64) -> Request {
    Request::build("initialize")
        .params(json!({
            "capabilities": {},
            "rootUri": null
        }))
        .id(id)
        .finish()
}

fn initialize_request_with_options(id: i64, options: serde_json::Value) -> Request {
    Request::build("initialize")
        .params(json!({
            "capabilities": {},
            "rootUri": null,
            "initializationOptions": options
        }))
        .id(id)
        .finish()
}

fn initialized_notification() -> Request {
    Request::build("initialized").params(json!({})).finish()
}

fn shutdown_request(id: i64) -> Request {
    Request::build("shutdown").id(id).finish()
}

fn did_open_notification(uri: &str, text: &str) -> Request {
    Request::build("textDocument/didOpen")
        .params(json!({
            "textDocument": {
                "uri": uri,
                "languageId": "php",
                "version": 1,
                "text": text
            }
        }))
        .finish()
}

fn completion_request(id: i64, uri: &str, line: u32, character: u32) -> Request {
    Request::build("textDocument/completion")
        .params(json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character }
        }))
        .id(id)
        .finish()
}

/// Helper to extract the "result" field from a JSON-RPC response.
fn extract_result(response: Option<tower_lsp::jsonrpc::Response>) -> serde_json::Value {
    let resp = response.expect("expected a response");
    let serialized = serde_json::to_value(&resp).unwrap();
    serialized.get("result").cloned().unwrap_or(json!(null))
}

fn completion_labels(result: &serde_json::Value) -> Vec<String> {
    result
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.get("label").and_then(|l| l.as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

async fn start_and_initialize(
    service: &mut LspService<PhpAnnotBackend>,
    init: Request,
) -> serde_json::Value {
    let resp = service.ready().await.unwrap().call(init).await.unwrap();
    let result = extract_result(resp);
    service
        .ready()
        .await
        .unwrap()
        .call(initialized_notification())
        .await
        .unwrap();
    result
}

#[tokio::test(flavor = "current_thread")]
async fn test_initialize_and_shutdown() {
    let (mut service, socket) = LspService::new(PhpAnnotBackend::new);

    // Drain server→client messages so client.log_message() doesn't block.
    tokio::spawn(async move {
        socket.collect::<Vec<_>>().await;
    });

    let result = start_and_initialize(&mut service, initialize_request(1)).await;
    assert!(
        result.get("capabilities").is_some(),
        "expected capabilities in init result"
    );
    assert_eq!(
        result
            .get("serverInfo")
            .and_then(|s| s.get("name"))
            .and_then(|n| n.as_str()),
        Some("php-annot-lsp")
    );
    let triggers = result
        .pointer("/capabilities/completionProvider/triggerCharacters")
        .and_then(|t| t.as_array())
        .expect("completion trigger characters");
    assert!(triggers.contains(&json!("@")));

    let resp = service
        .ready()
        .await
        .unwrap()
        .call(shutdown_request(2))
        .await
        .unwrap();
    assert!(resp.is_some(), "shutdown should return a response");
}

#[tokio::test(flavor = "current_thread")]
async fn test_annotation_name_completion() {
    let (mut service, socket) = LspService::new(PhpAnnotBackend::new);
    tokio::spawn(async move {
        socket.collect::<Vec<_>>().await;
    });
    start_and_initialize(&mut service, initialize_request(1)).await;

    let code = r#"<?php
namespace App\Entity;

use Doctrine\ORM\Mapping\Entity;

/**
 * @
 */
class User {}
"#;
    let uri = "file:///test/User.php";
    service
        .ready()
        .await
        .unwrap()
        .call(did_open_notification(uri, code))
        .await
        .unwrap();

    // Complete after the "@" on line 6
    let resp = service
        .ready()
        .await
        .unwrap()
        .call(completion_request(2, uri, 6, 4))
        .await
        .unwrap();

    let result = extract_result(resp);
    let labels = completion_labels(&result);
    assert!(
        labels.iter().any(|l| l == "Entity"),
        "class-level completion should offer Entity, got: {:?}",
        labels
    );
    assert!(
        !labels.iter().any(|l| l == "Column"),
        "property-only annotations must not appear at a class site"
    );

    service
        .ready()
        .await
        .unwrap()
        .call(shutdown_request(99))
        .await
        .unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_annotation_property_completion() {
    let (mut service, socket) = LspService::new(PhpAnnotBackend::new);
    tokio::spawn(async move {
        socket.collect::<Vec<_>>().await;
    });
    start_and_initialize(&mut service, initialize_request(1)).await;

    let code = r#"<?php
namespace App\Controller;

use Symfony\Component\Routing\Annotation\Route;

class UserController {
    /**
     * @Route(
     */
    public function index() {}
}
"#;
    let uri = "file:///test/UserController.php";
    service
        .ready()
        .await
        .unwrap()
        .call(did_open_notification(uri, code))
        .await
        .unwrap();

    // Complete inside the parentheses on line 7
    let resp = service
        .ready()
        .await
        .unwrap()
        .call(completion_request(2, uri, 7, 14))
        .await
        .unwrap();

    let result = extract_result(resp);
    let labels = completion_labels(&result);
    assert!(
        labels.iter().any(|l| l == "path"),
        "Route property completion should offer path, got: {:?}",
        labels
    );
    assert!(labels.iter().any(|l| l == "methods"));

    service
        .ready()
        .await
        .unwrap()
        .call(shutdown_request(99))
        .await
        .unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_workspace_definition_completion() {
    let (mut service, socket) = LspService::new(PhpAnnotBackend::new);
    tokio::spawn(async move {
        socket.collect::<Vec<_>>().await;
    });
    start_and_initialize(&mut service, initialize_request(1)).await;

    // Opening a file with an annotation class feeds the catalog.
    let annot_code = r#"<?php
namespace App\Annot;

/**
 * @Annotation
 * @Target({"METHOD"})
 */
class Benchmark {
    public int $iterations = 10;
    public array $tags = [];
}
"#;
    service
        .ready()
        .await
        .unwrap()
        .call(did_open_notification("file:///test/Benchmark.php", annot_code))
        .await
        .unwrap();

    let user_code = r#"<?php
namespace App\Service;

use App\Annot\Benchmark;

class Worker {
    /**
     * @Bench
     */
    public function run() {}
}
"#;
    let uri = "file:///test/Worker.php";
    service
        .ready()
        .await
        .unwrap()
        .call(did_open_notification(uri, user_code))
        .await
        .unwrap();

    let resp = service
        .ready()
        .await
        .unwrap()
        .call(completion_request(2, uri, 7, 13))
        .await
        .unwrap();

    let result = extract_result(resp);
    let labels = completion_labels(&result);
    assert!(
        labels.iter().any(|l| l == "Benchmark"),
        "workspace-defined annotation should complete, got: {:?}",
        labels
    );

    service
        .ready()
        .await
        .unwrap()
        .call(shutdown_request(99))
        .await
        .unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_completion_disabled_by_client_setting() {
    let (mut service, socket) = LspService::new(PhpAnnotBackend::new);
    tokio::spawn(async move {
        socket.collect::<Vec<_>>().await;
    });
    start_and_initialize(
        &mut service,
        initialize_request_with_options(1, json!({ "annotations": { "enabled": false } })),
    )
    .await;

    let code = "<?php\n/**\n * @\n */\nclass User {}\n";
    let uri = "file:///test/User.php";
    service
        .ready()
        .await
        .unwrap()
        .call(did_open_notification(uri, code))
        .await
        .unwrap();

    let resp = service
        .ready()
        .await
        .unwrap()
        .call(completion_request(2, uri, 2, 4))
        .await
        .unwrap();

    let result = extract_result(resp);
    assert!(result.is_null(), "completion must be off when disabled");

    service
        .ready()
        .await
        .unwrap()
        .call(shutdown_request(99))
        .await
        .unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_completion_outside_annotation_context() {
    let (mut service, socket) = LspService::new(PhpAnnotBackend::new);
    tokio::spawn(async move {
        socket.collect::<Vec<_>>().await;
    });
    start_and_initialize(&mut service, initialize_request(1)).await;

    let code = "<?php\nclass User {\n    public $name;\n}\n";
    let uri = "file:///test/Plain.php";
    service
        .ready()
        .await
        .unwrap()
        .call(did_open_notification(uri, code))
        .await
        .unwrap();

    let resp = service
        .ready()
        .await
        .unwrap()
        .call(completion_request(2, uri, 2, 10))
        .await
        .unwrap();

    let result = extract_result(resp);
    assert!(result.is_null(), "no items outside annotation contexts");

    service
        .ready()
        .await
        .unwrap()
        .call(shutdown_request(99))
        .await
        .unwrap();
}
