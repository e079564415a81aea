//! Shared fixtures: package source folders and a local HTTP server.

#![allow(dead_code, unreachable_pub)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, body::Bytes};
use serde_json::{Value, json};

/// Start a server on an ephemeral port and return its base URL.
///
/// Routes:
/// - `POST /echo`: returns the JSON body unchanged
/// - `POST /headers`: returns the auth-related request headers
/// - `POST /text`: returns a plain-text body
/// - `POST /slow`: responds after five seconds
/// - `GET /package.tpkg`: serves `archive`
/// - `GET /missing.tpkg`: 404
pub async fn spawn_server(archive: Vec<u8>) -> String {
    let archive = Bytes::from(archive);
    let app = Router::new()
        .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
        .route(
            "/headers",
            post(|headers: HeaderMap| async move {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                Json(json!({
                    "authorization": header("authorization"),
                    "apiKey": header("x-api-key"),
                }))
            }),
        )
        .route("/text", post(|| async { "plain text" }))
        .route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"late": true}))
            }),
        )
        .route(
            "/package.tpkg",
            get(move || {
                let archive = archive.clone();
                async move { archive }
            }),
        )
        .route(
            "/missing.tpkg",
            get(|| async { (StatusCode::NOT_FOUND, "no such package") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// Manifest of the `demo.echo` tool pointing at `url`.
pub fn echo_manifest(url: &str, version: &str, tests: &[&str]) -> Value {
    json!({
        "toolId": "demo.echo",
        "name": "Echo",
        "version": version,
        "description": "Echoes its input back as JSON",
        "capabilities": ["echo", "testing"],
        "endpoint": {"type": "http", "method": "POST", "url": url, "timeoutMs": 2000},
        "inputSchema": {
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"]
        },
        "outputSchema": {"type": "object"},
        "tests": tests,
        "meta": {"publisher": "demo", "license": "MIT"}
    })
}

/// A test case sending `{"message": "hello"}` with the given assertions.
pub fn hello_test(name: &str, assertions: Value) -> Value {
    json!({
        "name": name,
        "description": "sends hello",
        "input": {"message": "hello"},
        "assertions": assertions
    })
}

/// Write a package source folder and return its path.
pub fn write_source(
    dir: &Path,
    folder: &str,
    manifest: &Value,
    files: &[(&str, Value)],
) -> PathBuf {
    let src = dir.join(folder);
    write_json(&src.join("manifest.json"), manifest);
    for (relative, content) in files {
        write_json(&src.join(relative), content);
    }
    src
}
