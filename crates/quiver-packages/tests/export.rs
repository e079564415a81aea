//! Tool export over installed packages.

mod common;

use std::collections::HashMap;
use std::path::Path;

use common::{echo_manifest, hello_test, spawn_server, write_source};
use quiver_packages::{
    PackageCreator, PackageInstaller, TestRunner, ToolDefinition, ToolsExporter,
};
use serde_json::{Value, json};

fn install(tmp: &Path, installer: &PackageInstaller, manifest: &Value, files: &[(&str, Value)]) {
    let src = write_source(tmp, "src", manifest, files);
    let archive = tmp.join("pkg.tpkg");
    let created = PackageCreator::default().create_package(&src, Some(&archive), false);
    assert!(created.archive_path.is_some(), "{:?}", created.validation.errors);
    let installed = installer.install_from_path(&archive, true);
    assert!(installed.package.is_some(), "{:?}", installed.validation.errors);
}

fn exporter(installer: PackageInstaller) -> ToolsExporter {
    ToolsExporter::new(
        installer,
        TestRunner::new(reqwest::Client::new(), HashMap::new()),
    )
}

#[tokio::test]
async fn export_with_tests_attaches_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_server(Vec::new()).await;
    let installer = PackageInstaller::new(tmp.path().join("root"));
    let mut manifest = echo_manifest(
        &format!("{base}/echo"),
        "1.0.0",
        &["tests/pass.json", "tests/fail.json"],
    );
    manifest["examples"] = json!(["examples/usage.json", "examples/absent.json"]);
    install(
        tmp.path(),
        &installer,
        &manifest,
        &[
            (
                "tests/pass.json",
                hello_test("pass", json!([{"path": "$.message", "equals": "hello"}])),
            ),
            (
                "tests/fail.json",
                hello_test("fail", json!([{"path": "$.message", "equals": "bye"}])),
            ),
            ("examples/usage.json", json!({"call": "echo"})),
        ],
    );

    let out = tmp.path().join("tools.json");
    let tools = exporter(installer).export_tools(Some(&out), true).await.unwrap();

    assert_eq!(tools.len(), 1);
    let tool = &tools[0];
    assert_eq!(tool.tool_id, "demo.echo");
    assert_eq!(tool.capabilities, vec!["echo", "testing"]);
    assert_eq!(tool.input_schema["required"], json!(["message"]));
    let examples = tool.examples.as_ref().unwrap();
    assert_eq!(examples.len(), 1);
    assert!(examples[0].contains("\"call\""));

    let summary = tool.test_summary.as_ref().unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);

    let written: Vec<ToolDefinition> =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].tool_id, "demo.echo");
    assert_eq!(written[0].test_summary.as_ref().unwrap().total, 2);
}

#[tokio::test]
async fn zero_valid_tests_means_no_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let installer = PackageInstaller::new(tmp.path().join("root"));
    install(
        tmp.path(),
        &installer,
        &echo_manifest(
            "http://127.0.0.1:9/echo",
            "1.0.0",
            &["tests/broken.json", "tests/empty.json", "tests/absent.json"],
        ),
        &[
            ("tests/broken.json", json!("not a test case")),
            (
                "tests/empty.json",
                json!({"name": "empty", "description": "d", "input": {}, "assertions": []}),
            ),
        ],
    );

    let tools = exporter(installer).export_tools(None, true).await.unwrap();

    assert_eq!(tools.len(), 1);
    assert!(tools[0].test_summary.is_none());
}

#[tokio::test]
async fn export_without_tests_skips_runner() {
    let tmp = tempfile::tempdir().unwrap();
    let installer = PackageInstaller::new(tmp.path().join("root"));
    install(
        tmp.path(),
        &installer,
        &echo_manifest("http://127.0.0.1:9/echo", "1.0.0", &["tests/pass.json"]),
        &[(
            "tests/pass.json",
            hello_test("pass", json!([{"path": "$.message", "exists": true}])),
        )],
    );
    let exporter = exporter(installer);

    let tool = exporter.export_tool("demo.echo", false).await.unwrap();
    assert!(tool.test_summary.is_none());
    assert!(tool.examples.is_none());
    assert!(exporter.export_tool("demo.missing", false).await.is_none());
}
