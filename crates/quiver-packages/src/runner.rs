//! Test execution against a tool's HTTP endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::assertions::{AssertionResult, evaluate_assertion};
use crate::auth::AuthStrategies;
use crate::manifest::{ENDPOINT_KIND_HTTP, HttpMethod, Manifest};
use crate::query::{JsonPathSelector, PathSelector};
use crate::test_case::TestCase;

/// Timeout applied when neither the test nor the endpoint sets one.
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Name of the test case.
    pub test_name: String,
    /// `true` iff the call succeeded and every assertion held.
    pub passed: bool,
    /// Wall-clock time of the call plus assertion evaluation.
    pub duration_ms: u64,
    /// Parsed response body, or a `{statusCode, response}` wrapper for
    /// non-JSON bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<Value>,
    /// One entry per assertion, in order.
    #[serde(default)]
    pub assertion_results: Vec<AssertionResult>,
    /// Why the call itself failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP status of the response, when one arrived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// Executes test cases, one call in flight at a time.
#[derive(Clone)]
pub struct TestRunner {
    client: reqwest::Client,
    env: HashMap<String, String>,
    default_timeout: Duration,
    strategies: AuthStrategies,
    selector: Arc<dyn PathSelector>,
}

impl std::fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRunner")
            .field("default_timeout", &self.default_timeout)
            .field("env_vars", &self.env.len())
            .field("strategies", &self.strategies)
            .finish_non_exhaustive()
    }
}

impl TestRunner {
    /// Create a runner that resolves credentials from `env`.
    #[must_use]
    pub fn new(client: reqwest::Client, env: HashMap<String, String>) -> Self {
        Self {
            client,
            env,
            default_timeout: DEFAULT_TEST_TIMEOUT,
            strategies: AuthStrategies::default(),
            selector: Arc::new(JsonPathSelector),
        }
    }

    /// Replace the fallback timeout.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Replace the credential strategies.
    #[must_use]
    pub fn with_strategies(mut self, strategies: AuthStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    /// Replace the path-query capability.
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn PathSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Test timeout, else endpoint timeout, else the runner default.
    #[must_use]
    pub fn effective_timeout(&self, manifest: &Manifest, test_case: &TestCase) -> Duration {
        test_case
            .timeout()
            .or_else(|| manifest.endpoint.as_ref().and_then(|e| e.timeout()))
            .unwrap_or(self.default_timeout)
    }

    /// Run every test case in order. A failing test never stops the batch.
    pub async fn run_tests(&self, manifest: &Manifest, test_cases: &[TestCase]) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(test_cases.len());
        for test_case in test_cases {
            results.push(self.run_test(manifest, test_case).await);
        }
        let passed = results.iter().filter(|r| r.passed).count();
        info!(
            tool_id = %manifest.tool_id,
            total = results.len(),
            passed,
            "test run complete"
        );
        results
    }

    /// Run one test case.
    pub async fn run_test(&self, manifest: &Manifest, test_case: &TestCase) -> TestResult {
        let started = Instant::now();
        let timeout = self.effective_timeout(manifest, test_case);
        debug!(
            tool_id = %manifest.tool_id,
            test = %test_case.name,
            timeout_ms = timeout.as_millis(),
            "running test"
        );

        let call = tokio::time::timeout(timeout, self.call_endpoint(manifest, test_case)).await;

        let mut result = TestResult {
            test_name: test_case.name.clone(),
            passed: false,
            duration_ms: 0,
            actual_output: None,
            assertion_results: Vec::new(),
            error_message: None,
            status_code: None,
        };

        match call {
            Err(_) => {
                result.error_message = Some(format!(
                    "request timed out after {}ms",
                    timeout.as_millis()
                ));
            },
            Ok(Err(message)) => result.error_message = Some(message),
            Ok(Ok((status, body))) => {
                result.assertion_results = test_case
                    .assertions
                    .iter()
                    .map(|a| evaluate_assertion(a, &body, self.selector.as_ref()))
                    .collect();
                if test_case.assertions.is_empty() {
                    result.error_message = Some("test case has no assertions".to_string());
                } else {
                    result.passed = result.assertion_results.iter().all(|r| r.passed);
                }
                result.status_code = Some(status);
                result.actual_output = Some(body);
            },
        }

        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(test = %result.test_name, passed = result.passed, duration_ms = result.duration_ms, "test finished");
        result
    }

    /// Send the request and parse the body. Errors are display strings.
    async fn call_endpoint(
        &self,
        manifest: &Manifest,
        test_case: &TestCase,
    ) -> Result<(u16, Value), String> {
        let endpoint = manifest
            .endpoint
            .as_ref()
            .ok_or_else(|| "manifest has no endpoint".to_string())?;
        if endpoint.kind != ENDPOINT_KIND_HTTP {
            return Err(format!("unsupported endpoint type '{}'", endpoint.kind));
        }
        let method = HttpMethod::parse(&endpoint.method)
            .ok_or_else(|| format!("unsupported HTTP method '{}'", endpoint.method))?;

        let mut request = self.client.request(method.to_reqwest(), &endpoint.url);
        if let Some(input) = &test_case.input {
            request = request.json(input);
        }
        request = self
            .strategies
            .apply(request, manifest.auth.as_ref(), &self.env);

        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;

        let body = serde_json::from_str(&text)
            .unwrap_or_else(|_| json!({ "statusCode": status, "response": text }));
        Ok((status, body))
    }
}
