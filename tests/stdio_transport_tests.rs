//! Integration tests for the stdio transport
//!
//! These spawn the `mallard` binary and talk JSON-RPC to it over pipes:
//! - stdout carries nothing but JSON-RPC messages, one per line
//! - logs go to stderr
//! - every MCP method answers with the request's id
//! - notifications get no response

use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULTS_PAGE: &str = r#"
<html><body>
  <div class="result">
    <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&rut=abc">Rust Programming Language</a>
    <a class="result__snippet">A language empowering everyone to build reliable and efficient software.</a>
  </div>
  <div class="result">
    <a class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a>
    <a class="result__snippet">An introductory book about Rust.</a>
  </div>
</body></html>
"#;

/// A running `mallard serve --transport stdio`
struct MallardProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: tokio::io::Lines<BufReader<ChildStdout>>,
    stderr: Option<ChildStderr>,
}

impl MallardProcess {
    async fn spawn() -> Self {
        Self::spawn_with_args(&[]).await
    }

    async fn spawn_with_args(extra_args: &[&str]) -> Self {
        let mut args = vec!["serve", "--transport", "stdio"];
        args.extend(extra_args);

        let mut child = Command::new(env!("CARGO_BIN_EXE_mallard"))
            .args(&args)
            .env_remove("RUST_LOG")
            .env_remove("MALLARD_DEFAULT_REGION")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn mallard process");

        let stdin = child.stdin.take().expect("Failed to get stdin");
        let stdout = child.stdout.take().expect("Failed to get stdout");
        let stderr = child.stderr.take();

        Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            stderr,
        }
    }

    async fn write_line(&mut self, line: &str) {
        self.stdin.write_all(line.as_bytes()).await.unwrap();
        self.stdin.write_all(b"\n").await.unwrap();
        self.stdin.flush().await.unwrap();
    }

    async fn read_line(&mut self) -> String {
        timeout(Duration::from_secs(30), self.stdout.next_line())
            .await
            .expect("Timeout waiting for response")
            .expect("Failed to read response")
            .expect("Server closed stdout")
    }

    async fn send(&mut self, request: Value) -> Value {
        self.write_line(&serde_json::to_string(&request).unwrap())
            .await;
        let line = self.read_line().await;
        serde_json::from_str(&line)
            .unwrap_or_else(|e| panic!("stdout line is not JSON ({}): {}", e, line))
    }

    async fn call(&mut self, id: i64, method: &str, params: Value) -> Value {
        let response = self
            .send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], id, "id not echoed: {:?}", response);
        response
    }

    async fn initialize(&mut self) -> Value {
        let response = self
            .call(
                1,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0.0"}
                }),
            )
            .await;
        self.write_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        response
    }

    /// Close stdin and collect whatever the server logged
    async fn finish(mut self) -> String {
        drop(self.stdin);
        let mut logs = String::new();
        if let Some(stderr) = self.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Ok(Some(line))) =
                timeout(Duration::from_secs(10), lines.next_line()).await
            {
                logs.push_str(&line);
                logs.push('\n');
            }
        }
        let _ = timeout(Duration::from_secs(10), self.child.wait()).await;
        logs
    }
}

mod protocol_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_returns_server_info() {
        let mut process = MallardProcess::spawn().await;

        let response = process.initialize().await;
        let result = &response["result"];
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "DuckDuckGo Search");
        assert!(result["serverInfo"]["version"].is_string());
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["resources"].is_object());
        assert!(result["capabilities"]["prompts"].is_object());
        assert!(
            result["instructions"]
                .as_str()
                .unwrap()
                .contains("DuckDuckGo")
        );

        process.finish().await;
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let mut process = MallardProcess::spawn().await;
        process.initialize().await;

        // If the notification had been answered, this read would see it first
        let response = process.call(7, "ping", json!({})).await;
        assert_eq!(response["result"], json!({}));

        process.finish().await;
    }

    #[tokio::test]
    async fn test_initialized_with_id_is_answered() {
        let mut process = MallardProcess::spawn().await;

        let response = process.call(3, "initialized", json!({})).await;
        assert!(response.get("error").is_none());

        process.finish().await;
    }

    #[tokio::test]
    async fn test_string_ids_are_preserved() {
        let mut process = MallardProcess::spawn().await;

        let response = process
            .send(json!({"jsonrpc": "2.0", "id": "abc-123", "method": "ping"}))
            .await;
        assert_eq!(response["id"], "abc-123");

        process.finish().await;
    }

    #[tokio::test]
    async fn test_tools_list() {
        let mut process = MallardProcess::spawn().await;
        process.initialize().await;

        let response = process.call(2, "tools/list", json!({})).await;
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);

        let tool = &tools[0];
        assert_eq!(tool["name"], "search");
        assert_eq!(tool["inputSchema"]["type"], "object");
        assert_eq!(tool["inputSchema"]["required"], json!(["query"]));
        assert!(tool["inputSchema"]["properties"]["max_results"].is_object());
        assert!(tool["outputSchema"]["properties"]["results"].is_object());

        process.finish().await;
    }

    #[tokio::test]
    async fn test_unknown_method_returns_error() {
        let mut process = MallardProcess::spawn().await;

        let response = process.call(5, "unknown/method", json!({})).await;
        assert_eq!(response["error"]["code"], -32601);
        assert!(
            response["error"]["message"]
                .as_str()
                .unwrap()
                .contains("unknown/method")
        );

        process.finish().await;
    }

    #[tokio::test]
    async fn test_malformed_json_returns_parse_error() {
        let mut process = MallardProcess::spawn().await;

        process.write_line("{this is not json").await;
        let response: Value = serde_json::from_str(&process.read_line().await).unwrap();
        assert_eq!(response["error"]["code"], -32700);
        assert!(response["id"].is_null());

        // The loop keeps serving after a bad line
        let response = process.call(2, "ping", json!({})).await;
        assert!(response.get("error").is_none());

        process.finish().await;
    }

    #[tokio::test]
    async fn test_blank_lines_are_ignored() {
        let mut process = MallardProcess::spawn().await;

        process.write_line("").await;
        process.write_line("   ").await;
        let response = process.call(9, "ping", json!({})).await;
        assert!(response.get("error").is_none());

        process.finish().await;
    }

    #[tokio::test]
    async fn test_missing_params_for_tools_call() {
        let mut process = MallardProcess::spawn().await;

        let response = process
            .send(json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call"}))
            .await;
        assert_eq!(response["error"]["code"], -32602);

        process.finish().await;
    }

    #[tokio::test]
    async fn test_stdout_contains_no_ansi_codes() {
        let mut process = MallardProcess::spawn_with_args(&["--verbose"]).await;

        for (id, method) in [(1, "initialize"), (2, "tools/list"), (3, "resources/list")] {
            process.write_line(
                &json!({"jsonrpc": "2.0", "id": id, "method": method, "params": {}}).to_string(),
            )
            .await;
            let line = process.read_line().await;
            assert!(!line.contains('\x1b'), "ANSI escape on stdout: {}", line);
            serde_json::from_str::<Value>(&line).expect("stdout line must be JSON");
        }

        process.finish().await;
    }
}

mod resource_and_prompt_tests {
    use super::*;

    #[tokio::test]
    async fn test_resources_list_and_read() {
        let mut process = MallardProcess::spawn().await;
        process.initialize().await;

        let response = process.call(2, "resources/list", json!({})).await;
        let resources = response["result"]["resources"].as_array().unwrap();
        assert_eq!(resources[0]["uri"], "duckduckgo://regions");
        assert_eq!(resources[0]["mimeType"], "application/json");

        let response = process
            .call(3, "resources/read", json!({"uri": "duckduckgo://regions"}))
            .await;
        let contents = &response["result"]["contents"][0];
        assert_eq!(contents["uri"], "duckduckgo://regions");

        let regions: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
        assert_eq!(regions["count"], 68);
        assert!(regions["note"].is_string());
        assert!(
            regions["regions"]
                .as_array()
                .unwrap()
                .iter()
                .any(|r| r["code"] == "us-en" && r["name"] == "United States")
        );

        process.finish().await;
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let mut process = MallardProcess::spawn().await;

        let response = process
            .call(2, "resources/read", json!({"uri": "duckduckgo://nothing"}))
            .await;
        assert_eq!(response["error"]["code"], -32602);

        process.finish().await;
    }

    #[tokio::test]
    async fn test_prompts_list_and_get() {
        let mut process = MallardProcess::spawn().await;
        process.initialize().await;

        let response = process.call(2, "prompts/list", json!({})).await;
        let names: Vec<&str> = response["result"]["prompts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["search_assistant", "research_planner"]);

        let response = process
            .call(
                3,
                "prompts/get",
                json!({"name": "research_planner", "arguments": {"topic": "tide pools", "depth": "comprehensive"}}),
            )
            .await;
        let message = &response["result"]["messages"][0];
        assert_eq!(message["role"], "user");
        let text = message["content"]["text"].as_str().unwrap();
        assert!(text.contains("\"tide pools\""));
        assert!(text.contains("8-12 detailed questions"));
        assert!(text.contains("Research Depth: comprehensive"));

        let response = process
            .call(4, "prompts/get", json!({"name": "search_assistant", "arguments": {}}))
            .await;
        assert_eq!(response["error"]["code"], -32602);

        process.finish().await;
    }
}

mod logging_tests {
    use super::*;

    #[tokio::test]
    async fn test_quiet_mode_suppresses_logs() {
        let mut process = MallardProcess::spawn_with_args(&["--quiet"]).await;
        process.initialize().await;

        let logs = process.finish().await;
        assert!(logs.trim().is_empty(), "expected no logs, got: {}", logs);
    }

    #[tokio::test]
    async fn test_logs_go_to_stderr() {
        let mut process = MallardProcess::spawn().await;
        process.initialize().await;

        let logs = process.finish().await;
        assert!(logs.contains("Starting Mallard MCP server"));
    }

    #[tokio::test]
    async fn test_json_logs() {
        let mut process = MallardProcess::spawn_with_args(&["--log-json"]).await;
        process.initialize().await;

        let logs = process.finish().await;
        let first = logs.lines().next().expect("at least one log line");
        let entry: Value = serde_json::from_str(first).expect("log line must be JSON");
        assert!(entry["level"].is_string());
    }
}

mod tool_execution_tests {
    use super::*;

    async fn mock_duckduckgo() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/html/"))
            .and(body_string_contains("q=rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_search_tool_execution() {
        let server = mock_duckduckgo().await;
        let html_url = format!("{}/html/", server.uri());
        let mut process =
            MallardProcess::spawn_with_args(&["--html-url", &html_url, "--api-url", &server.uri()])
                .await;
        process.initialize().await;

        let response = process
            .call(
                2,
                "tools/call",
                json!({"name": "search", "arguments": {"query": "rust", "max_results": 5}}),
            )
            .await;
        let result = &response["result"];
        assert_eq!(result["isError"], false);

        let structured = &result["structuredContent"];
        assert_eq!(structured["query"], "rust");
        assert_eq!(structured["total_results"], 2);
        assert_eq!(structured["results"][0]["url"], "https://www.rust-lang.org/");
        assert_eq!(structured["results"][1]["title"], "The Rust Book");

        let text = result["content"][0]["text"].as_str().unwrap();
        let echoed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(&echoed, structured);

        process.finish().await;
    }

    #[tokio::test]
    async fn test_search_tool_invalid_arguments() {
        let server = mock_duckduckgo().await;
        let html_url = format!("{}/html/", server.uri());
        let mut process = MallardProcess::spawn_with_args(&["--html-url", &html_url]).await;

        let response = process
            .call(
                2,
                "tools/call",
                json!({"name": "search", "arguments": {"query": "rust", "max_results": 0}}),
            )
            .await;
        assert_eq!(response["result"]["isError"], true);
        assert!(
            response["result"]["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("max_results")
        );

        process.finish().await;
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let mut process = MallardProcess::spawn().await;

        let response = process
            .call(2, "tools/call", json!({"name": "visit_page", "arguments": {}}))
            .await;
        assert_eq!(response["error"]["code"], -32601);

        process.finish().await;
    }
}
