//! MCP server implementation for Mallard.
//!
//! This module provides the MCP server that exposes the search tool, the
//! regions resource and the prompt templates, and manages communication via
//! STDIO or SSE transports.

use crate::provider::{DuckDuckGoClient, ProviderConfig, SearchProvider};
use crate::regions::{REGIONS_URI, regions_resource};
use crate::tools::{prompts, search};
use crate::types::{
    MallardResult, SearchRequest, SearchResponse, search_request_schema, search_response_schema,
};
use crate::{SERVER_INSTRUCTIONS, SERVER_NAME, VERSION};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// MCP Protocol version
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Name of the search tool
pub const SEARCH_TOOL: &str = "search";

/// JSON-RPC parse error
pub const PARSE_ERROR: i32 = -32700;

/// JSON-RPC method not found
pub const METHOD_NOT_FOUND: i32 = -32601;

/// JSON-RPC invalid params
pub const INVALID_PARAMS: i32 = -32602;

/// Transport type for the MCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportType {
    /// Standard input/output transport
    #[default]
    Stdio,
    /// Server-Sent Events over HTTP
    #[cfg(feature = "sse")]
    Sse {
        /// Port to listen on
        port: u16,
        /// Host to bind to
        host: [u8; 4],
    },
}

/// Configuration for the Mallard server
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// DuckDuckGo client settings
    pub provider: ProviderConfig,

    /// Region used when a search request names none.
    ///
    /// `None` passes the absence through so DuckDuckGo picks.
    pub default_region: Option<String>,

    /// Whether to enable verbose logging
    pub verbose: bool,
}

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID (None for notifications)
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications carry no id and expect no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.starts_with("notifications/")
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID
    pub id: Option<Value>,
    /// Success result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }
}

/// MCP Tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTool {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: Option<String>,
    /// JSON Schema for input
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    /// JSON Schema for structured output
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

/// MCP Resource definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResource {
    /// Resource URI
    pub uri: String,
    /// Resource name
    pub name: String,
    /// Resource description
    pub description: Option<String>,
    /// Content type
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Tool handler implementation
#[derive(Clone)]
pub struct MallardHandler {
    /// Search backend
    provider: Arc<dyn SearchProvider>,

    /// Region substituted when a request has none
    default_region: Option<String>,

    /// Initialization state
    initialized: Arc<RwLock<bool>>,
}

impl MallardHandler {
    /// Create a handler backed by DuckDuckGo
    pub fn new(config: ServerConfig) -> MallardResult<Self> {
        let client = DuckDuckGoClient::with_config(config.provider)?;
        Ok(Self::with_provider(Arc::new(client), config.default_region))
    }

    /// Create a handler backed by an arbitrary provider
    pub fn with_provider(
        provider: Arc<dyn SearchProvider>,
        default_region: Option<String>,
    ) -> Self {
        Self {
            provider,
            default_region,
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Whether `initialize` has been received
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    /// Get server information for initialization
    pub fn get_server_info(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "resources": {},
                "prompts": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": VERSION
            },
            "instructions": SERVER_INSTRUCTIONS
        })
    }

    /// List available tools
    pub fn list_tools(&self) -> Vec<McpTool> {
        vec![McpTool {
            name: SEARCH_TOOL.to_string(),
            description: Some(
                "Search the web using DuckDuckGo. Returns structured results with title, URL and body snippet for text, images, videos or news."
                    .to_string(),
            ),
            input_schema: search_request_schema(),
            output_schema: Some(search_response_schema()),
        }]
    }

    /// List available resources
    pub fn list_resources(&self) -> Vec<McpResource> {
        vec![McpResource {
            uri: REGIONS_URI.to_string(),
            name: "regions".to_string(),
            description: Some(
                "List supported region codes and human-readable names.".to_string(),
            ),
            mime_type: "application/json".to_string(),
        }]
    }

    /// Execute search tool
    #[instrument(skip(self))]
    pub async fn execute_search(&self, request: SearchRequest) -> MallardResult<SearchResponse> {
        search::search_tool(
            self.provider.as_ref(),
            &request,
            self.default_region.as_deref(),
        )
        .await
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "Handling request");

        match request.method.as_str() {
            "initialize" => {
                let mut initialized = self.initialized.write().await;
                *initialized = true;
                JsonRpcResponse::success(request.id, self.get_server_info())
            },

            "initialized" | "notifications/initialized" => {
                JsonRpcResponse::success(request.id, json!({}))
            },

            "tools/list" => {
                let tools = self.list_tools();
                JsonRpcResponse::success(request.id, json!({ "tools": tools }))
            },

            "tools/call" => {
                let params = match request.params {
                    Some(p) => p,
                    None => {
                        return JsonRpcResponse::error(
                            request.id,
                            INVALID_PARAMS,
                            "Missing parameters".to_string(),
                        );
                    },
                };

                let tool_name = params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

                self.call_tool(request.id, tool_name, arguments).await
            },

            "resources/list" => {
                let resources = self.list_resources();
                JsonRpcResponse::success(request.id, json!({ "resources": resources }))
            },

            "resources/read" => {
                let uri = request
                    .params
                    .as_ref()
                    .and_then(|p| p.get("uri"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                self.read_resource(request.id, uri)
            },

            "prompts/list" => JsonRpcResponse::success(
                request.id,
                json!({ "prompts": prompts::prompt_definitions() }),
            ),

            "prompts/get" => {
                let params = request.params.unwrap_or(json!({}));
                let name = params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
                self.get_prompt(request.id, name, &arguments)
            },

            "ping" => JsonRpcResponse::success(request.id, json!({})),

            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    /// Call a specific tool
    async fn call_tool(&self, id: Option<Value>, name: &str, arguments: Value) -> JsonRpcResponse {
        info!(tool = %name, "Executing tool");

        if name != SEARCH_TOOL {
            return JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown tool: {}", name));
        }

        let request: SearchRequest = match serde_json::from_value(arguments) {
            Ok(r) => r,
            Err(e) => {
                return tool_error(id, format!("Invalid search arguments: {}", e));
            },
        };

        match self.execute_search(request).await {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(structured) => {
                    let text = serde_json::to_string_pretty(&structured).unwrap_or_default();
                    JsonRpcResponse::success(
                        id,
                        json!({
                            "content": [{ "type": "text", "text": text }],
                            "structuredContent": structured,
                            "isError": false
                        }),
                    )
                },
                Err(e) => tool_error(id, format!("Failed to encode results: {}", e)),
            },
            Err(e) => {
                error!(error = %e, "Search failed");
                tool_error(id, format!("Search failed: {}", e))
            },
        }
    }

    /// Read a resource by URI
    fn read_resource(&self, id: Option<Value>, uri: &str) -> JsonRpcResponse {
        if uri != REGIONS_URI {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Unknown resource: {}", uri),
            );
        }

        match serde_json::to_string_pretty(&regions_resource()) {
            Ok(text) => JsonRpcResponse::success(
                id,
                json!({
                    "contents": [{
                        "uri": REGIONS_URI,
                        "mimeType": "application/json",
                        "text": text
                    }]
                }),
            ),
            Err(e) => JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e)),
        }
    }

    /// Render a prompt template
    fn get_prompt(&self, id: Option<Value>, name: &str, arguments: &Value) -> JsonRpcResponse {
        let arg = |key: &str| arguments.get(key).and_then(|v| v.as_str());

        let (description, text) = match name {
            "search_assistant" => {
                let Some(query) = arg("query") else {
                    return missing_argument(id, name, "query");
                };
                (
                    "Search results analysis",
                    prompts::search_assistant(query, arg("context").unwrap_or_default()),
                )
            },
            "research_planner" => {
                let Some(topic) = arg("topic") else {
                    return missing_argument(id, name, "topic");
                };
                (
                    "Research plan",
                    prompts::research_planner(topic, arg("depth").unwrap_or("basic")),
                )
            },
            _ => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Unknown prompt: {}", name),
                );
            },
        };

        JsonRpcResponse::success(
            id,
            json!({
                "description": description,
                "messages": [{
                    "role": "user",
                    "content": { "type": "text", "text": text }
                }]
            }),
        )
    }
}

/// A tool result flagged as failed
fn tool_error(id: Option<Value>, message: String) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "content": [{ "type": "text", "text": message }],
            "isError": true
        }),
    )
}

fn missing_argument(id: Option<Value>, prompt: &str, argument: &str) -> JsonRpcResponse {
    JsonRpcResponse::error(
        id,
        INVALID_PARAMS,
        format!("Prompt '{}' requires the '{}' argument", prompt, argument),
    )
}

/// Main Mallard MCP server
pub struct MallardServer {
    handler: MallardHandler,
}

impl MallardServer {
    /// Create a new Mallard server with the given configuration
    pub fn new(config: ServerConfig) -> MallardResult<Self> {
        if config.verbose {
            debug!(?config, "Creating server");
        }
        Ok(Self {
            handler: MallardHandler::new(config)?,
        })
    }

    /// Create a server around an existing handler
    pub fn with_handler(handler: MallardHandler) -> Self {
        Self { handler }
    }

    /// Create a new server with default configuration
    pub fn with_defaults() -> MallardResult<Self> {
        Self::new(ServerConfig::default())
    }

    /// Run the server with the specified transport
    #[instrument(skip(self))]
    pub async fn run(self, transport: TransportType) -> MallardResult<()> {
        info!(
            server = SERVER_NAME,
            version = VERSION,
            "Starting Mallard MCP server"
        );

        match transport {
            TransportType::Stdio => self.run_stdio().await,
            #[cfg(feature = "sse")]
            TransportType::Sse { port, host } => self.run_sse(host, port).await,
        }
    }

    /// Run the server with STDIO transport
    async fn run_stdio(self) -> MallardResult<()> {
        info!("Starting STDIO transport");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        // One JSON-RPC message per line
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            debug!(request = %line, "Received request");

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "Unparseable request");
                    let response =
                        JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e));
                    write_message(&mut stdout, &response).await?;
                    continue;
                },
            };

            if request.is_notification() {
                debug!(method = %request.method, "Notification received");
                continue;
            }

            let response = self.handler.handle_request(request).await;
            write_message(&mut stdout, &response).await?;
        }

        info!("STDIO server stopped");
        Ok(())
    }

    /// Run the server with SSE transport
    #[cfg(feature = "sse")]
    async fn run_sse(self, host: [u8; 4], port: u16) -> MallardResult<()> {
        use crate::types::MallardError;
        use axum::{
            Json, Router,
            extract::State,
            response::sse::{Event, Sse},
            routing::{get, post},
        };
        use futures::stream::{self, Stream};
        use std::convert::Infallible;
        use tower_http::cors::CorsLayer;
        use tower_http::trace::TraceLayer;

        info!(host = ?host, port = port, "Starting SSE transport");

        let handler = Arc::new(self.handler);

        async fn health() -> &'static str {
            "OK"
        }

        async fn sse_handler() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
            let stream = stream::once(async { Ok(Event::default().data("connected")) });
            Sse::new(stream)
        }

        async fn rpc_handler(
            State(handler): State<Arc<MallardHandler>>,
            Json(request): Json<JsonRpcRequest>,
        ) -> Json<JsonRpcResponse> {
            Json(handler.handle_request(request).await)
        }

        let app = Router::new()
            .route("/health", get(health))
            .route("/sse", get(sse_handler))
            .route("/rpc", post(rpc_handler))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(handler);

        let addr = std::net::SocketAddr::from((host, port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| MallardError::ServerError(format!("Failed to bind to {}: {}", addr, e)))?;

        info!("SSE server listening on http://{}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| MallardError::ServerError(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// Write one newline-terminated JSON-RPC message and flush
async fn write_message<W>(writer: &mut W, response: &JsonRpcResponse) -> MallardResult<()>
where
    W: AsyncWrite + Unpin,
{
    let response_str = serde_json::to_string(response)?;
    debug!(response = %response_str, "Sending response");
    writer.write_all(response_str.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderQuery;
    use crate::types::{MallardError, RawResult};
    use async_trait::async_trait;

    /// Serves the same records for every category
    struct StaticProvider(Vec<RawResult>);

    #[async_trait]
    impl SearchProvider for StaticProvider {
        async fn text(&self, _q: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
            Ok(self.0.clone())
        }
        async fn images(&self, _q: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
            Ok(self.0.clone())
        }
        async fn videos(&self, _q: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
            Ok(self.0.clone())
        }
        async fn news(&self, _q: &ProviderQuery) -> MallardResult<Vec<RawResult>> {
            Err(MallardError::RateLimitExceeded)
        }
    }

    fn handler() -> MallardHandler {
        let record = json!({"title": "Rust", "href": "https://www.rust-lang.org/", "body": "A language"});
        let records = vec![record.as_object().cloned().unwrap()];
        MallardHandler::with_provider(Arc::new(StaticProvider(records)), None)
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert!(!config.verbose);
        assert!(config.default_region.is_none());
    }

    #[test]
    fn test_transport_type_default() {
        assert_eq!(TransportType::default(), TransportType::Stdio);
    }

    #[test]
    fn test_handler_creation() {
        assert!(MallardHandler::new(ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_list_tools() {
        let tools = handler().list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "search");
        assert!(tools[0].output_schema.is_some());
    }

    #[test]
    fn test_json_rpc_response_error() {
        let response = JsonRpcResponse::error(Some(json!(1)), -32600, "Invalid request".to_string());
        assert_eq!(response.jsonrpc, "2.0");
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[test]
    fn test_notification_detection() {
        let mut req = request("notifications/initialized", None);
        assert!(!req.is_notification());
        req.id = None;
        assert!(req.is_notification());
    }

    #[tokio::test]
    async fn test_handle_initialize() {
        let handler = handler();
        assert!(!handler.is_initialized().await);

        let response = handler.handle_request(request("initialize", None)).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["resources"].is_object());
        assert!(result["capabilities"]["prompts"].is_object());
        assert!(handler.is_initialized().await);
    }

    #[tokio::test]
    async fn test_handle_tools_call() {
        let params = json!({
            "name": "search",
            "arguments": { "query": "rust", "max_results": 3 }
        });
        let response = handler().handle_request(request("tools/call", Some(params))).await;
        let result = response.result.unwrap();

        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"]["total_results"], 1);
        assert_eq!(result["structuredContent"]["results"][0]["url"], "https://www.rust-lang.org/");

        let text = result["content"][0]["text"].as_str().unwrap();
        let parsed: SearchResponse = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.query, "rust");
    }

    #[tokio::test]
    async fn test_tools_call_reports_errors_in_result() {
        let handler = handler();

        let params = json!({ "name": "search", "arguments": { "query": "rust", "max_results": 99 } });
        let result = handler
            .handle_request(request("tools/call", Some(params)))
            .await
            .result
            .unwrap();
        assert_eq!(result["isError"], true);

        let params = json!({ "name": "search", "arguments": { "query": "rust", "categories": "news" } });
        let result = handler
            .handle_request(request("tools/call", Some(params)))
            .await
            .result
            .unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("Rate limit"));

        let params = json!({ "name": "search", "arguments": { "max_results": 2 } });
        let result = handler
            .handle_request(request("tools/call", Some(params)))
            .await
            .result
            .unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let params = json!({ "name": "visit_page", "arguments": {} });
        let response = handler().handle_request(request("tools/call", Some(params))).await;
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_resources() {
        let handler = handler();

        let response = handler.handle_request(request("resources/list", None)).await;
        assert_eq!(response.result.unwrap()["resources"][0]["uri"], REGIONS_URI);

        let params = json!({ "uri": REGIONS_URI });
        let response = handler.handle_request(request("resources/read", Some(params))).await;
        let result = response.result.unwrap();
        let text = result["contents"][0]["text"].as_str().unwrap();
        let body: Value = serde_json::from_str(text).unwrap();
        assert_eq!(body["count"], crate::regions::REGION_CODES.len());

        let params = json!({ "uri": "duckduckgo://nope" });
        let response = handler.handle_request(request("resources/read", Some(params))).await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_prompts() {
        let handler = handler();

        let response = handler.handle_request(request("prompts/list", None)).await;
        assert_eq!(response.result.unwrap()["prompts"].as_array().unwrap().len(), 2);

        let params = json!({ "name": "research_planner", "arguments": { "topic": "AI", "depth": "intermediate" } });
        let response = handler.handle_request(request("prompts/get", Some(params))).await;
        let text = response.result.unwrap()["messages"][0]["content"]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.contains("5-8 focused questions"));

        let params = json!({ "name": "search_assistant", "arguments": {} });
        let response = handler.handle_request(request("prompts/get", Some(params))).await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_handle_unknown_method() {
        let response = handler().handle_request(request("unknown/method", None)).await;
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_write_message() {
        let mut buffer = Vec::new();
        let response = JsonRpcResponse::success(Some(json!(7)), json!({}));
        write_message(&mut buffer, &response).await.unwrap();

        let line = String::from_utf8(buffer).unwrap();
        assert!(line.ends_with('\n'));
        let parsed: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed["id"], 7);
    }
}
