//! JSON-RPC 2.0 tool protocol.
//!
//! One tool per enabled resource. `tools/call` results carry the formatted
//! markdown as text content and the normalized result (or error report) as
//! `structuredContent`. Tool failures are ordinary results with `isError`
//! set; JSON-RPC error objects are reserved for protocol failures.

pub mod http;
pub mod stdio;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::ToolsConfig;
use crate::congress::resources::{self, ParamKind, ParamSpec, ResourceDef};
use crate::congress::validate::MAX_LIMIT;
use crate::congress::{format_result, LegislativeService, RequestContext, DEFAULT_LIMIT};

pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const SERVER_NAME: &str = "congress-mcp";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_PING: &str = "ping";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";
pub const NOTIFICATION_CANCELLED: &str = "notifications/cancelled";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    #[must_use]
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Parse one JSON-RPC message, or the error response to send back.
///
/// # Errors
/// A ready-to-send `-32700` response for malformed JSON, or `-32600` for
/// JSON that is not a request object.
pub fn parse_message(text: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| JsonRpcResponse::failure(None, PARSE_ERROR, format!("Parse error: {e}")))?;
    let id = value.get("id").cloned();
    serde_json::from_value(value)
        .map_err(|e| JsonRpcResponse::failure(id, INVALID_REQUEST, format!("Invalid request: {e}")))
}

/// Dispatches JSON-RPC requests to the enabled tools.
#[derive(Clone)]
pub struct ToolServer {
    service: LegislativeService,
    tools: Arc<Vec<&'static ResourceDef>>,
}

impl ToolServer {
    pub fn new(service: LegislativeService, config: &ToolsConfig) -> Self {
        let groups = config.groups();
        let tools = resources::in_groups(&groups).collect();
        Self {
            service,
            tools: Arc::new(tools),
        }
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.iter().map(|def| def.name)
    }

    fn tool(&self, name: &str) -> Option<&'static ResourceDef> {
        self.tools.iter().copied().find(|def| def.name == name)
    }

    /// Parse and handle one raw message.
    pub async fn handle_message(&self, text: &str, ctx: &RequestContext) -> Option<JsonRpcResponse> {
        match parse_message(text) {
            Ok(request) => self.handle(request, ctx).await,
            Err(response) => Some(response),
        }
    }

    /// Handle one request. Notifications produce no response.
    pub async fn handle(&self, req: JsonRpcRequest, ctx: &RequestContext) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %req.method, id = ?req.id, "handling JSON-RPC request");
        if req.is_notification() {
            tracing::debug!(method = %req.method, "notification received");
            return None;
        }

        let response = match req.method.as_str() {
            METHOD_INITIALIZE => self.handle_initialize(req),
            METHOD_PING => JsonRpcResponse::success(req.id, json!({})),
            METHOD_TOOLS_LIST => self.handle_tools_list(req),
            METHOD_TOOLS_CALL => self.handle_tools_call(req, ctx).await,
            _ => {
                tracing::debug!(method = %req.method, "unknown method");
                JsonRpcResponse::failure(req.id, METHOD_NOT_FOUND, "Method not found")
            }
        };
        Some(response)
    }

    fn handle_initialize(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let protocol_version = req
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION)
            .to_string();
        tracing::debug!(%protocol_version, tools = self.tools.len(), "initialize handshake");

        JsonRpcResponse::success(
            req.id,
            json!({
                "protocolVersion": protocol_version,
                "capabilities": {
                    "tools": { "listChanged": false }
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "title": "Congress.gov legislative data",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
    }

    fn handle_tools_list(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|def| {
                json!({
                    "name": def.name,
                    "title": def.title,
                    "description": def.description,
                    "inputSchema": input_schema(def),
                })
            })
            .collect();
        tracing::debug!(tool_count = tools.len(), "tools/list returning definitions");
        JsonRpcResponse::success(req.id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, req: JsonRpcRequest, ctx: &RequestContext) -> JsonRpcResponse {
        let params: CallToolParams = match req.params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::failure(req.id, INVALID_PARAMS, "Missing params")
            }
            Err(e) => {
                return JsonRpcResponse::failure(req.id, INVALID_PARAMS, format!("Invalid params: {e}"))
            }
        };

        let Some(def) = self.tool(&params.name) else {
            return JsonRpcResponse::failure(
                req.id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            );
        };

        let arguments = match params.arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return JsonRpcResponse::failure(
                    req.id,
                    INVALID_PARAMS,
                    "Tool arguments must be an object",
                )
            }
        };

        let result = match self.service.execute(def, &arguments, ctx).await {
            Ok(result) => {
                let text = format_result(def, &result);
                let structured = serde_json::to_value(&result).unwrap_or(Value::Null);
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": structured,
                    "isError": false,
                })
            }
            Err(err) => {
                tracing::info!(tool = def.name, code = err.code(), "tool call failed");
                json!({
                    "content": [{ "type": "text", "text": err.to_markdown() }],
                    "structuredContent": err.to_report(),
                    "isError": true,
                })
            }
        };
        JsonRpcResponse::success(req.id, result)
    }
}

/// JSON Schema for a tool's arguments, derived from its parameter table.
#[must_use]
pub fn input_schema(def: &ResourceDef) -> Value {
    let mut properties = Map::new();
    for param in def.params {
        properties.insert(param.name.to_string(), param_schema(param));
    }
    properties.insert(
        "offset".into(),
        json!({
            "type": "integer",
            "minimum": 0,
            "default": 0,
            "description": "Where to start; pass the offset suggested by the previous page to continue",
        }),
    );
    properties.insert(
        "limit".into(),
        json!({
            "type": "integer",
            "minimum": 1,
            "maximum": MAX_LIMIT,
            "default": DEFAULT_LIMIT,
            "description": "Maximum number of records to return",
        }),
    );
    let required: Vec<&str> = def
        .params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name)
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn param_schema(param: &ParamSpec) -> Value {
    let mut schema = match param.kind {
        ParamKind::Congress | ParamKind::PositiveInteger => {
            json!({ "type": "integer", "minimum": 1 })
        }
        ParamKind::Year { min, max } => {
            let mut schema = json!({ "type": "integer", "minimum": min });
            if let Some(max) = max {
                schema["maximum"] = json!(max);
            }
            schema
        }
        ParamKind::Month => json!({ "type": "integer", "minimum": 1, "maximum": 12 }),
        ParamKind::Day => json!({ "type": "integer", "minimum": 1, "maximum": 31 }),
        ParamKind::Chamber(legal) | ParamKind::Enum(legal) => {
            json!({ "type": "string", "enum": legal })
        }
        ParamKind::Identifier => json!({ "type": "string", "minLength": 1 }),
        ParamKind::Timestamp => json!({ "type": "string", "format": "date-time" }),
    };
    schema["description"] = json!(param.description);
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::congress::mock::MockCongressClient;

    fn server(groups: &[&str]) -> (Arc<MockCongressClient>, ToolServer) {
        let mock = Arc::new(MockCongressClient::new());
        let service = LegislativeService::new(mock.clone(), RequestConfig::default());
        let config = ToolsConfig {
            enabled_groups: groups.iter().map(|g| (*g).to_string()).collect(),
        };
        (mock, ToolServer::new(service, &config))
    }

    async fn call(server: &ToolServer, body: Value) -> Value {
        let response = server
            .handle_message(&body.to_string(), &RequestContext::default())
            .await
            .expect("request gets a response");
        serde_json::to_value(response).expect("response serializes")
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let (_, server) = server(&[]);
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2025-03-26"}}),
        )
        .await;
        assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_follows_enabled_groups() {
        let (_, server) = server(&["votes", "congresses"]);
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .expect("tools array")
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names, vec!["list_house_votes", "get_congress"]);
    }

    #[test]
    fn schema_marks_path_params_required() {
        let def = resources::find("get_bound_congressional_record").expect("resource exists");
        let schema = input_schema(def);
        assert_eq!(schema["required"], json!(["year", "month", "day"]));
        assert_eq!(schema["properties"]["year"]["minimum"], 1873);
        assert_eq!(schema["properties"]["year"]["maximum"], 1997);
        assert_eq!(schema["properties"]["limit"]["maximum"], 250);
        assert_eq!(schema["additionalProperties"], false);
    }

    #[tokio::test]
    async fn tool_errors_are_results_not_protocol_errors() {
        let (mock, server) = server(&[]);
        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": "a",
                "method": "tools/call",
                "params": {"name": "get_bound_congressional_record", "arguments": {"year": 1990, "month": 13, "day": 1}}
            }),
        )
        .await;
        assert!(response.get("error").is_none());
        assert_eq!(response["id"], "a");
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(response["result"]["structuredContent"]["code"], "VALIDATION_ERROR");
        let text = response["result"]["content"][0]["text"].as_str().unwrap_or_default();
        assert!(text.starts_with("## Error: Invalid parameter"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn protocol_failures_use_error_codes() {
        let (_, server) = server(&["bills"]);
        let cases = [
            (json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}), METHOD_NOT_FOUND, "unknown method"),
            (json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {"name": "get_congress"}}), INVALID_PARAMS, "tool in disabled group"),
            (json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {"name": "list_bills", "arguments": [117]}}), INVALID_PARAMS, "array arguments"),
            (json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call"}), INVALID_PARAMS, "missing params"),
            (json!({"jsonrpc": "2.0", "id": 1}), INVALID_REQUEST, "missing method"),
        ];
        for (body, code, desc) in cases {
            let response = call(&server, body).await;
            assert_eq!(response["error"]["code"], code, "case '{desc}'");
        }

        let response = server
            .handle_message("{not json", &RequestContext::default())
            .await
            .expect("parse errors get a response");
        assert_eq!(response.error.map(|e| e.code), Some(PARSE_ERROR));
        assert_eq!(response.id, Value::Null);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let (_, server) = server(&[]);
        let body = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let response = server
            .handle_message(&body.to_string(), &RequestContext::default())
            .await;
        assert!(response.is_none());
    }
}
