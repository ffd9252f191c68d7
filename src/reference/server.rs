//! Line-oriented JSON-RPC loop of the reference backend
//!
//! Every non-blank input line produces exactly one response line. Method dispatch is a
//! closed set; anything outside it is answered with `-32601`.

use std::io::{self, BufRead, Write};

use rust_mcp_sdk::schema::{
    CallToolRequestParams, CallToolResult, ContentBlock, Implementation, InitializeResult,
    ListToolsResult, ProtocolVersion, ServerCapabilities, ServerCapabilitiesTools, TextContent,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::mcp::rpc::{
    json_rpc_error, json_rpc_result, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::reference::tools::Catalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ToolsList,
    ToolsCall,
    Ping,
    Unknown(String),
}

impl Method {
    pub fn parse(name: &str) -> Self {
        match name {
            "initialize" => Self::Initialize,
            "tools/list" => Self::ToolsList,
            "tools/call" => Self::ToolsCall,
            "ping" => Self::Ping,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IncomingRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ReferenceServer {
    name: String,
    catalog: Catalog,
}

impl ReferenceServer {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            catalog: Catalog::for_server(&name),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Answers each request line on `input` until EOF.
    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line);
            serde_json::to_writer(&mut output, &response)?;
            output.write_all(b"\n")?;
            output.flush()?;
        }
        Ok(())
    }

    pub fn handle_line(&self, line: &str) -> Value {
        match serde_json::from_str::<Value>(line) {
            Ok(payload) => self.handle_request(payload),
            Err(err) => json_rpc_error(Some(Value::Null), PARSE_ERROR, &format!("Parse error: {err}")),
        }
    }

    pub fn handle_request(&self, payload: Value) -> Value {
        let fallback_id = payload.get("id").cloned().unwrap_or(Value::Null);
        let request: IncomingRequest = match serde_json::from_value(payload) {
            Ok(request) => request,
            Err(_) => return json_rpc_error(Some(fallback_id), INVALID_REQUEST, "Invalid Request"),
        };
        let id = Some(request.id.unwrap_or(Value::Null));
        let method = Method::parse(&request.method);
        debug!(server = %self.name, method = ?method, "handling request");

        match method {
            Method::Initialize => serialized(id, self.initialize_result()),
            Method::ToolsList => serialized(
                id,
                serde_json::to_value(ListToolsResult {
                    meta: None,
                    next_cursor: None,
                    tools: self.catalog.tools(),
                }),
            ),
            Method::ToolsCall => self.call_tool(id, request.params),
            Method::Ping => json_rpc_result(id, json!({})),
            Method::Unknown(name) => {
                json_rpc_error(id, METHOD_NOT_FOUND, &format!("Unknown method: {name}"))
            }
        }
    }

    fn initialize_result(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(InitializeResult {
            server_info: Implementation {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                description: None,
                icons: vec![],
                website_url: None,
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::V2024_11_05.into(),
            instructions: None,
            meta: None,
        })
    }

    fn call_tool(&self, id: Option<Value>, params: Option<Value>) -> Value {
        let Some(raw_params) = params else {
            return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
        };
        let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
            Ok(value) => value,
            Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
        };

        let output = match self
            .catalog
            .call(&tool_call.name, tool_call.arguments.unwrap_or_default())
        {
            Ok(output) => output,
            Err(err) => {
                return json_rpc_error(id, INVALID_PARAMS, &format!("Invalid params: {err}"))
            }
        };

        let text = match serde_json::to_string_pretty(&output) {
            Ok(text) => text,
            Err(err) => return json_rpc_error(id, INTERNAL_ERROR, &err.to_string()),
        };

        serialized(
            id,
            serde_json::to_value(CallToolResult {
                content: vec![ContentBlock::from(TextContent::new(text, None, None))],
                is_error: None,
                meta: None,
                structured_content: None,
            }),
        )
    }
}

fn serialized(id: Option<Value>, result: Result<Value, serde_json::Error>) -> Value {
    match result {
        Ok(result) => json_rpc_result(id, result),
        Err(err) => json_rpc_error(id, INTERNAL_ERROR, &err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn scholar() -> ReferenceServer {
        ReferenceServer::new("semantic_scholar")
    }

    #[test]
    fn method_names_map_to_closed_set() {
        assert_eq!(Method::parse("initialize"), Method::Initialize);
        assert_eq!(Method::parse("tools/list"), Method::ToolsList);
        assert_eq!(Method::parse("tools/call"), Method::ToolsCall);
        assert_eq!(Method::parse("ping"), Method::Ping);
        assert_eq!(
            Method::parse("resources/list"),
            Method::Unknown("resources/list".to_string())
        );
    }

    #[test]
    fn initialize_reports_server_name() {
        let response =
            scholar().handle_request(json!({"jsonrpc":"2.0","method":"initialize","id":1,"params":{}}));

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "semantic_scholar");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn tools_list_includes_input_schemas() {
        let response = scholar().handle_request(json!({"jsonrpc":"2.0","method":"tools/list","id":2}));

        let tools = response["result"]["tools"].as_array().expect("tools array");
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "search_papers");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["query"]));
        assert_eq!(tools[1]["name"], "get_paper_details");
    }

    #[test]
    fn tools_call_embeds_json_text() {
        let response = scholar().handle_request(json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "id": 3,
            "params": {"name": "search_papers", "arguments": {"query": "transformers", "limit": 2}}
        }));

        assert_eq!(response["result"]["content"][0]["type"], "text");
        let text = response["result"]["content"][0]["text"]
            .as_str()
            .expect("text content");
        let output: Value = serde_json::from_str(text).expect("embedded json");
        assert_eq!(output["total"], 2);
    }

    #[test]
    fn tools_call_without_params_is_invalid() {
        let response = scholar().handle_request(json!({"jsonrpc":"2.0","method":"tools/call","id":4}));

        assert_eq!(response["error"]["code"], -32602);
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let response =
            scholar().handle_request(json!({"jsonrpc":"2.0","method":"unknown_method","id":99}));

        assert_eq!(response["id"], 99);
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Unknown method: unknown_method");
    }

    #[test]
    fn request_without_method_is_invalid() {
        let response = scholar().handle_request(json!({"jsonrpc":"2.0","id":"x"}));

        assert_eq!(response["id"], "x");
        assert_eq!(response["error"]["code"], -32600);
    }

    #[test]
    fn serve_answers_each_line_once() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"method\":\"ping\",\"id\":1}\n",
            "\n",
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"initialize\",\"id\":2}\n",
        );
        let mut output = Vec::new();

        scholar()
            .serve(input.as_bytes(), &mut output)
            .expect("serve loop");

        let lines: Vec<Value> = String::from_utf8(output)
            .expect("utf8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["result"], json!({}));
        assert_eq!(lines[1]["error"]["code"], -32700);
        assert_eq!(lines[1]["id"], Value::Null);
        assert_eq!(lines[2]["id"], 2);
    }
}
