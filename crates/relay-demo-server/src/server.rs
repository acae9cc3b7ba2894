//! The demo server's catalog and request dispatch.
//!
//! Tools: `add`, `echo`. Resource template: `greeting://{name}`.
//! Prompt: `echo`.

use crate::protocol::{IncomingMessage, OutgoingResponse, RpcError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub const SERVER_NAME: &str = "Demo";
pub const SERVER_VERSION: &str = "1.0.0";
const PROTOCOL_VERSION: &str = "2024-11-05";
const GREETING_SCHEME: &str = "greeting://";

#[derive(Deserialize)]
struct AddArgs {
    a: f64,
    b: f64,
}

#[derive(Deserialize)]
struct EchoArgs {
    message: String,
}

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Deserialize)]
struct ReadParams {
    uri: String,
}

#[derive(Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Handle one incoming message. Notifications never produce a response.
pub fn handle_message(msg: IncomingMessage) -> Option<OutgoingResponse> {
    let Some(id) = msg.id else {
        tracing::debug!("notification {}", msg.method);
        return None;
    };

    tracing::debug!("request {} (id {id})", msg.method);
    let params = msg.params.unwrap_or(Value::Null);
    Some(match dispatch(&msg.method, params) {
        Ok(result) => OutgoingResponse::success(id, result),
        Err(e) => {
            tracing::warn!("{} failed: {e}", msg.method);
            OutgoingResponse::failure(id, &e)
        }
    })
}

/// Handle one raw input line.
pub fn handle_line(line: &str) -> Option<OutgoingResponse> {
    match serde_json::from_str::<IncomingMessage>(line) {
        Ok(msg) => handle_message(msg),
        Err(e) => Some(OutgoingResponse::failure(
            Value::Null,
            &RpcError::Parse(e.to_string()),
        )),
    }
}

fn dispatch(method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(initialize()),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tool_catalog() })),
        "tools/call" => call_tool(parse(params)?),
        "resources/list" => Ok(json!({ "resources": [] })),
        "resources/templates/list" => Ok(json!({
            "resourceTemplates": [{
                "uriTemplate": "greeting://{name}",
                "name": "greeting"
            }]
        })),
        "resources/read" => read_resource(parse(params)?),
        "prompts/list" => Ok(json!({
            "prompts": [{
                "name": "echo",
                "arguments": [{ "name": "message", "required": true }]
            }]
        })),
        "prompts/get" => get_prompt(parse(params)?),
        other => Err(RpcError::MethodNotFound(other.to_string())),
    }
}

fn parse<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

fn initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {}, "resources": {}, "prompts": {} },
        "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION }
    })
}

fn tool_catalog() -> Value {
    json!([
        {
            "name": "add",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "a": { "type": "number" },
                    "b": { "type": "number" }
                },
                "required": ["a", "b"],
                "additionalProperties": false
            }
        },
        {
            "name": "echo",
            "inputSchema": {
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"],
                "additionalProperties": false
            }
        }
    ])
}

fn text_result(text: String) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

fn call_tool(params: CallParams) -> Result<Value, RpcError> {
    match params.name.as_str() {
        "add" => {
            let AddArgs { a, b } = parse(params.arguments)?;
            Ok(text_result((a + b).to_string()))
        }
        "echo" => {
            let EchoArgs { message } = parse(params.arguments)?;
            Ok(text_result(format!("Tool echo: {message}")))
        }
        other => Err(RpcError::InvalidParams(format!("Tool {other} not found"))),
    }
}

fn read_resource(params: ReadParams) -> Result<Value, RpcError> {
    let name = params
        .uri
        .strip_prefix(GREETING_SCHEME)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| RpcError::InvalidParams(format!("Resource {} not found", params.uri)))?;
    Ok(json!({
        "contents": [{ "uri": params.uri, "text": format!("Hello, {name}!") }]
    }))
}

fn get_prompt(params: GetPromptParams) -> Result<Value, RpcError> {
    if params.name != "echo" {
        return Err(RpcError::InvalidParams(format!(
            "Prompt {} not found",
            params.name
        )));
    }
    let EchoArgs { message } = parse(params.arguments)?;
    Ok(json!({
        "messages": [{
            "role": "user",
            "content": {
                "type": "text",
                "text": format!("Please process this message: {message}")
            }
        }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, params: Value) -> Value {
        let msg = IncomingMessage {
            id: Some(Value::from(1)),
            method: method.to_string(),
            params: Some(params),
        };
        serde_json::to_value(handle_message(msg).unwrap()).unwrap()
    }

    #[test]
    fn initialize_reports_server_info() {
        let resp = request("initialize", json!({"protocolVersion": "2024-11-05"}));
        assert_eq!(resp["result"]["serverInfo"]["name"], "Demo");
        assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");

        let resp = request("initialize", json!({"protocolVersion": "2099-01-01"}));
        assert_eq!(resp["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(resp["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn notifications_get_no_response() {
        let msg = IncomingMessage {
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(handle_message(msg).is_none());
    }

    #[test]
    fn tools_list_advertises_add_and_echo() {
        let resp = request("tools/list", Value::Null);
        let names: Vec<&str> = resp["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["add", "echo"]);
    }

    #[test]
    fn add_sums_numbers() {
        let resp = request("tools/call", json!({"name": "add", "arguments": {"a": 2, "b": 3}}));
        assert_eq!(resp["result"]["content"][0]["text"], "5");

        let resp = request(
            "tools/call",
            json!({"name": "add", "arguments": {"a": 1.5, "b": 1}}),
        );
        assert_eq!(resp["result"]["content"][0]["text"], "2.5");
    }

    #[test]
    fn add_rejects_missing_argument() {
        let resp = request("tools/call", json!({"name": "add", "arguments": {"a": 2}}));
        assert_eq!(resp["error"]["code"], -32602);
    }

    #[test]
    fn echo_prefixes_message() {
        let resp = request(
            "tools/call",
            json!({"name": "echo", "arguments": {"message": "hi"}}),
        );
        assert_eq!(resp["result"]["content"][0]["text"], "Tool echo: hi");
    }

    #[test]
    fn unknown_tool_is_invalid_params() {
        let resp = request("tools/call", json!({"name": "nope", "arguments": {}}));
        assert_eq!(resp["error"]["code"], -32602);
    }

    #[test]
    fn greeting_resource() {
        let resp = request("resources/read", json!({"uri": "greeting://Ada"}));
        assert_eq!(resp["result"]["contents"][0]["text"], "Hello, Ada!");
        assert_eq!(resp["result"]["contents"][0]["uri"], "greeting://Ada");

        let resp = request("resources/read", json!({"uri": "farewell://Ada"}));
        assert_eq!(resp["error"]["code"], -32602);
    }

    #[test]
    fn echo_prompt() {
        let resp = request(
            "prompts/get",
            json!({"name": "echo", "arguments": {"message": "ship it"}}),
        );
        let message = &resp["result"]["messages"][0];
        assert_eq!(message["role"], "user");
        assert_eq!(
            message["content"]["text"],
            "Please process this message: ship it"
        );
    }

    #[test]
    fn unknown_method() {
        let resp = request("sampling/createMessage", json!({}));
        assert_eq!(resp["error"]["code"], -32601);
    }

    #[test]
    fn garbage_line_is_parse_error() {
        let resp = serde_json::to_value(handle_line("{not json").unwrap()).unwrap();
        assert_eq!(resp["error"]["code"], -32700);
        assert!(resp["id"].is_null());
    }
}
