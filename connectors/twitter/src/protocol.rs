//! JSON-RPC 2.0 framing for the MCP stdio transport.

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::error::TwitterError;
use crate::server::TwitterMcpServer;

/// MCP protocol revision implemented by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Request-level failures, reported as JSON-RPC error objects.
///
/// Tool failures are not protocol errors; they come back as tool results
/// with `isError` set.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// JSON-RPC error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => -32700,
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Internal(_) => -32603,
        }
    }

    /// JSON-RPC `error` member.
    #[must_use]
    pub fn to_response(&self) -> Value {
        json!({
            "code": self.code(),
            "message": self.to_string()
        })
    }
}

impl From<TwitterError> for ProtocolError {
    fn from(err: TwitterError) -> Self {
        match err {
            TwitterError::InvalidArgument { .. } | TwitterError::InvalidReference { .. } => {
                Self::InvalidParams(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Handle one line of input.
///
/// Returns `None` for notifications, which get no reply.
#[instrument(skip_all)]
pub async fn handle_message(server: &TwitterMcpServer, message: &str) -> Option<Value> {
    let request: Value = match serde_json::from_str(message) {
        Ok(v) => v,
        Err(e) => {
            return Some(error_response(
                Value::Null,
                &ProtocolError::Parse(format!("Invalid JSON: {e}")),
            ));
        }
    };

    let id = request.get("id").cloned();
    let Some(method) = request.get("method").and_then(Value::as_str) else {
        return id.map(|id| {
            error_response(
                id,
                &ProtocolError::InvalidRequest("Missing 'method' field".into()),
            )
        });
    };
    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

    debug!(method, "Handling request");

    let result = match method {
        "initialize" => Ok(server.handle_initialize(&params)),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(server.handle_list_tools()),
        "tools/call" => server.handle_call_tool(&params).await,
        "resources/list" => Ok(server.handle_list_resources()),
        "resources/read" => server.handle_read_resource(&params).await,
        _ if method.starts_with("notifications/") => Ok(Value::Null),
        _ => Err(ProtocolError::MethodNotFound(method.to_string())),
    };

    let id = id?;
    Some(match result {
        Ok(value) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": value
        }),
        Err(e) => error_response(id, &e),
    })
}

fn error_response(id: Value, error: &ProtocolError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error.to_response()
    })
}
