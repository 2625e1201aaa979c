//! The central protocol engine
//!
//! Validates decoded envelopes, routes methods to the capability registry or to a
//! handler, and converts every handler failure into a JSON-RPC error object.

use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::RequestContext;
use crate::errors::ToolError;
use crate::mcp::registry::Registry;
use crate::mcp::rpc::{
    json_rpc_invalid_request, Request, Response, RpcError, INTERNAL_ERROR, INVALID_PARAMS,
    JSONRPC_VERSION, METHOD_NOT_FOUND,
};

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

pub struct Dispatcher {
    info: ServerInfo,
    registry: Registry,
}

impl Dispatcher {
    pub fn new(info: ServerInfo, registry: Registry) -> Self {
        Self { info, registry }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Routes one request. Never fails: every outcome is a response envelope.
    pub async fn dispatch(&self, request: Request, ctx: &RequestContext) -> Response {
        let audit_params = redact_audit_params(request.params.as_ref());
        let id = request.id.unwrap_or(Value::Null);

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params.as_ref())),
            "tools/list" => Ok(json!({ "tools": self.registry.list_tools() })),
            "resources/list" => Ok(json!({ "resources": self.registry.list_resources() })),
            "tools/call" => self.call_tool(request.params, ctx).await,
            "resources/read" => self.read_resource(request.params, ctx).await,
            method => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            )),
        };

        let audit_outcome = if outcome.is_ok() { "success" } else { "failure" };
        info!(
            method = %request.method,
            params = %audit_params,
            outcome = audit_outcome,
            "mcp action audited"
        );

        match outcome {
            Ok(result) => Response::result(id, result),
            Err(error) => Response::error(id, error),
        }
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let client_name = params
            .and_then(|params| params.pointer("/clientInfo/name"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");
        let offered_version = params
            .and_then(|params| params.get("protocolVersion"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");
        debug!(client_name, offered_version, "initialize");

        json!({
            "protocolVersion": SUPPORTED_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "resources": {},
            },
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version,
            },
        })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        ctx: &RequestContext,
    ) -> Result<Value, RpcError> {
        let params: ToolCallParams = parse_params(params)?;
        let Some(handler) = self.registry.tool_handler(&params.name) else {
            return Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Tool not found: {}", params.name),
            ));
        };

        let handler = Arc::clone(handler);
        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let ctx = ctx.clone();
        let content = run_isolated(async move { handler.call(arguments, &ctx).await })
            .await
            .map_err(|err| {
                warn!(tool = %params.name, error = %err, "tool call failed");
                RpcError::with_data(
                    INTERNAL_ERROR,
                    format!("Tool execution failed: {}", params.name),
                    Value::String(err.to_string()),
                )
            })?;

        Ok(json!({ "content": content }))
    }

    async fn read_resource(
        &self,
        params: Option<Value>,
        ctx: &RequestContext,
    ) -> Result<Value, RpcError> {
        let params: ResourceReadParams = parse_params(params)?;
        let Some(handler) = self.registry.resource_handler(&params.uri) else {
            return Err(RpcError::with_data(
                INVALID_PARAMS,
                format!("Resource not found: {}", params.uri),
                json!({ "uri": params.uri }),
            ));
        };

        let handler = Arc::clone(handler);
        let uri = params.uri.clone();
        let ctx = ctx.clone();
        let contents = run_isolated(async move { handler.read(&uri, &ctx).await })
            .await
            .map_err(|err| {
                warn!(uri = %params.uri, error = %err, "resource read failed");
                RpcError::with_data(
                    INTERNAL_ERROR,
                    format!("Resource read failed: {}", params.uri),
                    Value::String(err.to_string()),
                )
            })?;

        Ok(json!({ "contents": contents }))
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: Option<Value>) -> Result<T, RpcError> {
    let params = params.ok_or_else(|| RpcError::invalid_params("params are required"))?;
    serde_json::from_value(params).map_err(|err| RpcError::invalid_params(err.to_string()))
}

/// Aborts the wrapped task when dropped, so handler work never outlives its caller.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs handler work on its own task so a panic surfaces as a failed call
/// instead of unwinding through the transport. Dropping the returned future
/// (a disconnected HTTP client) cancels the task.
async fn run_isolated<T, F>(work: F) -> Result<T, ToolError>
where
    F: Future<Output = Result<T, ToolError>> + Send + 'static,
    T: Send + 'static,
{
    let mut task = AbortOnDrop(tokio::spawn(work));
    match (&mut task.0).await {
        Ok(result) => result,
        Err(join_error) => Err(ToolError::Aborted(join_error.to_string())),
    }
}

/// Validates a decoded JSON value as a request envelope and dispatches it.
///
/// Returns `None` for notifications, which are processed but never answered.
pub async fn handle_json_rpc_value(
    dispatcher: &Dispatcher,
    payload: Value,
    ctx: &RequestContext,
) -> Option<Response> {
    if !payload.is_object() {
        return Some(json_rpc_invalid_request(None));
    }

    let request_id = payload.get("id").cloned();
    let request: Request = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(_) => return Some(json_rpc_invalid_request(request_id)),
    };

    if request.jsonrpc != JSONRPC_VERSION || request.method.trim().is_empty() {
        return Some(json_rpc_invalid_request(request.id));
    }

    if request.is_notification() {
        let _ = dispatcher.dispatch(request, ctx).await;
        return None;
    }

    Some(dispatcher.dispatch(request, ctx).await)
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}
