//! JSON-RPC envelope types and protocol helpers.
//!
//! The server only ever answers — it never originates request ids — so
//! the outgoing surface is [`Response`] and [`Notification`], and the
//! incoming surface is [`Incoming`].

use serde::Serialize;
use serde_json::Value;

/// A decoded incoming frame, classified by its envelope fields.
#[derive(Debug)]
pub(crate) enum Incoming {
    /// Carries an id the client expects an answer for.
    Request {
        id: Value,
        method: String,
        params: Value,
    },
    /// Carries a method but no id; fire-and-forget.
    Notification { method: String, params: Value },
    /// No method field. We never issue requests, so any response-shaped
    /// frame is ignored.
    Response,
}

/// Classify a raw frame. `None` for frames with no recognizable shape.
pub(crate) fn parse_incoming(frame: &Value) -> Option<Incoming> {
    let method = frame
        .get("method")
        .and_then(|m| m.as_str())
        .map(String::from);
    let params = frame.get("params").cloned().unwrap_or(Value::Null);

    match (frame.get("id"), method) {
        (Some(id), Some(method)) => Some(Incoming::Request {
            id: id.clone(),
            method,
            params,
        }),
        (None, Some(method)) => Some(Incoming::Notification { method, params }),
        (Some(_), None) => Some(Incoming::Response),
        (None, None) => None,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub result: Value,
}

impl Response {
    /// A successful response. `Value::Null` is a legitimate result
    /// (e.g. for `shutdown`) and is serialized, not omitted.
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl Notification {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// Convert a document URI to a filesystem path.
///
/// Only the `file://` scheme is handled; anything else passes through
/// unchanged. This is a deliberate simplification, not general URI
/// decoding — the clients this server targets send plain paths.
pub(crate) fn uri_to_path(uri: &str) -> String {
    uri.strip_prefix("file://").unwrap_or(uri).to_string()
}

/// The `initialize` response: server identity plus declared capabilities.
///
/// Sync mode 1 is full-document sync — every didChange carries the
/// complete new text.
pub(crate) fn initialize_result() -> Value {
    serde_json::json!({
        "serverInfo": {
            "name": "slim-lsp",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                "change": 1,
            },
            "completionProvider": {
                "resolveProvider": false,
                "triggerCharacters": [".", "#", "=", "\"", "'"],
            },
            "documentFormattingProvider": true,
        },
    })
}
