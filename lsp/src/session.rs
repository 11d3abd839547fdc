//! The dispatch loop: session state plus method routing.
//!
//! One [`Session`] owns everything mutable — settings, open documents,
//! the workspace root, and the collaborator handles. The loop is
//! strictly sequential: a frame is fully decoded, dispatched, and
//! answered before the next header read begins, so no locking
//! discipline is needed anywhere.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::codec::{MessageReader, MessageWriter};
use crate::completion;
use crate::config::Settings;
use crate::diagnostics;
use crate::documents::DocumentStore;
use crate::engine::SyntaxEngine;
use crate::format::Formatter;
use crate::lint::LintRunner;
use crate::protocol::{self, Incoming, Notification, Response};

pub struct Session {
    engine: Box<dyn SyntaxEngine>,
    settings: Settings,
    documents: DocumentStore,
    workspace_root: PathBuf,
    formatter: Formatter,
    linter: LintRunner,
}

impl Session {
    /// A session rooted at the current working directory; `initialize`
    /// replaces the root once the client reveals it.
    #[must_use]
    pub fn new(engine: Box<dyn SyntaxEngine>) -> Self {
        let workspace_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_root(engine, workspace_root)
    }

    #[must_use]
    pub fn with_root(engine: Box<dyn SyntaxEngine>, workspace_root: PathBuf) -> Self {
        Self {
            engine,
            settings: Settings::default(),
            documents: DocumentStore::new(),
            formatter: Formatter::new(workspace_root.clone()),
            linter: LintRunner::new(workspace_root.clone()),
            workspace_root,
        }
    }

    /// Serve until the transport runs dry or desynchronizes.
    ///
    /// `exit` terminates the process directly and never returns here.
    pub async fn run<R, W>(&mut self, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = MessageReader::new(input);
        let mut writer = MessageWriter::new(output);

        loop {
            let frame = match reader.read_message().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("transport desynchronized: {e:#}");
                    break;
                }
            };

            match protocol::parse_incoming(&frame) {
                Some(Incoming::Request { id, method, params }) => {
                    self.handle(&mut writer, Some(id), &method, &params).await?;
                }
                Some(Incoming::Notification { method, params }) => {
                    self.handle(&mut writer, None, &method, &params).await?;
                }
                // We never issue requests, so response-shaped frames
                // have nothing to match and are dropped.
                Some(Incoming::Response) | None => {
                    tracing::trace!("ignoring response-shaped or malformed frame");
                }
            }
        }

        Ok(())
    }

    async fn handle<W: AsyncWrite + Unpin>(
        &mut self,
        writer: &mut MessageWriter<W>,
        id: Option<Value>,
        method: &str,
        params: &Value,
    ) -> Result<()> {
        match method {
            "initialize" => {
                let result = self.initialize(params);
                if let Some(id) = id {
                    Self::respond(writer, id, result).await?;
                }
            }
            "initialized" => {}
            "shutdown" => {
                // Answer null and keep serving; only `exit` stops us.
                if let Some(id) = id {
                    Self::respond(writer, id, Value::Null).await?;
                }
            }
            "exit" => {
                tracing::debug!("exit received; terminating");
                std::process::exit(0);
            }
            "textDocument/didOpen" => {
                let uri = params["textDocument"]["uri"].as_str().map(String::from);
                let text = params["textDocument"]["text"].as_str().map(String::from);
                if let (Some(uri), Some(text)) = (uri, text) {
                    self.documents.upsert(&uri, text.clone());
                    self.publish_diagnostics(writer, &uri, &text).await?;
                }
            }
            "textDocument/didChange" => {
                let uri = params["textDocument"]["uri"].as_str().map(String::from);
                // Full-sync model: the last change entry carries the
                // complete new text; earlier entries are ignored.
                let text = params["contentChanges"]
                    .as_array()
                    .and_then(|changes| changes.last())
                    .and_then(|change| change["text"].as_str())
                    .map(String::from);
                if let (Some(uri), Some(text)) = (uri, text) {
                    self.documents.upsert(&uri, text.clone());
                    self.publish_diagnostics(writer, &uri, &text).await?;
                }
            }
            "textDocument/didClose" => {
                if let Some(uri) = params["textDocument"]["uri"].as_str() {
                    self.documents.remove(uri);
                    // Clears the client's markers for this document.
                    Self::notify(
                        writer,
                        "textDocument/publishDiagnostics",
                        json!({ "uri": uri, "diagnostics": [] }),
                    )
                    .await?;
                }
            }
            "textDocument/formatting" => {
                let result = self.formatting_result(params).await;
                if let Some(id) = id {
                    Self::respond(writer, id, result).await?;
                }
            }
            "textDocument/completion" => {
                let result = self.completion_result();
                if let Some(id) = id {
                    Self::respond(writer, id, result).await?;
                }
            }
            "workspace/didChangeConfiguration" => {
                self.settings.merge(&params["settings"]);
            }
            other => {
                tracing::trace!("ignoring unsupported method: {other}");
            }
        }
        Ok(())
    }

    fn initialize(&mut self, params: &Value) -> Value {
        let root = params["rootUri"]
            .as_str()
            .or_else(|| params["rootPath"].as_str());
        if let Some(root) = root {
            self.workspace_root = PathBuf::from(protocol::uri_to_path(root));
        }

        // Collaborators are rebuilt against the resolved root, which
        // also resets their one-time degradation warnings.
        self.formatter = Formatter::new(self.workspace_root.clone());
        self.linter = LintRunner::new(self.workspace_root.clone());

        self.settings.merge(&params["initializationOptions"]);

        protocol::initialize_result()
    }

    async fn publish_diagnostics<W: AsyncWrite + Unpin>(
        &mut self,
        writer: &mut MessageWriter<W>,
        uri: &str,
        text: &str,
    ) -> Result<()> {
        let diagnostics = diagnostics::collect(
            self.engine.as_mut(),
            &mut self.linter,
            &self.settings,
            uri,
            text,
        )
        .await;
        Self::notify(
            writer,
            "textDocument/publishDiagnostics",
            json!({ "uri": uri, "diagnostics": diagnostics }),
        )
        .await
    }

    /// Result for `textDocument/formatting`: a single full-document
    /// replace edit, or an empty list when there is nothing to change
    /// (unknown document, missing uri, or text already formatted).
    async fn formatting_result(&mut self, params: &Value) -> Value {
        let Some(uri) = params["textDocument"]["uri"].as_str() else {
            return json!([]);
        };
        let Some(text) = self.documents.get(uri) else {
            return json!([]);
        };

        let settings = self.settings.formatting();
        let formatted = self.formatter.format(&settings, text).await;
        if formatted == text {
            return json!([]);
        }

        let end_line = text.split('\n').count();
        json!([{
            "range": {
                "start": { "line": 0, "character": 0 },
                "end": { "line": end_line, "character": 0 },
            },
            "newText": formatted,
        }])
    }

    fn completion_result(&self) -> Value {
        if !self.settings.completion_enabled() {
            return json!({ "isIncomplete": false, "items": [] });
        }
        json!({ "isIncomplete": false, "items": completion::items() })
    }

    async fn respond<W: AsyncWrite + Unpin>(
        writer: &mut MessageWriter<W>,
        id: Value,
        result: Value,
    ) -> Result<()> {
        let frame = serde_json::to_value(Response::ok(id, result))?;
        writer.write_message(&frame).await
    }

    async fn notify<W: AsyncWrite + Unpin>(
        writer: &mut MessageWriter<W>,
        method: &'static str,
        params: Value,
    ) -> Result<()> {
        let frame = serde_json::to_value(Notification::new(method, params))?;
        writer.write_message(&frame).await
    }
}
