//! Common test utilities for integration tests.
//!
//! Provides `LspClient`, which drives the `uvls` binary over stdio.

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, Command, Stdio};

/// LSP test client for communicating with the server binary.
pub(crate) struct LspClient {
    process: Child,
    /// Notifications received so far, as `(method, params)`
    notifications: Vec<(String, Value)>,
    /// Params of `workspace/applyEdit` requests received so far
    pub(crate) applied_edits: Vec<Value>,
    reader: BufReader<std::process::ChildStdout>,
}

impl LspClient {
    /// Spawn the uvls binary.
    pub(crate) fn spawn() -> Self {
        let mut process = Command::new(env!("CARGO_BIN_EXE_uvls"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn uvls binary");

        let stdout = process.stdout.take().expect("Failed to capture stdout");

        Self {
            process,
            notifications: Vec::new(),
            applied_edits: Vec::new(),
            reader: BufReader::new(stdout),
        }
    }

    /// Send a JSON-RPC message to the server.
    pub(crate) fn send(&mut self, message: &Value) {
        let body = serde_json::to_string(message).unwrap();
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        let stdin = self.process.stdin.as_mut().expect("stdin not captured");
        stdin.write_all(header.as_bytes()).unwrap();
        stdin.write_all(body.as_bytes()).unwrap();
        stdin.flush().unwrap();
    }

    fn read_message(&mut self) -> Value {
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .expect("Failed to read header");
            assert!(bytes_read != 0, "Server closed connection unexpectedly");

            if line == "\r\n" || line == "\n" {
                break;
            }

            if line.to_lowercase().starts_with("content-length:") {
                content_length = line
                    .split(':')
                    .nth(1)
                    .unwrap()
                    .trim()
                    .parse()
                    .expect("Invalid content length");
            }
        }

        let mut body = vec![0u8; content_length];
        self.reader
            .read_exact(&mut body)
            .expect("Failed to read body");

        serde_json::from_slice(&body).unwrap_or_else(|e| {
            panic!("Invalid JSON: {e} in: {:?}", String::from_utf8_lossy(&body))
        })
    }

    /// Read messages until the response with `expected_id` arrives.
    ///
    /// Notifications are recorded. Requests from the server are answered:
    /// `workspace/applyEdit` is accepted and recorded, anything else (such as
    /// `client/registerCapability`) gets a null result.
    pub(crate) fn read_response(&mut self, expected_id: i64) -> Value {
        loop {
            let message = self.read_message();

            match (message.get("id"), message.get("method")) {
                (None, Some(method)) => {
                    let method = method.as_str().unwrap_or_default().to_string();
                    let params = message.get("params").cloned().unwrap_or(Value::Null);
                    self.notifications.push((method, params));
                }
                (Some(id), Some(method)) => {
                    let result = if method == "workspace/applyEdit" {
                        self.applied_edits
                            .push(message.get("params").cloned().unwrap_or(Value::Null));
                        json!({ "applied": true })
                    } else {
                        Value::Null
                    };
                    let reply = json!({ "jsonrpc": "2.0", "id": id, "result": result });
                    self.send(&reply);
                }
                (Some(id), None) if *id == json!(expected_id) => return message,
                _ => {}
            }
        }
    }

    /// Params of the last recorded notification with `method` for `uri`.
    pub(crate) fn last_notification_for(&self, method: &str, uri: &str) -> Option<Value> {
        self.notifications
            .iter()
            .rev()
            .find(|(m, params)| m == method && params["uri"] == uri)
            .map(|(_, params)| params.clone())
    }

    /// Initialize the LSP session.
    pub(crate) fn initialize(&mut self, options: Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "processId": null,
                "capabilities": {
                    "workspace": {
                        "didChangeWatchedFiles": { "dynamicRegistration": true },
                        "applyEdit": true
                    },
                    "textDocument": {
                        "documentLink": {},
                        "publishDiagnostics": {}
                    }
                },
                "initializationOptions": options,
                "rootUri": "file:///tmp",
                "workspaceFolders": null
            }
        }));

        let response = self.read_response(1);

        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        }));

        response
    }

    /// Open a text document.
    pub(crate) fn did_open(&mut self, uri: &str, text: &str) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {
                "textDocument": {
                    "uri": uri,
                    "languageId": "toml",
                    "version": 1,
                    "text": text
                }
            }
        }));
    }

    /// Request document links.
    pub(crate) fn document_links(&mut self, id: i64, uri: &str) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/documentLink",
            "params": {
                "textDocument": { "uri": uri }
            }
        }));
        self.read_response(id)
    }

    /// Pull diagnostics for a document.
    pub(crate) fn pull_diagnostics(&mut self, id: i64, uri: &str) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/diagnostic",
            "params": {
                "textDocument": { "uri": uri }
            }
        }));
        self.read_response(id)
    }

    /// Run `workspace/executeCommand` with a single argument object.
    pub(crate) fn execute_command(&mut self, id: i64, command: &str, argument: Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "workspace/executeCommand",
            "params": {
                "command": command,
                "arguments": [argument]
            }
        }));
        self.read_response(id)
    }

    /// Shutdown the server.
    pub(crate) fn shutdown(&mut self) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 999,
            "method": "shutdown"
        }));
        self.read_response(999)
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        let _ = self.process.kill();
    }
}
