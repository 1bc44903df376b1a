//! Mock LifeUp MCP server binary for integration testing
//!
//! Speaks newline-delimited JSON-RPC on stdio and exposes the task tools the
//! smoke scenario calls. Behaviour is steered through environment variables:
//!
//! - `MOCK_FAIL_INIT`: exit instead of answering `initialize`
//! - `MOCK_TOOL_COUNT`: number of tools reported (default 5)
//! - `MOCK_READ_ERROR`: make `list_all_tasks` fail with this text
//! - `MOCK_CREATE_ERROR`: make `create_task` fail with this text
//! - `MOCK_CREATE_TEXT`: success text for `create_task`
//! - `MOCK_DELETE_ERROR`: make `delete_task` fail with this text

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};

const TOOL_NAMES: &[&str] = &[
    "list_all_tasks",
    "create_task",
    "delete_task",
    "complete_task",
    "search_tasks",
    "list_achievements",
    "get_user_info",
];

fn main() {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();

    let state = MockState::from_env();
    eprintln!(
        "mock: LifeUp MCP mock server ready (retries={})",
        std::env::var("LIFEUP_RETRY_COUNT").unwrap_or_default()
    );

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let message: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(_) => continue,
        };

        if state.fail_init && message["method"] == "initialize" {
            eprintln!("mock: refusing to initialize");
            std::process::exit(3);
        }

        if let Some(response) = state.process_message(&message) {
            send_message(&mut writer, &response);
        }
    }
}

fn send_message<W: Write>(writer: &mut W, message: &Value) {
    let body = serde_json::to_string(message).unwrap();
    writer.write_all(body.as_bytes()).ok();
    writer.write_all(b"\n").ok();
    writer.flush().ok();
}

struct MockState {
    fail_init: bool,
    tool_count: usize,
    read_error: Option<String>,
    create_error: Option<String>,
    create_text: String,
    delete_error: Option<String>,
}

impl MockState {
    fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            fail_init: var("MOCK_FAIL_INIT").is_some(),
            tool_count: var("MOCK_TOOL_COUNT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            read_error: var("MOCK_READ_ERROR"),
            create_error: var("MOCK_CREATE_ERROR"),
            create_text: var("MOCK_CREATE_TEXT")
                .unwrap_or_else(|| "Created task, ID: 7".to_string()),
            delete_error: var("MOCK_DELETE_ERROR"),
        }
    }

    fn process_message(&self, message: &Value) -> Option<Value> {
        let method = message["method"].as_str()?;
        // Notifications carry no id and get no reply
        let id = message.get("id")?.clone();

        let result = match method {
            "initialize" => json!({
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "lifeup-mcp-mock", "version": "0.0.1" }
            }),
            "ping" => json!({}),
            "tools/list" => json!({ "tools": self.tools() }),
            "tools/call" => self.call_tool(&message["params"]),
            _ => {
                return Some(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32601, "message": format!("Method not found: {}", method) }
                }));
            }
        };

        Some(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }

    fn tools(&self) -> Vec<Value> {
        TOOL_NAMES
            .iter()
            .cycle()
            .take(self.tool_count)
            .enumerate()
            .map(|(i, name)| {
                // Names must stay unique past the end of the list
                let name = if i < TOOL_NAMES.len() {
                    name.to_string()
                } else {
                    format!("{}_{}", name, i)
                };
                json!({
                    "name": name,
                    "description": format!("Mock {}", name),
                    "inputSchema": { "type": "object" }
                })
            })
            .collect()
    }

    fn call_tool(&self, params: &Value) -> Value {
        let name = params["name"].as_str().unwrap_or_default();
        let arguments = &params["arguments"];

        match name {
            "list_all_tasks" => match &self.read_error {
                Some(err) => tool_error(err),
                None => tool_text("Tasks:\n- [3] Morning run (10 coins)\n- [5] Read a book (5 coins)"),
            },
            "create_task" => match &self.create_error {
                Some(err) => tool_error(err),
                None if arguments["name"].as_str().is_none() => tool_error("Missing task name"),
                None => tool_text(&self.create_text),
            },
            "delete_task" => {
                eprintln!("mock: delete_task id={}", arguments["id"]);
                match &self.delete_error {
                    Some(err) => tool_error(err),
                    None => tool_text(&format!("Task {} deleted", arguments["id"])),
                }
            }
            other => tool_error(&format!("Unknown tool: {}", other)),
        }
    }
}

fn tool_text(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

fn tool_error(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }], "isError": true })
}
