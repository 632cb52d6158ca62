//! Single-shot JSON command dispatch: read the whole of stdin as one
//! `{command, args}` request, look up `command` in a handler table, run it,
//! and write exactly one `{success, ...}` / `{success:false, error}` line to
//! stdout, then exit. No persistent loop, one process invocation handles
//! one command.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use serde_json::Value;

/// A command handler: takes the request's `args` object, returns either
/// the response payload to merge into `{success:true, ...}` or an error
/// message.
pub type Handler = Box<dyn Fn(&Value) -> Result<Value, String>>;

#[derive(serde::Deserialize)]
struct Request {
    command: String,
    #[serde(default)]
    args: Value,
}

/// A named table of command handlers, dispatched by exact `command` match.
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(mut self, command: &str, handler: Handler) -> Self {
        self.handlers.insert(command.to_string(), handler);
        self
    }

    /// Read a request from `input`, dispatch it, and write the response to
    /// `output`. Never panics on malformed input or an unknown command ,
    /// those become `{success:false, error}` responses like any other
    /// handler failure.
    pub fn run(&self, input: &mut impl Read, output: &mut impl Write) -> io::Result<()> {
        let mut buf = String::new();
        input.read_to_string(&mut buf)?;

        let response = self.handle(&buf);
        let line = serde_json::to_string(&response)
            .unwrap_or_else(|_| r#"{"success":false,"error":"failed to serialize response"}"#.to_string());
        writeln!(output, "{line}")?;
        output.flush()
    }

    fn handle(&self, raw: &str) -> Value {
        let request: Request = match serde_json::from_str(raw) {
            Ok(req) => req,
            Err(e) => return error_response(format!("invalid request: {e}")),
        };

        let Some(handler) = self.handlers.get(&request.command) else {
            return error_response(format!("unknown command: {}", request.command));
        };

        match handler(&request.args) {
            Ok(mut payload) => {
                if let Value::Object(map) = &mut payload {
                    map.insert("success".to_string(), Value::Bool(true));
                    payload
                } else {
                    serde_json::json!({ "success": true, "result": payload })
                }
            }
            Err(e) => error_response(e),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn error_response(message: String) -> Value {
    serde_json::json!({ "success": false, "error": message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_is_reported_not_panicked() {
        let dispatcher = Dispatcher::new();
        let mut input = std::io::Cursor::new(r#"{"command":"nope","args":{}}"#);
        let mut output = Vec::new();
        dispatcher.run(&mut input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["success"], false);
    }

    #[test]
    fn malformed_json_is_reported_not_panicked() {
        let dispatcher = Dispatcher::new();
        let mut input = std::io::Cursor::new("not json");
        let mut output = Vec::new();
        dispatcher.run(&mut input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["success"], false);
    }

    #[test]
    fn registered_handler_success_sets_success_true() {
        let dispatcher = Dispatcher::new()
            .register("ping", Box::new(|_args| Ok(serde_json::json!({ "pong": true }))));
        let mut input = std::io::Cursor::new(r#"{"command":"ping","args":{}}"#);
        let mut output = Vec::new();
        dispatcher.run(&mut input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["success"], true);
        assert_eq!(response["pong"], true);
    }
}
