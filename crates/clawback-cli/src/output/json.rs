use std::io;

use clawback_client::{ClientError, SuccessEnvelope};
use serde::Serialize;
use serde_json::{Value, json};

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    match success.command.as_str() {
        "import list" => serialize_json_pretty(&render_import_list_json(&success.data)),
        "import" | "policies" | "timeseries" | "distribution" | "overview" => {
            serialize_json_pretty(success)
        }
        _ => Err(io::Error::other(format!(
            "JSON output is not supported for command `{}`",
            success.command
        ))),
    }
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    let mut payload = json!({
        "error": {
            "code": error.code,
            "message": error.message,
            "recovery_steps": error.recovery_steps,
        }
    });
    if let Some(data) = &error.data
        && let Some(object) = payload.get_mut("error").and_then(Value::as_object_mut)
    {
        object.insert("data".to_string(), data.clone());
    }
    serialize_json_pretty(&payload)
}

/// Import history is emitted as a bare array, newest first.
fn render_import_list_json(data: &Value) -> Value {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    Value::Array(rows)
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}
