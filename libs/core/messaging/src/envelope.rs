//! Wire envelopes for command requests and replies.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::RpcError;

/// Subject a command is published on: the JSON form of its pattern.
///
/// ```
/// assert_eq!(messaging::command_subject("find_one_product"), r#"{"cmd":"find_one_product"}"#);
/// ```
pub fn command_subject(command: &str) -> String {
    json!({ "cmd": command }).to_string()
}

/// Inbound request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// `{"cmd": "..."}` or a bare string pattern
    pub pattern: Value,
    #[serde(default)]
    pub data: Value,
    /// Correlation id echoed back in the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CommandEnvelope {
    pub fn new(command: &str, data: Value) -> Self {
        Self {
            pattern: json!({ "cmd": command }),
            data,
            id: Some(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Command name carried by the pattern, if it has one
    pub fn command(&self) -> Option<&str> {
        match &self.pattern {
            Value::Object(map) => map.get("cmd").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Outbound reply; exactly one of `response` / `err` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<RpcError>,
    #[serde(default)]
    pub is_disposed: bool,
}

impl ReplyEnvelope {
    pub fn success(id: Option<String>, response: Value) -> Self {
        Self {
            id,
            response: Some(response),
            err: None,
            is_disposed: true,
        }
    }

    pub fn failure(id: Option<String>, err: RpcError) -> Self {
        Self {
            id,
            response: None,
            err: Some(err),
            is_disposed: true,
        }
    }

    /// Collapse into the response value or the remote error
    pub fn into_result(self) -> Result<Value, RpcError> {
        match (self.err, self.response) {
            (Some(err), _) => Err(err),
            (None, Some(response)) => Ok(response),
            (None, None) => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_from_object_pattern() {
        let envelope: CommandEnvelope = serde_json::from_value(json!({
            "pattern": { "cmd": "delete_product" },
            "data": { "id": 3 },
            "id": "abc"
        }))
        .unwrap();

        assert_eq!(envelope.command(), Some("delete_product"));
        assert_eq!(envelope.id.as_deref(), Some("abc"));
        assert_eq!(envelope.data["id"], 3);
    }

    #[test]
    fn test_command_from_string_pattern() {
        let envelope: CommandEnvelope =
            serde_json::from_value(json!({ "pattern": "validate_products", "data": [1, 2] }))
                .unwrap();
        assert_eq!(envelope.command(), Some("validate_products"));
        assert!(envelope.id.is_none());
    }

    #[test]
    fn test_command_missing_from_numeric_pattern() {
        let envelope: CommandEnvelope =
            serde_json::from_value(json!({ "pattern": 42 })).unwrap();
        assert_eq!(envelope.command(), None);
        assert!(envelope.data.is_null());
    }

    #[test]
    fn test_reply_wire_format() {
        let ok = serde_json::to_value(ReplyEnvelope::success(Some("1".into()), json!({"id": 1})))
            .unwrap();
        assert_eq!(ok, json!({ "id": "1", "response": { "id": 1 }, "isDisposed": true }));

        let failed = serde_json::to_value(ReplyEnvelope::failure(None, RpcError::not_found("gone")))
            .unwrap();
        assert_eq!(
            failed,
            json!({ "err": { "status": 404, "message": "gone" }, "isDisposed": true })
        );
    }

    #[test]
    fn test_reply_into_result() {
        let err = ReplyEnvelope::failure(None, RpcError::bad_request("nope"))
            .into_result()
            .unwrap_err();
        assert_eq!(err.status, 400);

        let value = ReplyEnvelope::success(None, json!([1])).into_result().unwrap();
        assert_eq!(value, json!([1]));
    }
}
