//! Message envelopes shared by the socket and broker transports.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::validation::RpcException;

/// Inbound message. Carries an `id` when the sender expects a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRequest {
    pub pattern: Value,

    #[serde(default)]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl IncomingRequest {
    /// A request expecting a reply, with a fresh id.
    pub fn request(pattern: impl Into<String>, data: Value) -> Self {
        Self {
            pattern: Value::String(pattern.into()),
            data,
            id: Some(Uuid::new_v4().to_string()),
        }
    }

    /// A fire-and-forget event.
    pub fn event(pattern: impl Into<String>, data: Value) -> Self {
        Self {
            pattern: Value::String(pattern.into()),
            data,
            id: None,
        }
    }

    /// Routing key: strings as-is, anything else as compact JSON.
    pub fn pattern_key(&self) -> String {
        match &self.pattern {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_event(&self) -> bool {
        self.id.is_none()
    }
}

/// Reply to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingResponse {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<Value>,

    #[serde(default)]
    pub is_disposed: bool,
}

impl OutgoingResponse {
    pub fn success(id: String, response: Value) -> Self {
        Self {
            id,
            response: Some(response),
            err: None,
            is_disposed: true,
        }
    }

    pub fn failure(id: String, err: &RpcException) -> Self {
        Self {
            id,
            response: None,
            err: Some(err.to_value()),
            is_disposed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_has_no_id() {
        let event = IncomingRequest::event("notification.sent", json!({}));
        assert!(event.is_event());
        assert!(serde_json::to_value(&event).unwrap().get("id").is_none());
    }

    #[test]
    fn test_object_pattern_key() {
        let request: IncomingRequest =
            serde_json::from_value(json!({ "pattern": { "cmd": "sum" }, "data": [1, 2], "id": "7" })).unwrap();
        assert_eq!(request.pattern_key(), r#"{"cmd":"sum"}"#);
        assert!(!request.is_event());
    }

    #[test]
    fn test_response_wire_names() {
        let response = OutgoingResponse::success("7".into(), json!(3));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "id": "7", "response": 3, "isDisposed": true })
        );

        let failure = OutgoingResponse::failure("8".into(), &RpcException::new("boom"));
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({ "id": "8", "err": { "status": "error", "message": "boom" }, "isDisposed": true })
        );
    }
}
