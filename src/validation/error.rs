//! RPC-style error shapes produced by the validation stage.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One offending property.
///
/// Never carries the validated instance. `value` stays empty unless the
/// pipe was explicitly configured to expose values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub property: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Constraint name → human readable message.
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldError>,
}

impl FieldError {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: None,
            constraints: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn constraint(
        property: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(property);
        error.constraints.insert(name.into(), message.into());
        error
    }

    /// `true` if this error or a descendant names `constraint`.
    pub fn has_constraint(&self, constraint: &str) -> bool {
        self.constraints.contains_key(constraint)
            || self.children.iter().any(|c| c.has_constraint(constraint))
    }
}

/// Payload of an [`RpcException`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcMessage {
    Validation(Vec<FieldError>),
    Text(String),
}

/// Transport-agnostic error delivered back to the caller.
///
/// Serializes as `{ "status": "error", "message": ... }` on every transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcException {
    pub status: String,
    pub message: RpcMessage,
}

impl RpcException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: RpcMessage::Text(message.into()),
        }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            status: "error".to_string(),
            message: RpcMessage::Validation(errors),
        }
    }

    pub fn internal(error: impl std::fmt::Display) -> Self {
        Self::new(format!("Internal server error: {}", error))
    }

    /// Field errors when this is a validation failure.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match &self.message {
            RpcMessage::Validation(errors) => Some(errors),
            RpcMessage::Text(_) => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.field_errors().is_some()
    }

    /// One line for logs: property names only, never values.
    pub fn summary(&self) -> String {
        match &self.message {
            RpcMessage::Text(text) => text.clone(),
            RpcMessage::Validation(errors) => {
                let properties: Vec<&str> = errors.iter().map(|e| e.property.as_str()).collect();
                format!("validation failed for: {}", properties.join(", "))
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(self.summary()))
    }
}

impl std::fmt::Display for RpcException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for RpcException {}

impl IntoResponse for RpcException {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}
