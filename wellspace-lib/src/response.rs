//! Unified API response shape
//!
//! Every route answers with one of two JSON shapes:
//!
//! ```text
//! {"success": true, ...payload fields}
//! {"success": false, "kind": "...", "code": "...", "message": "...", "errors": {...}?}
//! ```
//!
//! The server encodes with [`ApiResponse::to_json`]; the client decodes with
//! [`ApiResponse::decode`], so both sides share one definition.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::error::ErrorKind;
use crate::model::Session;
use crate::model::User;
use crate::validation::FieldErrors;

/// The failure half of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ApiFailure {
    /// Converts back into an [`Error`].
    pub fn into_error(self, status: u16) -> Error {
        Error::from_parts(self.kind, status, self.message, self.errors)
    }
}

impl From<&Error> for ApiFailure {
    fn from(err: &Error) -> Self {
        let kind = err.kind();
        Self {
            kind,
            code: kind.code().to_string(),
            message: err.to_string(),
            errors: err.field_errors().filter(|e| !e.is_empty()).cloned(),
        }
    }
}

/// A route result: a payload or a failure.
#[derive(Debug, Clone)]
pub enum ApiResponse<T> {
    Ok(T),
    Err(ApiFailure),
}

impl<T> ApiResponse<T> {
    /// Wraps a service result.
    pub fn from_result(result: Result<T, Error>) -> Self {
        match result {
            Ok(data) => Self::Ok(data),
            Err(err) => Self::Err(ApiFailure::from(&err)),
        }
    }

    /// `true` for the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Encodes to the wire shape.
    ///
    /// Object payloads are flattened next to `"success"`; anything else is
    /// placed under `"data"`.
    pub fn to_json(&self) -> Value {
        let (success, body) = match self {
            Self::Ok(data) => (true, serde_json::to_value(data)),
            Self::Err(failure) => (false, serde_json::to_value(failure)),
        };

        let mut object = match body {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => serde_json::Map::new(),
            Ok(other) => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
            Err(err) => {
                log::error!("Response serialization failed: {err}");
                return serde_json::json!({
                    "success": false,
                    "kind": ErrorKind::Server,
                    "code": ErrorKind::Server.code(),
                    "message": "Internal server error",
                });
            }
        };
        object.insert("success".to_string(), Value::Bool(success));
        Value::Object(object)
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Decodes a response body received with HTTP `status`.
    ///
    /// Bodies that match neither shape are classified by status alone.
    pub fn decode(body: Value, status: u16) -> Result<T, Error> {
        let success = body.get("success").and_then(Value::as_bool);

        match success {
            Some(true) => serde_json::from_value(body)
                .map_err(|err| Error::server(format!("Unexpected response payload: {err}"))),
            Some(false) => match serde_json::from_value::<ApiFailure>(body.clone()) {
                Ok(failure) => Err(failure.into_error(status)),
                Err(_) => Err(fallback_error(&body, status)),
            },
            None => Err(fallback_error(&body, status)),
        }
    }
}

fn fallback_error(body: &Value, status: u16) -> Error {
    let message = body
        .get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("Unexpected response from server");
    Error::from_parts(ErrorKind::from_status(status), status, message, None)
}

// =============================================================================
// Payloads
// =============================================================================

/// Returned by register and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// Returned by `me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub user: User,
}

/// Returned by single-session routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub session: Session,
}

/// Returned by listing routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionsPayload {
    pub sessions: Vec<Session>,
}

/// Returned by the auto-save route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSavePayload {
    pub session: Session,
    #[serde(rename = "lastSaved")]
    pub last_saved: DateTime<Utc>,
}

/// A bare confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}

impl MessagePayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_flattens_payload() {
        let json = ApiResponse::Ok(MessagePayload::new("Logged out")).to_json();
        assert_eq!(json, serde_json::json!({"success": true, "message": "Logged out"}));
    }

    #[test]
    fn test_failure_shape() {
        let mut errors = FieldErrors::new();
        errors.insert("title", "Title is required");
        let err = Error::from_field_errors(errors);
        let json = ApiResponse::<MessagePayload>::from_result(Err(err)).to_json();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "kind": "validation",
                "code": "VALIDATION_ERROR",
                "message": "Title is required",
                "errors": {"title": "Title is required"},
            })
        );
    }

    #[test]
    fn test_failure_omits_empty_errors() {
        let json = ApiResponse::<MessagePayload>::from_result(Err(Error::NotFound(
            "Session not found".into(),
        )))
        .to_json();
        assert!(json.get("errors").is_none());
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[test]
    fn test_decode_round_trip() {
        let json = ApiResponse::Ok(MessagePayload::new("hi")).to_json();
        let payload: MessagePayload = ApiResponse::decode(json, 200).unwrap();
        assert_eq!(payload.message, "hi");

        let err = Error::Authorization("Not yours".into());
        let json = ApiResponse::<MessagePayload>::from_result(Err(err)).to_json();
        let decoded = ApiResponse::<MessagePayload>::decode(json, 403).unwrap_err();
        assert_eq!(decoded.kind(), ErrorKind::Authorization);
        assert_eq!(decoded.to_string(), "Not yours");
    }

    #[test]
    fn test_decode_foreign_shape_uses_status() {
        let body = serde_json::json!({"error": "Bad gateway"});
        let err = ApiResponse::<MessagePayload>::decode(body, 502).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.status_code(), 502);
        assert!(err.is_retryable());

        let err = ApiResponse::<MessagePayload>::decode(serde_json::json!({}), 401).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }
}
