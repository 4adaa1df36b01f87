use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{RstakeError, Result};

/// The `{success, message, data}` envelope every endpoint answers with.
///
/// `data` is `None` whenever the payload is absent or does not match `T`
/// (failures usually carry `data: {}`). `status` is the HTTP status the
/// envelope arrived with; it is not part of the wire format.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    pub status: u16,
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Interpret a parsed JSON body. Missing or mistyped fields degrade to
    /// their empty values instead of failing.
    pub fn from_value(status: u16, mut body: Value) -> Self {
        let success = body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let message = match body.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let data = match body.get_mut("data").map(Value::take) {
            None | Some(Value::Null) => None,
            Some(raw) => match serde_json::from_value::<T>(raw) {
                Ok(data) => Some(data),
                Err(e) => {
                    if success {
                        tracing::debug!(error = %e, "response data did not match expected shape");
                    }
                    None
                }
            },
        };
        Self {
            status,
            success,
            message,
            data,
        }
    }
}

impl<T> ApiResponse<T> {
    /// A synthetic failure envelope.
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// The envelope for a 2xx response whose body was empty or not JSON.
    pub fn empty(status: u16) -> Self {
        Self::failure(status, String::new())
    }

    /// `data` of a successful envelope, or an [`RstakeError::Api`].
    pub fn into_data(self) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(RstakeError::Api {
                status: self.status,
                message: if self.message.is_empty() {
                    "response carried no data".into()
                } else {
                    self.message
                },
            }),
            (false, _) => Err(RstakeError::Api {
                status: self.status,
                message: self.message,
            }),
        }
    }

    /// Succeeds when `success` is true, ignoring `data`.
    pub fn into_ack(self) -> Result<String> {
        if self.success {
            Ok(self.message)
        } else {
            Err(RstakeError::Api {
                status: self.status,
                message: self.message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    #[test]
    fn test_success_envelope_parses_data() {
        let resp: ApiResponse<Payload> = ApiResponse::from_value(
            200,
            json!({"success": true, "message": "ok", "data": {"value": 7}}),
        );
        assert!(resp.success);
        assert_eq!(resp.message, "ok");
        assert_eq!(resp.data, Some(Payload { value: 7 }));
        assert_eq!(resp.into_data().unwrap(), Payload { value: 7 });
    }

    #[test]
    fn test_failure_with_empty_object_data_is_none() {
        let resp: ApiResponse<Payload> = ApiResponse::from_value(
            400,
            json!({"success": false, "message": "Insufficient balance", "data": {}}),
        );
        assert!(!resp.success);
        assert!(resp.data.is_none());
        match resp.into_data() {
            Err(RstakeError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Insufficient balance");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_degrade() {
        let resp: ApiResponse<Payload> = ApiResponse::from_value(200, json!({}));
        assert!(!resp.success);
        assert_eq!(resp.message, "");
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_success_without_data_is_an_error() {
        let resp: ApiResponse<Payload> =
            ApiResponse::from_value(200, json!({"success": true, "message": "", "data": null}));
        assert!(resp.into_data().is_err());
    }

    #[test]
    fn test_into_ack_ignores_data() {
        let resp: ApiResponse<Payload> =
            ApiResponse::from_value(200, json!({"success": true, "message": "logged out", "data": {}}));
        assert_eq!(resp.into_ack().unwrap(), "logged out");
    }
}
