//! Provider-specific error payload detection.
//!
//! Providers signal failures inside a 200 response in different ways:
//!
//! | Shape | Example |
//! |-------|---------|
//! | `Field("error")` | `{"error": "bad request"}` |
//! | `Field("error")` | `{"error": {"code": "invalid_access_key", "message": "..."}}` |
//! | `Field("Error Message")` | `{"Error Message": "Invalid API key"}` |
//! | `Status { .. }` | `{"ret": 401, "msg": "token invalid"}` |

use serde_json::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorShape {
    /// A top-level field holding a string, or an object with `message`.
    Field(&'static str),
    /// A numeric status field that must equal `ok`, with the text in `message`.
    Status {
        code: &'static str,
        ok: i64,
        message: &'static str,
    },
}

impl ErrorShape {
    /// The provider error message carried by `body`, if any.
    pub fn extract(&self, body: &Value) -> Option<String> {
        let object = body.as_object()?;
        match self {
            Self::Field(name) => match object.get(*name)? {
                Value::Null | Value::Bool(false) => None,
                Value::String(s) if s.is_empty() => None,
                Value::String(s) => Some(s.clone()),
                Value::Object(inner) => inner
                    .get("message")
                    .or_else(|| inner.get("info"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| Some(Value::Object(inner.clone()).to_string())),
                other => Some(other.to_string()),
            },
            Self::Status { code, ok, message } => {
                let status = object.get(*code)?.as_i64()?;
                if status == *ok {
                    return None;
                }
                Some(
                    object
                        .get(*message)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("status {}", status)),
                )
            }
        }
    }
}

/// First message matched by any of `shapes`.
pub(crate) fn extract_provider_error(shapes: &[ErrorShape], body: &Value) -> Option<String> {
    shapes.iter().find_map(|shape| shape.extract(body))
}
