//! crates/careerhub_core/src/envelope.rs
//!
//! The JSON envelope the backend wraps its answers in, and the policy the
//! session store uses to read it: transport status decides success, and error
//! messages are derived in a fixed priority order.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::User;
use crate::ports::RelayReply;

/// Field name → messages, as returned by the backend's validators.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used when an error is not tied to a single field.
pub const GENERAL_ERROR_KEY: &str = "general";

//=========================================================================================
// Wire Envelope
//=========================================================================================

/// The envelope most backend answers use. Every field is optional; fields that
/// are not modelled are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_field_errors",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub errors: FieldErrors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Backends disagree on whether a field error is a string or a list of strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn lenient_field_errors<'de, D>(deserializer: D) -> Result<FieldErrors, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, OneOrMany>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(field, messages)| match messages {
            OneOrMany::One(message) => (field, vec![message]),
            OneOrMany::Many(messages) => (field, messages),
        })
        .collect())
}

impl ApiResponse {
    /// An envelope holding only a message, used for non-JSON replies.
    pub fn from_text(text: &str) -> Self {
        Self {
            message: Some(text.to_string()),
            ..Self::default()
        }
    }

    /// `true` only when the body says `"success": false`.
    pub fn explicitly_failed(&self) -> bool {
        self.success == Some(false)
    }

    /// The `error` field rendered as text; non-string values are JSON-encoded.
    pub fn error_text(&self) -> Option<String> {
        match &self.error {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) if text.is_empty() => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Derives a human-readable failure message.
    ///
    /// Priority: `message`, then every `errors` value joined with ", ", then
    /// `error`, then a generic message carrying the HTTP status.
    pub fn error_message(&self, status: u16) -> String {
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return message.to_string();
        }

        let joined = self
            .errors
            .values()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if !joined.is_empty() {
            return joined;
        }

        self.error_text()
            .unwrap_or_else(|| format!("HTTP error! status: {}", status))
    }

    /// The user carried by a mutation response: `data.user` first, then a
    /// top-level `user`.
    pub fn user_payload(&self) -> Option<User> {
        self.data
            .as_ref()
            .and_then(|data| data.get("user"))
            .and_then(parse_user)
            .or_else(|| self.user.as_ref().and_then(parse_user))
    }

    /// The user carried by the current-user endpoint: `data` itself, falling
    /// back to the mutation shapes.
    pub fn current_user_payload(&self) -> Option<User> {
        if self.explicitly_failed() {
            return None;
        }
        self.data
            .as_ref()
            .and_then(parse_user)
            .or_else(|| self.user_payload())
    }
}

fn parse_user(value: &Value) -> Option<User> {
    if !value.is_object() {
        return None;
    }
    match serde_json::from_value::<User>(value.clone()) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::debug!(error = %e, "payload is not a user record");
            None
        }
    }
}

//=========================================================================================
// Interpretation
//=========================================================================================

/// The relay answered with something that could not be read.
#[derive(Debug, thiserror::Error)]
#[error("Failed to parse response: {0}")]
pub struct EnvelopeError(pub String);

/// A relay reply after interpretation.
#[derive(Debug, Clone)]
pub struct Interpreted {
    pub status: u16,
    pub response: ApiResponse,
}

impl Interpreted {
    /// Transport status decides; the body's `success` flag cannot rescue a
    /// non-2xx answer.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn error_message(&self) -> String {
        self.response.error_message(self.status)
    }
}

/// Reads a relay reply. JSON content is parsed as an envelope; anything else is
/// wrapped as `{message: <text>}`.
pub fn interpret(reply: &RelayReply) -> Result<Interpreted, EnvelopeError> {
    let is_json = reply
        .content_type
        .as_deref()
        .map_or(false, |ct| ct.contains("application/json"));

    let response = if !is_json {
        ApiResponse::from_text(&reply.body)
    } else if reply.body.trim().is_empty() {
        ApiResponse::default()
    } else {
        serde_json::from_str::<ApiResponse>(&reply.body)
            .map_err(|e| EnvelopeError(e.to_string()))?
    };

    Ok(Interpreted {
        status: reply.status,
        response,
    })
}

//=========================================================================================
// Operation Result
//=========================================================================================

/// What the non-throwing session operations hand back to their caller, so
/// field-level errors can be displayed without error handling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationResult {
    pub success: bool,
    pub message: Option<String>,
    pub errors: FieldErrors,
    pub data: Option<Value>,
    pub user: Option<User>,
}

impl OperationResult {
    /// A 2xx answer. It still counts as a failure if the body says so.
    pub fn accepted(response: ApiResponse) -> Self {
        let user = response.user_payload();
        Self {
            success: !response.explicitly_failed(),
            message: response.message,
            errors: response.errors,
            data: response.data,
            user,
        }
    }

    /// A non-2xx answer. Field errors from the body are kept; without any the
    /// derived message is filed under `general`.
    pub fn rejected(interpreted: Interpreted) -> Self {
        let message = interpreted.error_message();
        let mut errors = interpreted.response.errors;
        if errors.is_empty() {
            errors.insert(GENERAL_ERROR_KEY.to_string(), vec![message.clone()]);
        }
        Self {
            success: false,
            message: Some(message),
            errors,
            data: interpreted.response.data,
            user: None,
        }
    }

    /// The call never produced a readable answer.
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(GENERAL_ERROR_KEY.to_string(), vec![message.clone()]);
        Self {
            success: false,
            message: Some(message),
            errors,
            data: None,
            user: None,
        }
    }
}
