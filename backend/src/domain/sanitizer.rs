//! Allow-list sanitiser for mutation results crossing to the client.
//!
//! The sanitiser walks a fixed table of recognised fields and never the
//! input's own keys, so unrecognised properties cannot ride along. Defects
//! are handled with two policies:
//!
//! - [`InputDefect`]: the input is not a keyed container at all, so the
//!   result is empty.
//! - [`FieldDefect`]: one field has the wrong type. Only that field is dropped;
//!   every other field is an independent signal to the UI and survives.

use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

use super::action_result::{ActionResult, ActionStatus};
use super::error_tree::{ErrorTree, ErrorTreeShapeError};

/// Reasons the whole input is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDefect {
    /// No input was supplied.
    Missing,
    /// The input was a primitive rather than a keyed container.
    NotAnObject,
    /// Raw input text could not be decoded.
    Unreadable { message: String },
}

impl fmt::Display for InputDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "action result is null or undefined"),
            Self::NotAnObject => write!(f, "action result is not an object"),
            Self::Unreadable { message } => write!(f, "action result is unreadable: {message}"),
        }
    }
}

impl std::error::Error for InputDefect {}

/// Reasons a single recognised field is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDefect {
    /// The value has the wrong JSON type.
    WrongType { expected: &'static str },
    /// `status` is a string outside `success`/`error`.
    UnknownStatus { value: String },
    /// A list entry has the wrong type.
    InvalidEntry { index: usize },
    /// `formErrorMap` is not a well-formed error tree.
    ErrorTree(ErrorTreeShapeError),
}

impl fmt::Display for FieldDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongType { expected } => write!(f, "expected {expected}"),
            Self::UnknownStatus { value } => write!(f, "unknown status `{value}`"),
            Self::InvalidEntry { index } => write!(f, "entry {index} is not a string"),
            Self::ErrorTree(error) => write!(f, "malformed error tree: {error}"),
        }
    }
}

impl std::error::Error for FieldDefect {}

type ApplyField = fn(&mut ActionResult, &Value) -> Result<(), FieldDefect>;

/// Every field an [`ActionResult`] may carry, with its validator and cloner.
const RECOGNIZED_FIELDS: [(&str, ApplyField); 12] = [
    ("status", apply_status),
    ("message", apply_message),
    ("userId", apply_user_id),
    ("email", apply_email),
    ("password", apply_password),
    ("isAccountLinked", apply_is_account_linked),
    ("canSignInWith", apply_providers),
    ("shouldAutoLogin", apply_should_auto_login),
    ("isFavorite", apply_is_favorite),
    ("isRead", apply_is_read),
    ("formErrorMap", apply_form_error_map),
    ("formData", apply_form_data),
];

/// Rebuild an untrusted value as an [`ActionResult`], falling back to an
/// empty result.
///
/// # Examples
/// ```
/// use rentals::domain::sanitize_action_result;
/// use serde_json::json;
///
/// let result = sanitize_action_result(&json!({
///     "status": "success",
///     "isFavorite": "yes",
///     "__proto__": { "admin": true },
/// }));
/// assert_eq!(result.to_json(), json!({ "status": "success" }));
/// ```
pub fn sanitize_action_result(input: &Value) -> ActionResult {
    or_empty_result(try_sanitize_action_result(input))
}

/// Rebuild an untrusted value as an [`ActionResult`], reporting input-level
/// defects.
pub fn try_sanitize_action_result(input: &Value) -> Result<ActionResult, InputDefect> {
    let fields = match input {
        Value::Null => return Err(InputDefect::Missing),
        Value::Object(fields) => fields,
        // Arrays are containers but expose none of the recognised keys.
        Value::Array(_) => return Ok(ActionResult::default()),
        _ => return Err(InputDefect::NotAnObject),
    };
    Ok(sanitize_fields(fields))
}

/// Decode raw JSON text and sanitise it, falling back to an empty result.
pub fn sanitize_json_str(raw: &str) -> ActionResult {
    let decoded = serde_json::from_str::<Value>(raw).map_err(|error| InputDefect::Unreadable {
        message: error.to_string(),
    });
    or_empty_result(decoded.and_then(|value| try_sanitize_action_result(&value)))
}

fn or_empty_result(outcome: Result<ActionResult, InputDefect>) -> ActionResult {
    outcome.unwrap_or_else(|defect| {
        warn!(reason = %defect, "discarding action result");
        ActionResult::default()
    })
}

fn sanitize_fields(fields: &Map<String, Value>) -> ActionResult {
    let mut result = ActionResult::default();
    for (name, apply) in RECOGNIZED_FIELDS {
        let Some(value) = fields.get(name).filter(|value| !value.is_null()) else {
            continue;
        };
        if let Err(defect) = apply(&mut result, value) {
            warn!(field = name, reason = %defect, "dropping action result field");
        }
    }

    if result.is_error() && (result.user_id.is_some() || result.password.is_some()) {
        warn!("dropping userId and password from error result");
        result.user_id = None;
        result.password = None;
    }
    result
}

fn apply_status(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    let raw = text(value)?;
    let status = ActionStatus::parse(&raw).ok_or(FieldDefect::UnknownStatus { value: raw })?;
    out.status = Some(status);
    Ok(())
}

fn apply_providers(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    let Value::Array(entries) = value else {
        return Err(FieldDefect::WrongType { expected: "array" });
    };
    let providers = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry
                .as_str()
                .map(str::to_owned)
                .ok_or(FieldDefect::InvalidEntry { index })
        })
        .collect::<Result<Vec<_>, _>>()?;
    out.can_sign_in_with = Some(providers);
    Ok(())
}

fn apply_message(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.message = Some(text(value)?);
    Ok(())
}

fn apply_user_id(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.user_id = Some(text(value)?);
    Ok(())
}

fn apply_email(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.email = Some(text(value)?);
    Ok(())
}

fn apply_password(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.password = Some(text(value)?);
    Ok(())
}

fn apply_is_account_linked(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.is_account_linked = Some(flag(value)?);
    Ok(())
}

fn apply_should_auto_login(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.should_auto_login = Some(flag(value)?);
    Ok(())
}

fn apply_is_favorite(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.is_favorite = Some(flag(value)?);
    Ok(())
}

fn apply_is_read(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.is_read = Some(flag(value)?);
    Ok(())
}

fn apply_form_error_map(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.form_error_map = Some(ErrorTree::from_json(value).map_err(FieldDefect::ErrorTree)?);
    Ok(())
}

fn apply_form_data(out: &mut ActionResult, value: &Value) -> Result<(), FieldDefect> {
    out.form_data = Some(object(value)?);
    Ok(())
}

fn text(value: &Value) -> Result<String, FieldDefect> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or(FieldDefect::WrongType { expected: "string" })
}

fn flag(value: &Value) -> Result<bool, FieldDefect> {
    value
        .as_bool()
        .ok_or(FieldDefect::WrongType { expected: "boolean" })
}

fn object(value: &Value) -> Result<Map<String, Value>, FieldDefect> {
    value
        .as_object()
        .cloned()
        .ok_or(FieldDefect::WrongType { expected: "object" })
}
