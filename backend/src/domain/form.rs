//! Submitted form values at the inbound boundary.
//!
//! Forms arrive as flat key/value pairs. Nested inputs use dotted keys such
//! as `rates.nightly` or `location.street`; [`FormSubmission::to_form_data`]
//! folds them back into the nested shape the UI re-populates from.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;
use zeroize::Zeroizing;

/// Field names that are never echoed back to the client.
const SECRET_FIELDS: [&str; 1] = ["password"];

/// Flat key/value pairs from an HTML form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    fields: BTreeMap<String, String>,
}

impl FormSubmission {
    /// Value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Extract the account registration fields.
    ///
    /// Missing `email` or `password` become empty strings so validation can
    /// report them uniformly.
    pub fn credentials(&self) -> CredentialsSubmission {
        CredentialsSubmission::new(
            self.get("email").unwrap_or_default(),
            self.get("password").unwrap_or_default(),
            self.get("username"),
        )
    }

    /// Rebuild the submitted values as a nested object for re-population.
    ///
    /// # Examples
    /// ```
    /// use rentals::domain::FormSubmission;
    /// use serde_json::json;
    ///
    /// let form: FormSubmission = [
    ///     ("name", "Beach House"),
    ///     ("rates.nightly", "120"),
    ///     ("location.street", "1 Shore Rd"),
    ///     ("password", "hidden"),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// assert_eq!(
    ///     serde_json::Value::Object(form.to_form_data()),
    ///     json!({
    ///         "name": "Beach House",
    ///         "rates": { "nightly": "120" },
    ///         "location": { "street": "1 Shore Rd" },
    ///     })
    /// );
    /// ```
    pub fn to_form_data(&self) -> Map<String, Value> {
        let mut root = Map::new();
        for (key, value) in &self.fields {
            if SECRET_FIELDS.contains(&key.as_str()) {
                continue;
            }
            if !insert_dotted(&mut root, key, value) {
                warn!(field = %key, "form key collides with another field; not echoed");
            }
        }
        root
    }
}

impl<K, V> FromIterator<(K, V)> for FormSubmission
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

fn insert_dotted(root: &mut Map<String, Value>, key: &str, value: &str) -> bool {
    if key.split('.').any(str::is_empty) {
        return false;
    }
    let mut segments = key.split('.').peekable();
    let mut node = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            if node.contains_key(segment) {
                return false;
            }
            node.insert(segment.to_owned(), Value::String(value.to_owned()));
            return true;
        }
        let child = node
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(next) = child else {
            return false;
        };
        node = next;
    }
    false
}

/// Raw registration input, prior to validation.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialsSubmission {
    email: String,
    password: Zeroizing<String>,
    username: Option<String>,
}

impl CredentialsSubmission {
    /// Capture submitted credentials without validating them.
    pub fn new(email: &str, password: &str, username: Option<&str>) -> Self {
        Self {
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
            username: username.map(str::to_owned),
        }
    }

    /// Email exactly as submitted.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Plaintext password as submitted.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Explicit username, if one was supplied and is non-blank after trimming.
    pub fn requested_username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl fmt::Debug for CredentialsSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsSubmission")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn credentials_default_missing_fields_to_empty() {
        let form: FormSubmission = [("username", "  ")].into_iter().collect();
        let credentials = form.credentials();

        assert_eq!(credentials.email(), "");
        assert_eq!(credentials.password(), "");
        assert_eq!(credentials.requested_username(), None);
    }

    #[rstest]
    #[case(Some("  host "), Some("host"))]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn requested_username_is_trimmed(#[case] raw: Option<&str>, #[case] expected: Option<&str>) {
        let credentials = CredentialsSubmission::new("a@example.com", "pw", raw);
        assert_eq!(credentials.requested_username(), expected);
    }

    #[rstest]
    fn debug_output_redacts_password() {
        let credentials = CredentialsSubmission::new("a@example.com", "s3cret-pw", None);
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("s3cret-pw"));
        assert!(rendered.contains("<redacted>"));
    }

    #[rstest]
    fn colliding_keys_keep_the_first_value() {
        let form: FormSubmission = [("rates", "flat"), ("rates.nightly", "120"), ("bad.", "x")]
            .into_iter()
            .collect();

        assert_eq!(
            Value::Object(form.to_form_data()),
            json!({ "rates": "flat" })
        );
    }

    #[rstest]
    fn deep_keys_nest_fully() {
        let form: FormSubmission = [("rates.weekly.min", "500"), ("rates.nightly", "90")]
            .into_iter()
            .collect();

        assert_eq!(
            Value::Object(form.to_form_data()),
            json!({ "rates": { "nightly": "90", "weekly": { "min": "500" } } })
        );
    }
}
