//! Client-safe outcome of a mutating operation.
//!
//! Every mutating action (listing create/update, messaging toggles, account
//! registration) hands the UI an [`ActionResult`]. Only the fields declared
//! here ever cross the server/client boundary; untrusted values are rebuilt
//! through [`crate::domain::sanitize_action_result`].

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::error_tree::ErrorTree;

/// Overall outcome reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// The mutation was applied.
    Success,
    /// The mutation was rejected or failed.
    Error,
}

impl ActionStatus {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Parse the wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign-in methods an identity can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Email and password.
    Credentials,
    /// Google OAuth, currently the only third-party provider.
    Google,
}

impl Provider {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical mutation result.
///
/// ## Invariants
/// - When `status` is [`ActionStatus::Error`], `user_id` and `password` are
///   absent. The builder methods silently ignore them on error results.
/// - Absent fields are omitted from the JSON encoding; no key is ever `null`.
///
/// # Examples
/// ```
/// use rentals::domain::{ActionResult, ActionStatus};
///
/// let result = ActionResult::error("Listing not found.")
///     .with_auto_sign_in("user-1", "a@example.com", "secret");
/// assert_eq!(result.status(), Some(ActionStatus::Error));
/// assert!(result.user_id().is_none());
/// assert!(result.password().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) status: Option<ActionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_account_linked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) can_sign_in_with: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) should_auto_login: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) form_error_map: Option<ErrorTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) form_data: Option<Map<String, Value>>,
}

impl ActionResult {
    /// Successful result with a user-facing message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Some(ActionStatus::Success),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Failed result with a user-facing message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(ActionStatus::Error),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Failed form submission: per-field errors plus the submitted values so
    /// the form can be re-populated.
    pub fn validation_failed(
        message: impl Into<String>,
        form_error_map: ErrorTree,
        form_data: Map<String, Value>,
    ) -> Self {
        Self {
            form_error_map: Some(form_error_map),
            form_data: Some(form_data),
            ..Self::error(message)
        }
    }

    /// Attach what the client needs to sign the user in without re-prompting.
    ///
    /// Ignored for `user_id` and `password` on error results.
    pub fn with_auto_sign_in(
        mut self,
        user_id: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.email = Some(email.into());
        if self.is_error() {
            return self;
        }
        self.user_id = Some(user_id.into());
        self.password = Some(password.into());
        self.should_auto_login = Some(true);
        self
    }

    /// Record which sign-in methods the account now supports.
    pub fn with_sign_in_methods(mut self, providers: &[Provider], linked: bool) -> Self {
        self.can_sign_in_with = Some(
            providers
                .iter()
                .map(|provider| provider.as_str().to_owned())
                .collect(),
        );
        self.is_account_linked = Some(linked);
        self
    }

    /// Report the favourite state of a listing after a toggle.
    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }

    /// Report the read state of a message after a toggle.
    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    /// Outcome, if reported.
    pub fn status(&self) -> Option<ActionStatus> {
        self.status
    }

    /// Whether the result reports a failure.
    pub fn is_error(&self) -> bool {
        self.status == Some(ActionStatus::Error)
    }

    /// User-facing message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Identifier of the affected user.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Email echoed back as submitted.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Plaintext password used only to drive client-side sign-in.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Whether credentials were attached to an existing third-party account.
    pub fn is_account_linked(&self) -> Option<bool> {
        self.is_account_linked
    }

    /// Provider identifiers the account can sign in with.
    pub fn can_sign_in_with(&self) -> Option<&[String]> {
        self.can_sign_in_with.as_deref()
    }

    /// Whether the client should sign in immediately.
    pub fn should_auto_login(&self) -> Option<bool> {
        self.should_auto_login
    }

    /// Favourite state after a toggle.
    pub fn is_favorite(&self) -> Option<bool> {
        self.is_favorite
    }

    /// Read state after a toggle.
    pub fn is_read(&self) -> Option<bool> {
        self.is_read
    }

    /// Per-field validation messages.
    pub fn form_error_map(&self) -> Option<&ErrorTree> {
        self.form_error_map.as_ref()
    }

    /// Submitted values echoed for re-population.
    pub fn form_data(&self) -> Option<&Map<String, Value>> {
        self.form_data.as_ref()
    }

    /// Encode the result as the JSON object handed to the UI.
    pub fn to_json(&self) -> Value {
        // Every field is a string, bool, list or string-keyed map.
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn success_with_sign_in_encodes_camel_case_fields() {
        let result = ActionResult::success("Account created successfully.")
            .with_auto_sign_in("u-1", "New@Example.com", "hunter22")
            .with_sign_in_methods(&[Provider::Credentials], false);

        assert_eq!(
            result.to_json(),
            json!({
                "status": "success",
                "message": "Account created successfully.",
                "userId": "u-1",
                "email": "New@Example.com",
                "password": "hunter22",
                "isAccountLinked": false,
                "canSignInWith": ["credentials"],
                "shouldAutoLogin": true,
            })
        );
    }

    #[rstest]
    fn error_results_never_carry_user_id_or_password() {
        let result = ActionResult::error("nope").with_auto_sign_in("u-1", "a@b.co", "pw");

        assert_eq!(
            result.to_json(),
            json!({ "status": "error", "message": "nope", "email": "a@b.co" })
        );
    }

    #[rstest]
    fn validation_failure_encodes_form_state_and_flags() {
        let mut errors = ErrorTree::new();
        errors.push_message("title", "Required").expect("leaf insert");
        let mut form = Map::new();
        form.insert("title".into(), json!(""));
        let result = ActionResult::validation_failed("Please fix the form.", errors, form)
            .with_favorite(true)
            .with_read(false);

        assert_eq!(
            result.to_json(),
            json!({
                "status": "error",
                "message": "Please fix the form.",
                "isFavorite": true,
                "isRead": false,
                "formErrorMap": { "title": ["Required"] },
                "formData": { "title": "" },
            })
        );
    }

    #[rstest]
    #[case("success", Some(ActionStatus::Success))]
    #[case("error", Some(ActionStatus::Error))]
    #[case("Error", None)]
    #[case("", None)]
    fn status_parsing_is_exact(#[case] raw: &str, #[case] expected: Option<ActionStatus>) {
        assert_eq!(ActionStatus::parse(raw), expected);
    }

    #[rstest]
    fn empty_result_encodes_to_empty_object() {
        assert_eq!(ActionResult::default().to_json(), json!({}));
    }
}
