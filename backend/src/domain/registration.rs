//! Outcomes and failures of credentials registration.

use std::fmt;

use super::action_result::{ActionResult, Provider};
use super::form::CredentialsSubmission;
use super::identity::Identity;

/// Message shown whenever infrastructure fails, whatever the cause.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error. Please try again.";

/// Message for a newly created credentials account.
pub const ACCOUNT_CREATED_MESSAGE: &str = "Account created successfully.";

/// Message for a password added to an existing Google account.
pub const ACCOUNT_LINKED_MESSAGE: &str = "Password successfully added to your existing Google account. You can now sign in with either method.";

const CREATED_PROVIDERS: &[Provider] = &[Provider::Credentials];
// Google is the only third-party provider accounts can originate from today.
const LINKED_PROVIDERS: &[Provider] = &[Provider::Google, Provider::Credentials];

/// Step of the registration flow that touched infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    EmailLookup,
    UsernameLookup,
    Hashing,
    Create,
    Save,
}

impl fmt::Display for RegistrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EmailLookup => "email_lookup",
            Self::UsernameLookup => "username_lookup",
            Self::Hashing => "hashing",
            Self::Create => "create",
            Self::Save => "save",
        })
    }
}

/// Reasons a registration is refused.
///
/// `Display` renders the user-facing message. Infrastructure failures all
/// render the same generic message; their detail is only for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Email or password was missing.
    MissingCredentials,
    /// The email does not look like an address.
    InvalidEmail,
    /// The password broke the strength policy.
    WeakPassword { reasons: Vec<String> },
    /// The email already belongs to an account with a password.
    EmailAlreadyRegistered { email: String },
    /// Another account already uses the username.
    UsernameTaken { username: String },
    /// A lookup, hash or write failed.
    Infrastructure {
        stage: RegistrationStage,
        detail: String,
    },
}

impl RegistrationError {
    /// Coarse failure class for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "input",
            Self::InvalidEmail | Self::WeakPassword { .. } => "validation",
            Self::EmailAlreadyRegistered { .. } => "conflict",
            Self::UsernameTaken { .. } => "uniqueness",
            Self::Infrastructure { .. } => "infrastructure",
        }
    }

    pub(crate) fn infrastructure(stage: RegistrationStage, detail: impl fmt::Display) -> Self {
        Self::Infrastructure {
            stage,
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "Email and password are required."),
            Self::InvalidEmail => write!(f, "Please enter a valid email address."),
            Self::WeakPassword { reasons } => f.write_str(&reasons.join(" ")),
            Self::EmailAlreadyRegistered { email } => {
                write!(f, "An account with the email \"{email}\" already exists.")
            }
            Self::UsernameTaken { username } => {
                write!(f, "Username \"{username}\" is already taken.")
            }
            Self::Infrastructure { .. } => f.write_str(INTERNAL_ERROR_MESSAGE),
        }
    }
}

impl std::error::Error for RegistrationError {}

impl From<RegistrationError> for ActionResult {
    fn from(value: RegistrationError) -> Self {
        Self::error(value.to_string())
    }
}

/// Successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new credentials identity was created.
    Created(Identity),
    /// A password was added to an existing third-party identity.
    Linked(Identity),
}

impl Registration {
    /// The identity that can now sign in with credentials.
    pub fn identity(&self) -> &Identity {
        match self {
            Self::Created(identity) | Self::Linked(identity) => identity,
        }
    }

    /// Build the success result, echoing the submitted email and password so
    /// the client can sign in straight away.
    pub fn into_action_result(self, submission: &CredentialsSubmission) -> ActionResult {
        let (message, providers, linked) = match &self {
            Self::Created(_) => (ACCOUNT_CREATED_MESSAGE, CREATED_PROVIDERS, false),
            Self::Linked(_) => (ACCOUNT_LINKED_MESSAGE, LINKED_PROVIDERS, true),
        };
        ActionResult::success(message)
            .with_auto_sign_in(
                self.identity().id().to_string(),
                submission.email(),
                submission.password(),
            )
            .with_sign_in_methods(providers, linked)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(RegistrationError::MissingCredentials, "Email and password are required.", "input")]
    #[case(RegistrationError::InvalidEmail, "Please enter a valid email address.", "validation")]
    #[case(
        RegistrationError::WeakPassword {
            reasons: vec!["Too short.".into(), "Needs a digit.".into()],
        },
        "Too short. Needs a digit.",
        "validation"
    )]
    #[case(
        RegistrationError::EmailAlreadyRegistered { email: "Existing@Example.com".into() },
        "An account with the email \"Existing@Example.com\" already exists.",
        "conflict"
    )]
    #[case(
        RegistrationError::UsernameTaken { username: "host".into() },
        "Username \"host\" is already taken.",
        "uniqueness"
    )]
    #[case(
        RegistrationError::infrastructure(RegistrationStage::Save, "deadlock detected"),
        INTERNAL_ERROR_MESSAGE,
        "infrastructure"
    )]
    fn errors_render_user_facing_messages(
        #[case] error: RegistrationError,
        #[case] message: &str,
        #[case] category: &str,
    ) {
        assert_eq!(error.to_string(), message);
        assert_eq!(error.category(), category);
    }

    #[rstest]
    fn error_results_carry_only_status_and_message() {
        let result = ActionResult::from(RegistrationError::InvalidEmail);
        assert_eq!(
            result.to_json(),
            json!({ "status": "error", "message": "Please enter a valid email address." })
        );
    }
}
