//! Domain primitives and services for rental-site form actions.
//!
//! Purpose: turn untrusted validation output and action payloads into
//! well-formed values, and coordinate credentials sign-up against the
//! identity and password ports. Nothing here panics on malformed input.
//!
//! Public surface:
//! - ErrorTree (alias to `error_tree::ErrorTree`) - field errors, at most two
//!   levels deep.
//! - normalize_issue_batch (alias to `validation_issue::normalize_issue_batch`)
//!   - validator issues folded into an [`ErrorTree`].
//! - ActionResult (alias to `action_result::ActionResult`) - envelope every
//!   form action returns.
//! - sanitize_action_result (alias to `sanitizer::sanitize_action_result`) -
//!   allow-list rebuild of an untrusted result.
//! - CredentialAccountCoordinator (alias to
//!   `registration_service::CredentialAccountCoordinator`) - sign-up and
//!   password linking.

pub mod action_result;
pub mod error_tree;
pub mod form;
pub mod identity;
pub mod ports;
pub mod registration;
pub mod registration_service;
pub mod sanitizer;
pub mod validation_issue;

pub use self::action_result::{ActionResult, ActionStatus, Provider};
pub use self::error_tree::{ErrorNode, ErrorTree, ErrorTreeShapeError, PathSegment};
pub use self::form::{CredentialsSubmission, FormSubmission};
pub use self::identity::{
    EmailAddress, EmailValidationError, Identity, IdentityId, NewIdentity, Username,
    UsernameValidationError,
};
pub use self::registration::{
    ACCOUNT_CREATED_MESSAGE, ACCOUNT_LINKED_MESSAGE, INTERNAL_ERROR_MESSAGE, Registration,
    RegistrationError, RegistrationStage,
};
pub use self::registration_service::CredentialAccountCoordinator;
pub use self::sanitizer::{
    FieldDefect, InputDefect, sanitize_action_result, sanitize_json_str,
    try_sanitize_action_result,
};
pub use self::validation_issue::{
    BatchDefect, IssueDefect, ValidationIssue, normalize_issue_batch, normalize_issue_stream,
    normalize_issues, try_normalize_issue_batch,
};
