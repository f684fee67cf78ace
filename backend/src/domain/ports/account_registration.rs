//! Driving port for credentials sign-up.
//!
//! Inbound adapters hand over the submitted credentials and receive an
//! [`ActionResult`] that is ready for the sanitiser. Failures are reported
//! inside the result rather than as an `Err`, since every outcome, including
//! infrastructure trouble, has a user-facing message.

use async_trait::async_trait;

use crate::domain::{ActionResult, CredentialsSubmission};

/// Domain use-case port for creating credentials accounts.
#[async_trait]
pub trait AccountRegistration: Send + Sync {
    /// Create a credentials account, or add a password to an existing
    /// third-party account with the same email.
    async fn create_credentials_user(&self, submission: &CredentialsSubmission) -> ActionResult;
}
