//! Port for password hashing and strength policy.

use async_trait::async_trait;

/// Errors raised by password adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordServiceError {
    /// The adapter could not be built from its settings.
    #[error("password service misconfigured: {message}")]
    Configuration { message: String },
    /// Hashing failed or was interrupted.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

impl PasswordServiceError {
    /// Build a [`PasswordServiceError::Configuration`] error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Build a [`PasswordServiceError::Hashing`] error.
    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }
}

/// Outcome of a password strength check.
///
/// ## Invariants
/// - `is_valid()` is true exactly when `errors()` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordStrength {
    errors: Vec<String>,
}

impl PasswordStrength {
    /// The password satisfies every rule.
    pub fn valid() -> Self {
        Self::default()
    }

    /// The password breaks the listed rules, in the order they were checked.
    pub fn rejected(errors: Vec<String>) -> Self {
        Self { errors }
    }

    /// Whether the password satisfies every rule.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// User-facing reasons the password was rejected.
    pub fn errors(&self) -> &[String] {
        self.errors.as_slice()
    }
}

/// Port for turning plaintext passwords into stored hashes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordService: Send + Sync {
    /// Hash a plaintext password for storage.
    async fn hash(&self, plaintext: &str) -> Result<String, PasswordServiceError>;

    /// Check a plaintext password against the strength policy.
    fn validate_strength(&self, plaintext: &str) -> PasswordStrength;
}
