//! Port abstraction for identity persistence adapters and their errors.
//!
//! Adapters own uniqueness of `email` and `username`. [`IdentityStore::create`]
//! and [`IdentityStore::save`] must reject a write that would duplicate either
//! value with [`IdentityStoreError::UniqueViolation`], so callers can rely on
//! the store rather than on an earlier lookup that may already be stale.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Identity, IdentityId, NewIdentity};

/// Column protected by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    /// Lower-cased email address.
    Email,
    /// Public handle.
    Username,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::Username => f.write_str("username"),
        }
    }
}

/// Persistence errors raised by identity store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityStoreError {
    /// Store connection could not be established.
    #[error("identity store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("identity store query failed: {message}")]
    Query { message: String },
    /// A write would have duplicated a unique value.
    #[error("identity store rejected duplicate {field}")]
    UniqueViolation { field: UniqueField },
}

impl IdentityStoreError {
    /// Build a [`IdentityStoreError::Connection`] error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`IdentityStoreError::Query`] error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Build a [`IdentityStoreError::UniqueViolation`] error.
    pub fn unique_violation(field: UniqueField) -> Self {
        Self::UniqueViolation { field }
    }
}

/// Port for identity lookup and persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find an identity by its lower-cased email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityStoreError>;

    /// Find an identity holding `username`, ignoring `excluding` when given.
    async fn find_by_username(
        &self,
        username: &str,
        excluding: Option<IdentityId>,
    ) -> Result<Option<Identity>, IdentityStoreError>;

    /// Insert a new identity if neither its email nor its username is taken.
    async fn create(&self, identity: NewIdentity) -> Result<Identity, IdentityStoreError>;

    /// Persist in-place changes to an existing identity.
    async fn save(&self, identity: &Identity) -> Result<Identity, IdentityStoreError>;
}
