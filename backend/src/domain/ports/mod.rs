//! Domain ports and supporting types for the hexagonal boundary.

mod account_registration;
mod identity_store;
mod password_service;

pub use account_registration::AccountRegistration;
#[cfg(test)]
pub use identity_store::MockIdentityStore;
pub use identity_store::{IdentityStore, IdentityStoreError, UniqueField};
#[cfg(test)]
pub use password_service::MockPasswordService;
pub use password_service::{PasswordService, PasswordServiceError, PasswordStrength};
