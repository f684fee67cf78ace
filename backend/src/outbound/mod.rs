//! Outbound adapters implementing domain ports.
//!
//! - **memory_identity_store**: process-local `IdentityStore` that enforces
//!   unique email and username on every write
//! - **argon2_password**: Argon2id hashing and the password strength policy
//!
//! Adapters are thin translators between domain types and their backing
//! technology. They contain no business logic.

pub mod argon2_password;
pub mod memory_identity_store;

pub use argon2_password::{Argon2PasswordService, PasswordPolicy};
pub use memory_identity_store::InMemoryIdentityStore;
