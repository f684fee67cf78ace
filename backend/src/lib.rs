//! Mutation-result core for the rentals site.
//!
//! Validation issues become nested error trees, untrusted action results are
//! rebuilt field by field from a fixed allow-list, and credentials sign-up
//! runs through [`domain::CredentialAccountCoordinator`].

pub mod config;
pub mod domain;
pub mod outbound;
