//! Credentials registration and account linking.
//!
//! The coordinator validates the submission, looks the email up, then either
//! rejects it (credentials already exist), links a password to a
//! third-party-only identity, or creates a fresh identity. Each call is a
//! single sequential request; nothing is rolled back if the caller abandons
//! it after a write has been issued.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::domain::ports::{
    AccountRegistration, IdentityStore, IdentityStoreError, PasswordService, UniqueField,
};
use crate::domain::registration::{Registration, RegistrationError, RegistrationStage};
use crate::domain::{
    ActionResult, CredentialsSubmission, EmailAddress, Identity, NewIdentity, Username,
};

/// Coordinates identity lookup, creation and password linking.
#[derive(Clone)]
pub struct CredentialAccountCoordinator<S, P> {
    store: Arc<S>,
    passwords: Arc<P>,
}

impl<S, P> CredentialAccountCoordinator<S, P> {
    /// Create a coordinator over the given identity store and password service.
    pub fn new(store: Arc<S>, passwords: Arc<P>) -> Self {
        Self { store, passwords }
    }
}

impl<S, P> CredentialAccountCoordinator<S, P>
where
    S: IdentityStore,
    P: PasswordService,
{
    /// Run the registration flow and report the typed outcome.
    pub async fn register(
        &self,
        submission: &CredentialsSubmission,
    ) -> Result<Registration, RegistrationError> {
        let email = self.validate(submission)?;

        let existing = self
            .store
            .find_by_email(email.normalized())
            .await
            .map_err(|err| {
                RegistrationError::infrastructure(RegistrationStage::EmailLookup, err)
            })?;

        match existing {
            Some(identity) if identity.has_password() => {
                Err(RegistrationError::EmailAlreadyRegistered {
                    email: email.as_submitted().to_owned(),
                })
            }
            Some(identity) => self.link(identity, submission).await,
            None => self.create(&email, submission).await,
        }
    }

    fn validate(
        &self,
        submission: &CredentialsSubmission,
    ) -> Result<EmailAddress, RegistrationError> {
        if submission.email().is_empty() || submission.password().is_empty() {
            return Err(RegistrationError::MissingCredentials);
        }

        let email =
            EmailAddress::parse(submission.email()).map_err(|_| RegistrationError::InvalidEmail)?;

        let strength = self.passwords.validate_strength(submission.password());
        if !strength.is_valid() {
            return Err(RegistrationError::WeakPassword {
                reasons: strength.errors().to_vec(),
            });
        }
        Ok(email)
    }

    async fn create(
        &self,
        email: &EmailAddress,
        submission: &CredentialsSubmission,
    ) -> Result<Registration, RegistrationError> {
        // Validated addresses always have a non-empty local part.
        let username = submission
            .requested_username()
            .map_or_else(|| Username::from_email(email), Username::new)
            .map_err(|_| RegistrationError::InvalidEmail)?;

        let taken = self
            .store
            .find_by_username(username.as_ref(), None)
            .await
            .map_err(|err| {
                RegistrationError::infrastructure(RegistrationStage::UsernameLookup, err)
            })?;
        if taken.is_some() {
            return Err(RegistrationError::UsernameTaken {
                username: username.into(),
            });
        }

        let password_hash = self.hash(submission.password()).await?;
        let attempted = username.to_string();
        let identity = self
            .store
            .create(NewIdentity::with_password(email, username, password_hash))
            .await
            .map_err(|err| match err {
                // Lost a race with a concurrent sign-up after the lookups.
                IdentityStoreError::UniqueViolation {
                    field: UniqueField::Username,
                } => RegistrationError::UsernameTaken {
                    username: attempted,
                },
                IdentityStoreError::UniqueViolation {
                    field: UniqueField::Email,
                } => RegistrationError::EmailAlreadyRegistered {
                    email: email.as_submitted().to_owned(),
                },
                other => RegistrationError::infrastructure(RegistrationStage::Create, other),
            })?;

        info!(user_id = %identity.id(), "created credentials identity");
        Ok(Registration::Created(identity))
    }

    async fn link(
        &self,
        mut identity: Identity,
        submission: &CredentialsSubmission,
    ) -> Result<Registration, RegistrationError> {
        let password_hash = self.hash(submission.password()).await?;
        let mut unrenamed = identity.clone();
        unrenamed.set_password_hash(password_hash.clone());

        if let Some(requested) = submission
            .requested_username()
            .filter(|requested| *requested != identity.username())
        {
            self.try_rename(&mut identity, requested).await?;
        }

        identity.set_password_hash(password_hash);
        let renamed = identity.username() != unrenamed.username();
        let saved = match self.store.save(&identity).await {
            Ok(saved) => saved,
            // The name was claimed between the lookup and the write.
            Err(IdentityStoreError::UniqueViolation {
                field: UniqueField::Username,
            }) if renamed => {
                warn!(
                    user_id = %identity.id(),
                    requested = %identity.username(),
                    "username claimed before save; keeping existing username while linking"
                );
                self.store.save(&unrenamed).await.map_err(|err| {
                    RegistrationError::infrastructure(RegistrationStage::Save, err)
                })?
            }
            Err(err) => {
                return Err(RegistrationError::infrastructure(
                    RegistrationStage::Save,
                    err,
                ));
            }
        };

        info!(user_id = %saved.id(), "linked credentials to third-party identity");
        Ok(Registration::Linked(saved))
    }

    /// Rename during linking is best effort: a taken username keeps the old
    /// one and linking carries on.
    async fn try_rename(
        &self,
        identity: &mut Identity,
        requested: &str,
    ) -> Result<(), RegistrationError> {
        let Ok(username) = Username::new(requested) else {
            return Ok(());
        };
        let holder = self
            .store
            .find_by_username(username.as_ref(), Some(identity.id()))
            .await
            .map_err(|err| {
                RegistrationError::infrastructure(RegistrationStage::UsernameLookup, err)
            })?;

        if holder.is_some() {
            warn!(
                user_id = %identity.id(),
                requested = %username,
                "username taken; keeping existing username while linking"
            );
            return Ok(());
        }
        identity.rename(username);
        Ok(())
    }

    async fn hash(&self, plaintext: &str) -> Result<String, RegistrationError> {
        self.passwords
            .hash(plaintext)
            .await
            .map_err(|err| RegistrationError::infrastructure(RegistrationStage::Hashing, err))
    }
}

#[async_trait]
impl<S, P> AccountRegistration for CredentialAccountCoordinator<S, P>
where
    S: IdentityStore,
    P: PasswordService,
{
    async fn create_credentials_user(&self, submission: &CredentialsSubmission) -> ActionResult {
        match self.register(submission).await {
            Ok(registration) => registration.into_action_result(submission),
            Err(err) => {
                match &err {
                    RegistrationError::Infrastructure { stage, detail } => {
                        error!(%stage, detail = %detail, "credentials registration failed");
                    }
                    refused => {
                        // The rendered reason echoes the submitted email.
                        info!(
                            category = refused.category(),
                            "credentials registration refused"
                        );
                    }
                }
                ActionResult::from(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "registration_service_tests.rs"]
mod tests;
