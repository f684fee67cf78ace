//! Argon2id `PasswordService` adapter.
//!
//! Hashes are produced in PHC string format with a fresh random salt. Hashing
//! is CPU bound, so it runs on the blocking pool rather than an async worker.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::config::RegistrationSettings;
use crate::domain::ports::{PasswordService, PasswordServiceError, PasswordStrength};

/// Rules a new password must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Fewest characters accepted.
    pub min_length: usize,
    /// Most characters accepted.
    pub max_length: usize,
    /// Require at least one letter and one digit.
    pub require_mixed_classes: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_mixed_classes: true,
        }
    }
}

impl PasswordPolicy {
    /// Check `plaintext` against every rule, reporting each one it breaks.
    pub fn check(&self, plaintext: &str) -> PasswordStrength {
        let length = plaintext.chars().count();
        let mut errors = Vec::new();
        if length < self.min_length {
            errors.push(format!(
                "Password must be at least {} characters long.",
                self.min_length
            ));
        }
        if length > self.max_length {
            errors.push(format!(
                "Password must be at most {} characters long.",
                self.max_length
            ));
        }
        if self.require_mixed_classes {
            let has_letter = plaintext.chars().any(char::is_alphabetic);
            let has_digit = plaintext.chars().any(|c| c.is_ascii_digit());
            if !(has_letter && has_digit) {
                errors.push("Password must contain at least one letter and one number.".to_owned());
            }
        }
        if errors.is_empty() {
            PasswordStrength::valid()
        } else {
            PasswordStrength::rejected(errors)
        }
    }
}

/// Argon2id hasher paired with a strength policy.
#[derive(Clone)]
pub struct Argon2PasswordService {
    hasher: Argon2<'static>,
    policy: PasswordPolicy,
}

impl Argon2PasswordService {
    /// Build the adapter from explicit Argon2 parameters.
    pub fn new(params: Params, policy: PasswordPolicy) -> Self {
        Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            policy,
        }
    }

    /// Build the adapter from loaded settings.
    ///
    /// # Errors
    /// Returns [`PasswordServiceError::Configuration`] when the cost
    /// parameters are outside what Argon2 accepts, or the length bounds are
    /// inverted.
    pub fn from_settings(settings: &RegistrationSettings) -> Result<Self, PasswordServiceError> {
        let policy = PasswordPolicy {
            min_length: settings.password_min_length(),
            max_length: settings.password_max_length(),
            require_mixed_classes: settings.require_mixed_classes,
        };
        if policy.min_length > policy.max_length {
            return Err(PasswordServiceError::configuration(format!(
                "password_min_length ({}) exceeds password_max_length ({})",
                policy.min_length, policy.max_length
            )));
        }
        let params = Params::new(
            settings.hash_memory_kib(),
            settings.hash_iterations(),
            settings.hash_parallelism(),
            None,
        )
        .map_err(|err| PasswordServiceError::configuration(err.to_string()))?;
        Ok(Self::new(params, policy))
    }

    /// Strength policy applied by [`PasswordService::validate_strength`].
    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Check `plaintext` against a stored PHC hash.
    ///
    /// # Errors
    /// Returns [`PasswordServiceError::Hashing`] when `stored` is not a valid
    /// PHC string or verification fails for a reason other than a mismatch.
    pub fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, PasswordServiceError> {
        let parsed =
            PasswordHash::new(stored).map_err(|err| PasswordServiceError::hashing(err.to_string()))?;
        match self.hasher.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordServiceError::hashing(err.to_string())),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self {
            hasher: Argon2::default(),
            policy: PasswordPolicy::default(),
        }
    }
}

#[async_trait]
impl PasswordService for Argon2PasswordService {
    async fn hash(&self, plaintext: &str) -> Result<String, PasswordServiceError> {
        let hasher = self.hasher.clone();
        let plaintext = Zeroizing::new(plaintext.to_owned());
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|err| PasswordServiceError::hashing(err.to_string()))
        })
        .await
        .map_err(|err| PasswordServiceError::hashing(format!("hashing task failed: {err}")))?
    }

    fn validate_strength(&self, plaintext: &str) -> PasswordStrength {
        self.policy.check(plaintext)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the Argon2 adapter and strength policy.
    use super::*;
    use rstest::{fixture, rstest};

    fn unset_settings() -> RegistrationSettings {
        RegistrationSettings {
            password_min_length: None,
            password_max_length: None,
            require_mixed_classes: true,
            hash_memory_kib: None,
            hash_iterations: None,
            hash_parallelism: None,
        }
    }

    #[fixture]
    fn service() -> Argon2PasswordService {
        let params = Params::new(8, 1, 1, None).expect("minimal params are valid");
        Argon2PasswordService::new(params, PasswordPolicy::default())
    }

    #[rstest]
    #[case("Secret123", &[])]
    #[case("abc1", &["Password must be at least 8 characters long."])]
    #[case("abcdefgh", &["Password must contain at least one letter and one number."])]
    #[case(
        "short",
        &[
            "Password must be at least 8 characters long.",
            "Password must contain at least one letter and one number.",
        ]
    )]
    fn policy_reports_every_broken_rule(#[case] password: &str, #[case] expected: &[&str]) {
        let strength = PasswordPolicy::default().check(password);

        assert_eq!(strength.errors(), expected);
        assert_eq!(strength.is_valid(), expected.is_empty());
    }

    #[rstest]
    fn policy_counts_characters_not_bytes() {
        let policy = PasswordPolicy {
            min_length: 4,
            max_length: 4,
            require_mixed_classes: false,
        };

        assert!(policy.check("ÿÿÿÿ").is_valid());
    }

    #[rstest]
    fn policy_rejects_overlong_passwords() {
        let policy = PasswordPolicy {
            max_length: 10,
            ..PasswordPolicy::default()
        };

        let strength = policy.check("abcdefghij1");

        assert_eq!(
            strength.errors().to_vec(),
            vec!["Password must be at most 10 characters long.".to_owned()]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn hash_produces_verifiable_phc_string(service: Argon2PasswordService) {
        let hash = service.hash("Secret123").await.expect("hashing succeeds");

        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "Secret123");
        assert!(service.verify("Secret123", &hash).expect("verify runs"));
        assert!(!service.verify("Secret124", &hash).expect("verify runs"));
    }

    #[rstest]
    #[tokio::test]
    async fn hashes_are_salted(service: Argon2PasswordService) {
        let first = service.hash("Secret123").await.expect("hashing succeeds");
        let second = service.hash("Secret123").await.expect("hashing succeeds");

        assert_ne!(first, second);
    }

    #[rstest]
    fn verify_rejects_malformed_hash(service: Argon2PasswordService) {
        let err = service
            .verify("Secret123", "not-a-phc-string")
            .expect_err("malformed hash is an error");

        assert!(matches!(err, PasswordServiceError::Hashing { .. }));
    }

    #[rstest]
    fn settings_with_invalid_costs_are_rejected() {
        let settings = RegistrationSettings {
            hash_parallelism: Some(0),
            ..unset_settings()
        };

        let result = Argon2PasswordService::from_settings(&settings);

        assert!(matches!(result, Err(PasswordServiceError::Configuration { .. })));
    }

    #[rstest]
    fn settings_with_inverted_lengths_are_rejected() {
        let settings = RegistrationSettings {
            password_min_length: Some(20),
            password_max_length: Some(10),
            ..unset_settings()
        };

        let result = Argon2PasswordService::from_settings(&settings);

        assert!(matches!(result, Err(PasswordServiceError::Configuration { .. })));
    }

    #[rstest]
    fn settings_carry_policy_through() {
        let settings = RegistrationSettings {
            password_min_length: Some(12),
            require_mixed_classes: false,
            ..unset_settings()
        };

        let service = Argon2PasswordService::from_settings(&settings).expect("valid settings");

        assert_eq!(service.policy().min_length, 12);
        assert!(!service.policy().require_mixed_classes);
    }
}
