//! Registration configuration loaded via OrthoConfig.

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;
const DEFAULT_PASSWORD_MAX_LENGTH: usize = 128;
const DEFAULT_HASH_MEMORY_KIB: u32 = 19_456;
const DEFAULT_HASH_ITERATIONS: u32 = 2;
const DEFAULT_HASH_PARALLELISM: u32 = 1;

/// Password policy and hashing cost for credentials registration.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RENTALS")]
pub struct RegistrationSettings {
    /// Fewest characters a new password may have.
    pub password_min_length: Option<usize>,
    /// Most characters a new password may have.
    pub password_max_length: Option<usize>,
    /// Require at least one letter and one digit.
    #[ortho_config(default = true)]
    pub require_mixed_classes: bool,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: Option<u32>,
    /// Argon2 iteration count.
    pub hash_iterations: Option<u32>,
    /// Argon2 lanes.
    pub hash_parallelism: Option<u32>,
}

impl RegistrationSettings {
    /// Return the minimum password length, falling back to the default.
    pub fn password_min_length(&self) -> usize {
        self.password_min_length
            .unwrap_or(DEFAULT_PASSWORD_MIN_LENGTH)
    }

    /// Return the maximum password length, falling back to the default.
    pub fn password_max_length(&self) -> usize {
        self.password_max_length
            .unwrap_or(DEFAULT_PASSWORD_MAX_LENGTH)
    }

    /// Return the Argon2 memory cost, falling back to the default.
    pub fn hash_memory_kib(&self) -> u32 {
        self.hash_memory_kib.unwrap_or(DEFAULT_HASH_MEMORY_KIB)
    }

    /// Return the Argon2 iteration count, falling back to the default.
    pub fn hash_iterations(&self) -> u32 {
        self.hash_iterations.unwrap_or(DEFAULT_HASH_ITERATIONS)
    }

    /// Return the Argon2 lane count, falling back to the default.
    pub fn hash_parallelism(&self) -> u32 {
        self.hash_parallelism.unwrap_or(DEFAULT_HASH_PARALLELISM)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for registration configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use crate::outbound::Argon2PasswordService;

    const KEYS: [&str; 6] = [
        "RENTALS_PASSWORD_MIN_LENGTH",
        "RENTALS_PASSWORD_MAX_LENGTH",
        "RENTALS_REQUIRE_MIXED_CLASSES",
        "RENTALS_HASH_MEMORY_KIB",
        "RENTALS_HASH_ITERATIONS",
        "RENTALS_HASH_PARALLELISM",
    ];

    fn load_from_empty_args() -> RegistrationSettings {
        RegistrationSettings::load_from_iter([OsString::from("rentals-actions")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.password_min_length(), DEFAULT_PASSWORD_MIN_LENGTH);
        assert_eq!(settings.password_max_length(), DEFAULT_PASSWORD_MAX_LENGTH);
        assert!(settings.require_mixed_classes);
        assert_eq!(settings.hash_memory_kib(), DEFAULT_HASH_MEMORY_KIB);
        assert_eq!(settings.hash_iterations(), DEFAULT_HASH_ITERATIONS);
        assert_eq!(settings.hash_parallelism(), DEFAULT_HASH_PARALLELISM);
    }

    #[rstest]
    fn default_policy_rejects_letters_only_passwords() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let service = Argon2PasswordService::from_settings(&load_from_empty_args())
            .expect("default settings build a service");
        let strength = service.policy().check("abcdefgh");
        assert!(!strength.is_valid());
        assert_eq!(
            strength.errors(),
            ["Password must contain at least one letter and one number."]
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("RENTALS_PASSWORD_MIN_LENGTH", Some("12".to_owned())),
            ("RENTALS_PASSWORD_MAX_LENGTH", Some("64".to_owned())),
            ("RENTALS_REQUIRE_MIXED_CLASSES", Some("false".to_owned())),
            ("RENTALS_HASH_MEMORY_KIB", Some("4096".to_owned())),
            ("RENTALS_HASH_ITERATIONS", Some("3".to_owned())),
            ("RENTALS_HASH_PARALLELISM", Some("2".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.password_min_length(), 12);
        assert_eq!(settings.password_max_length(), 64);
        assert!(!settings.require_mixed_classes);
        assert_eq!(settings.hash_memory_kib(), 4096);
        assert_eq!(settings.hash_iterations(), 3);
        assert_eq!(settings.hash_parallelism(), 2);
    }
}
