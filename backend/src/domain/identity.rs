//! User identity records and their validated components.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

/// Validation errors for [`EmailAddress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailValidationError {
    Empty,
    InvalidFormat,
}

impl fmt::Display for EmailValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "email must not be empty"),
            Self::InvalidFormat => write!(f, "email must look like name@domain.tld"),
        }
    }
}

impl std::error::Error for EmailValidationError {}

/// Validation errors for [`Username`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameValidationError {
    Empty,
}

impl fmt::Display for UsernameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "username must not be empty"),
        }
    }
}

impl std::error::Error for UsernameValidationError {}

/// Stable identity identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityId(Uuid);

impl IdentityId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address as submitted, with its case-folded lookup key.
///
/// ## Invariants
/// - Matches `local@domain.tld` with no whitespace and exactly one `@`.
///
/// # Examples
/// ```
/// use rentals::domain::EmailAddress;
///
/// let email = EmailAddress::parse("Host@Example.com").unwrap();
/// assert_eq!(email.as_submitted(), "Host@Example.com");
/// assert_eq!(email.normalized(), "host@example.com");
/// assert_eq!(email.local_part(), "Host");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    submitted: String,
    normalized: String,
}

impl EmailAddress {
    /// Validate a submitted email address.
    pub fn parse(raw: impl Into<String>) -> Result<Self, EmailValidationError> {
        let submitted = raw.into();
        if submitted.is_empty() {
            return Err(EmailValidationError::Empty);
        }
        if !email_regex().is_match(&submitted) {
            return Err(EmailValidationError::InvalidFormat);
        }
        let normalized = submitted.to_lowercase();
        Ok(Self {
            submitted,
            normalized,
        })
    }

    /// The address exactly as the user typed it.
    pub fn as_submitted(&self) -> &str {
        self.submitted.as_str()
    }

    /// Lower-cased form used for storage and lookups.
    pub fn normalized(&self) -> &str {
        self.normalized.as_str()
    }

    /// Everything before the `@`, as submitted.
    pub fn local_part(&self) -> &str {
        self.submitted
            .split_once('@')
            .map_or(self.submitted.as_str(), |(local, _)| local)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_submitted())
    }
}

/// Public handle shown on listings and messages.
///
/// ## Invariants
/// - Trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate a username, trimming surrounding whitespace.
    pub fn new(raw: &str) -> Result<Self, UsernameValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UsernameValidationError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Derive a username from the part of an email before the `@`.
    pub fn from_email(email: &EmailAddress) -> Result<Self, UsernameValidationError> {
        Self::new(email.local_part())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// Fields for an identity that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    /// Lower-cased email address.
    pub email: String,
    /// Unique public handle.
    pub username: String,
    /// Password hash, absent for third-party-only accounts.
    pub password_hash: Option<String>,
    /// Avatar URL.
    pub image: Option<String>,
}

impl NewIdentity {
    /// Identity that signs in with email and password.
    pub fn with_password(email: &EmailAddress, username: Username, password_hash: String) -> Self {
        Self {
            email: email.normalized().to_owned(),
            username: username.into(),
            password_hash: Some(password_hash),
            image: None,
        }
    }

    /// Identity created through a third-party provider, with no password.
    pub fn third_party(email: &EmailAddress, username: Username, image: Option<String>) -> Self {
        Self {
            email: email.normalized().to_owned(),
            username: username.into(),
            password_hash: None,
            image,
        }
    }
}

/// Persisted user account.
///
/// ## Invariants
/// - `email` is stored lower-cased and is unique across identities.
/// - `username` is unique across identities.
/// - A missing `password_hash` means the account was created through a
///   third-party provider and cannot yet sign in with credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: IdentityId,
    email: String,
    username: String,
    password_hash: Option<String>,
    image: Option<String>,
}

impl Identity {
    /// Materialise a stored identity under the given identifier.
    pub fn from_new(id: IdentityId, fields: NewIdentity) -> Self {
        let NewIdentity {
            email,
            username,
            password_hash,
            image,
        } = fields;
        Self {
            id,
            email,
            username,
            password_hash,
            image,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> IdentityId {
        self.id
    }

    /// Lower-cased email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Public handle.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Stored password hash, if credentials sign-in is enabled.
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Avatar URL.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Whether the identity can sign in with email and password.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Enable credentials sign-in.
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = Some(password_hash);
    }

    /// Change the public handle.
    pub fn rename(&mut self, username: Username) {
        self.username = username.into();
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("newuser@example.com")]
    #[case("First.Last+tag@sub.example.co.uk")]
    fn accepts_well_formed_addresses(#[case] raw: &str) {
        let email = EmailAddress::parse(raw).expect("valid email");
        assert_eq!(email.as_submitted(), raw);
        assert_eq!(email.normalized(), raw.to_lowercase());
    }

    #[rstest]
    #[case("", EmailValidationError::Empty)]
    #[case("invalid-email", EmailValidationError::InvalidFormat)]
    #[case("no-tld@example", EmailValidationError::InvalidFormat)]
    #[case("two@@example.com", EmailValidationError::InvalidFormat)]
    #[case("spaced out@example.com", EmailValidationError::InvalidFormat)]
    #[case(" padded@example.com", EmailValidationError::InvalidFormat)]
    fn rejects_malformed_addresses(#[case] raw: &str, #[case] expected: EmailValidationError) {
        assert_eq!(EmailAddress::parse(raw), Err(expected));
    }

    #[rstest]
    fn username_is_derived_from_local_part() {
        let email = EmailAddress::parse("NewUser@Example.com").expect("valid email");
        let username = Username::from_email(&email).expect("non-empty local part");
        assert_eq!(username.as_ref(), "NewUser");
    }

    #[rstest]
    #[case("  host  ", Ok("host"))]
    #[case("   ", Err(UsernameValidationError::Empty))]
    #[case("", Err(UsernameValidationError::Empty))]
    fn usernames_are_trimmed(
        #[case] raw: &str,
        #[case] expected: Result<&str, UsernameValidationError>,
    ) {
        match (Username::new(raw), expected) {
            (Ok(username), Ok(want)) => assert_eq!(username.as_ref(), want),
            (Err(err), Err(want)) => assert_eq!(err, want),
            (got, want) => panic!("expected {want:?}, got {got:?}"),
        }
    }

    #[rstest]
    fn linking_a_password_mutates_in_place() {
        let email = EmailAddress::parse("guest@example.com").expect("valid email");
        let username = Username::new("guest").expect("valid username");
        let mut identity = Identity::from_new(
            IdentityId::random(),
            NewIdentity::third_party(&email, username, None),
        );
        assert!(!identity.has_password());

        identity.set_password_hash("$argon2id$stub".into());
        identity.rename(Username::new("guest2").expect("valid username"));

        assert_eq!(identity.password_hash(), Some("$argon2id$stub"));
        assert_eq!(identity.username(), "guest2");
        assert_eq!(identity.email(), "guest@example.com");
    }
}
