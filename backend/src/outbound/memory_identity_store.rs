//! In-memory `IdentityStore` adapter.
//!
//! Holds identities in a single mutex-guarded vector. Uniqueness of email and
//! username is checked and the write applied under one lock acquisition, so
//! two concurrent sign-ups for the same address cannot both succeed.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{IdentityStore, IdentityStoreError, UniqueField};
use crate::domain::{Identity, IdentityId, NewIdentity};

/// Process-local identity store.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: Mutex<Vec<Identity>>,
}

impl InMemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with existing identities.
    ///
    /// Later entries that clash with earlier ones on email or username are
    /// dropped.
    pub fn with_identities(identities: impl IntoIterator<Item = Identity>) -> Self {
        let mut accepted: Vec<Identity> = Vec::new();
        for identity in identities {
            if conflict(&accepted, identity.email(), identity.username(), None).is_none() {
                accepted.push(identity);
            }
        }
        Self {
            identities: Mutex::new(accepted),
        }
    }

    /// Number of stored identities.
    pub async fn len(&self) -> usize {
        self.identities.lock().await.len()
    }

    /// Whether the store holds no identities.
    pub async fn is_empty(&self) -> bool {
        self.identities.lock().await.is_empty()
    }
}

fn conflict(
    identities: &[Identity],
    email: &str,
    username: &str,
    excluding: Option<IdentityId>,
) -> Option<UniqueField> {
    identities
        .iter()
        .filter(|existing| Some(existing.id()) != excluding)
        .find_map(|existing| {
            if existing.email() == email {
                Some(UniqueField::Email)
            } else if existing.username() == username {
                Some(UniqueField::Username)
            } else {
                None
            }
        })
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityStoreError> {
        let identities = self.identities.lock().await;
        Ok(identities
            .iter()
            .find(|identity| identity.email() == email)
            .cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
        excluding: Option<IdentityId>,
    ) -> Result<Option<Identity>, IdentityStoreError> {
        let identities = self.identities.lock().await;
        Ok(identities
            .iter()
            .filter(|identity| Some(identity.id()) != excluding)
            .find(|identity| identity.username() == username)
            .cloned())
    }

    async fn create(&self, identity: NewIdentity) -> Result<Identity, IdentityStoreError> {
        let mut identities = self.identities.lock().await;
        if let Some(field) = conflict(&identities, &identity.email, &identity.username, None) {
            return Err(IdentityStoreError::unique_violation(field));
        }
        let created = Identity::from_new(IdentityId::random(), identity);
        identities.push(created.clone());
        Ok(created)
    }

    async fn save(&self, identity: &Identity) -> Result<Identity, IdentityStoreError> {
        let mut identities = self.identities.lock().await;
        if let Some(field) = conflict(
            &identities,
            identity.email(),
            identity.username(),
            Some(identity.id()),
        ) {
            return Err(IdentityStoreError::unique_violation(field));
        }
        let slot = identities
            .iter_mut()
            .find(|existing| existing.id() == identity.id())
            .ok_or_else(|| {
                IdentityStoreError::query(format!("identity {} does not exist", identity.id()))
            })?;
        *slot = identity.clone();
        Ok(identity.clone())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for uniqueness enforcement.
    use super::*;
    use crate::domain::{EmailAddress, Username};
    use rstest::{fixture, rstest};

    fn new_identity(email: &str, username: &str) -> NewIdentity {
        let email = EmailAddress::parse(email).expect("valid email");
        let username = Username::new(username).expect("valid username");
        NewIdentity::with_password(&email, username, "$argon2id$hash".into())
    }

    #[fixture]
    fn store() -> InMemoryIdentityStore {
        InMemoryIdentityStore::new()
    }

    #[rstest]
    #[tokio::test]
    async fn created_identity_can_be_found(store: InMemoryIdentityStore) {
        let created = store
            .create(new_identity("Guest@Example.com", "guest"))
            .await
            .expect("create succeeds");

        let by_email = store
            .find_by_email("guest@example.com")
            .await
            .expect("lookup succeeds");
        let by_username = store
            .find_by_username("guest", None)
            .await
            .expect("lookup succeeds");

        assert_eq!(by_email.as_ref(), Some(&created));
        assert_eq!(by_username.as_ref(), Some(&created));
        assert_eq!(store.len().await, 1);
    }

    #[rstest]
    #[case("guest@example.com", "other", UniqueField::Email)]
    #[case("other@example.com", "guest", UniqueField::Username)]
    #[tokio::test]
    async fn create_rejects_duplicates(
        store: InMemoryIdentityStore,
        #[case] email: &str,
        #[case] username: &str,
        #[case] field: UniqueField,
    ) {
        store
            .create(new_identity("guest@example.com", "guest"))
            .await
            .expect("first create succeeds");

        let err = store
            .create(new_identity(email, username))
            .await
            .expect_err("duplicate is rejected");

        assert_eq!(err, IdentityStoreError::unique_violation(field));
        assert_eq!(store.len().await, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn username_lookup_skips_excluded_identity(store: InMemoryIdentityStore) {
        let created = store
            .create(new_identity("guest@example.com", "guest"))
            .await
            .expect("create succeeds");

        let found = store
            .find_by_username("guest", Some(created.id()))
            .await
            .expect("lookup succeeds");

        assert!(found.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn save_persists_in_place_changes(store: InMemoryIdentityStore) {
        let mut identity = store
            .create(new_identity("guest@example.com", "guest"))
            .await
            .expect("create succeeds");
        identity.rename(Username::new("host").expect("valid username"));

        store.save(&identity).await.expect("save succeeds");

        let stored = store
            .find_by_email("guest@example.com")
            .await
            .expect("lookup succeeds")
            .expect("identity exists");
        assert_eq!(stored.username(), "host");
    }

    #[rstest]
    #[tokio::test]
    async fn save_rejects_rename_onto_taken_username(store: InMemoryIdentityStore) {
        store
            .create(new_identity("host@example.com", "host"))
            .await
            .expect("create succeeds");
        let mut identity = store
            .create(new_identity("guest@example.com", "guest"))
            .await
            .expect("create succeeds");
        identity.rename(Username::new("host").expect("valid username"));

        let err = store.save(&identity).await.expect_err("clash is rejected");

        assert_eq!(err, IdentityStoreError::unique_violation(UniqueField::Username));
    }

    #[rstest]
    #[tokio::test]
    async fn save_of_unknown_identity_is_a_query_error(store: InMemoryIdentityStore) {
        let stray = Identity::from_new(
            IdentityId::random(),
            new_identity("stray@example.com", "stray"),
        );

        let err = store.save(&stray).await.expect_err("unknown id is rejected");

        assert!(matches!(err, IdentityStoreError::Query { .. }));
        assert!(store.is_empty().await);
    }

    #[rstest]
    #[tokio::test]
    async fn seeding_drops_clashing_entries() {
        let first = Identity::from_new(
            IdentityId::random(),
            new_identity("guest@example.com", "guest"),
        );
        let clash = Identity::from_new(
            IdentityId::random(),
            new_identity("guest@example.com", "other"),
        );

        let store = InMemoryIdentityStore::with_identities([first, clash]);

        assert_eq!(store.len().await, 1);
    }
}
