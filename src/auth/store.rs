use std::time::SystemTime;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: SystemTime,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    Duplicate,
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// User records keyed by id with unique emails.
pub trait UserStore: Send + Sync + 'static {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Create a user. Fails with [`StoreError::Duplicate`] if the email exists.
    fn insert(&self, email: &str, password_hash: String) -> Result<UserRecord, StoreError>;
}

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, UserRecord>,
    ids_by_email: DashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let Some(id) = self.ids_by_email.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(id).map(|user| user.clone()))
    }

    fn insert(&self, email: &str, password_hash: String) -> Result<UserRecord, StoreError> {
        match self.ids_by_email.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let user = UserRecord {
                    id: Uuid::new_v4().simple().to_string(),
                    email: email.to_string(),
                    password_hash,
                    created_at: SystemTime::now(),
                };
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_lookup_by_email_and_id() {
        let store = InMemoryUserStore::new();
        let user = store.insert("a@example.com", "hash".into()).unwrap();

        let by_email = store.find_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        let by_id = store.find_by_id(&user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");
        assert!(store.find_by_email("b@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_emails_are_rejected() {
        let store = InMemoryUserStore::new();
        store.insert("a@example.com", "h1".into()).unwrap();
        assert!(matches!(
            store.insert("a@example.com", "h2".into()),
            Err(StoreError::Duplicate)
        ));
        let kept = store.find_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(kept.password_hash, "h1");
    }
}
