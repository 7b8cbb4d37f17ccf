use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

/// Process-local user store with the same uniqueness rules as the
/// `users` table. Backs tests and database-less local runs.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
        // a panic while holding the lock cannot leave a half-written user
        self.users.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn clashes(existing: &User, id: Uuid, username: &str, email: &str) -> bool {
    existing.id != id && (existing.email == email || existing.username == username)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.lock();
        let id = Uuid::new_v4();
        if users
            .iter()
            .any(|u| clashes(u, id, &new_user.username, &new_user.email))
        {
            return Err(StoreError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.lock();
        if users
            .iter()
            .any(|u| clashes(u, user.id, &user.username, &user.email))
        {
            return Err(StoreError::Duplicate);
        }
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| anyhow::anyhow!("user {} not found", user.id))?;
        *slot = User {
            updated_at: OffsetDateTime::now_utc(),
            ..user.clone()
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn create_then_find_by_email_and_id() {
        let store = MemoryUserStore::new();
        let created = store.create(new_user("alice", "a@x.com")).await.unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_id.username, "alice");
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_or_username() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "a@x.com")).await.unwrap();

        assert!(matches!(
            store.create(new_user("bob", "a@x.com")).await,
            Err(StoreError::Duplicate)
        ));
        assert!(matches!(
            store.create(new_user("alice", "b@x.com")).await,
            Err(StoreError::Duplicate)
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn save_overwrites_in_place() {
        let store = MemoryUserStore::new();
        let mut user = store.create(new_user("alice", "a@x.com")).await.unwrap();
        user.password_hash = "new-hash".into();
        store.save(&user).await.unwrap();

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        assert!(stored.updated_at >= stored.created_at);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn save_rejects_taking_another_users_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "a@x.com")).await.unwrap();
        let mut bob = store.create(new_user("bob", "b@x.com")).await.unwrap();
        bob.email = "a@x.com".into();
        assert!(matches!(store.save(&bob).await, Err(StoreError::Duplicate)));
    }
}
