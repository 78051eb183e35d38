use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::UserRepository;
use crate::shared::models::User;

#[derive(Debug, Default)]
struct Store {
    users_by_id: HashMap<String, User>,
    id_by_email: HashMap<String, String>,
    insertion_order: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    store: RwLock<Store>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut store = self.store.write().await;
        if store.users_by_id.contains_key(&user.id) {
            bail!("user {} already exists", user.id);
        }
        if store.id_by_email.contains_key(&user.email) {
            bail!("email {} already indexed", user.email);
        }

        store.id_by_email.insert(user.email.clone(), user.id.clone());
        store.insertion_order.push(user.id.clone());
        store.users_by_id.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut store = self.store.write().await;
        let Some(previous_email) = store.users_by_id.get(&user.id).map(|u| u.email.clone()) else {
            bail!("user {} does not exist", user.id);
        };

        if previous_email != user.email {
            if store.id_by_email.contains_key(&user.email) {
                bail!("email {} already indexed", user.email);
            }
            store.id_by_email.remove(&previous_email);
            store.id_by_email.insert(user.email.clone(), user.id.clone());
        }

        store.users_by_id.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users_by_id.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .id_by_email
            .get(&email.to_lowercase())
            .and_then(|id| store.users_by_id.get(id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let store = self.store.read().await;
        Ok(store
            .insertion_order
            .iter()
            .filter_map(|id| store.users_by_id.get(id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::UserRole;

    fn user(email: &str) -> User {
        User::new("Test", email, "hash".to_string(), UserRole::Student)
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let repository = InMemoryUserRepository::new();
        let ana = user("ana@lms.com");
        repository.insert(&ana).await.unwrap();

        assert_eq!(repository.find_by_id(&ana.id).await.unwrap().unwrap().email, "ana@lms.com");
        assert!(repository.find_by_email("ANA@lms.com").await.unwrap().is_some());
        assert!(repository.find_by_email("bob@lms.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_refused() {
        let repository = InMemoryUserRepository::new();
        repository.insert(&user("ana@lms.com")).await.unwrap();

        assert!(repository.insert(&user("ana@lms.com")).await.is_err());
        assert_eq!(repository.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_moves_email_index() {
        let repository = InMemoryUserRepository::new();
        let mut ana = user("ana@lms.com");
        repository.insert(&ana).await.unwrap();

        ana.email = "ana.maria@lms.com".to_string();
        repository.update(&ana).await.unwrap();

        assert!(repository.find_by_email("ana@lms.com").await.unwrap().is_none());
        assert_eq!(
            repository.find_by_email("ana.maria@lms.com").await.unwrap().unwrap().id,
            ana.id
        );
    }

    #[tokio::test]
    async fn test_update_unknown_user_fails() {
        let repository = InMemoryUserRepository::new();
        assert!(repository.update(&user("ghost@lms.com")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let repository = InMemoryUserRepository::new();
        let emails = ["c@lms.com", "a@lms.com", "b@lms.com"];
        for email in emails {
            repository.insert(&user(email)).await.unwrap();
        }

        let listed: Vec<String> = repository
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.email)
            .collect();
        assert_eq!(listed, emails);
    }
}
