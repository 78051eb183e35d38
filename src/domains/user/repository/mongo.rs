use anyhow::{Context, Result};
use async_trait::async_trait;
use bson::doc;
use futures::TryStreamExt;
use mongodb::{options::IndexOptions, Collection, Database, IndexModel};

use super::UserRepository;
use crate::shared::models::User;

const COLLECTION: &str = "users";

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(COLLECTION),
        }
    }

    /// Creates the unique email index backing duplicate-email checks.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection
            .create_index(index)
            .await
            .context("Failed to create unique email index")?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        self.collection
            .insert_one(user)
            .await
            .with_context(|| format!("Failed to insert user {}", user.id))?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let result = self
            .collection
            .replace_one(doc! { "_id": user.id.as_str() }, user)
            .await
            .with_context(|| format!("Failed to update user {}", user.id))?;

        if result.matched_count == 0 {
            anyhow::bail!("user {} does not exist", user.id);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .with_context(|| format!("Failed to load user {}", id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.collection
            .find_one(doc! { "email": email.to_lowercase() })
            .await
            .context("Failed to look up user by email")
    }

    async fn list(&self) -> Result<Vec<User>> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .context("Failed to list users")?;

        let mut users: Vec<User> = cursor.try_collect().await.context("Failed to read users")?;
        users.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(users)
    }
}
