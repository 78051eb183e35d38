mod memory;
mod mongo;

pub use memory::InMemoryUserRepository;
pub use mongo::MongoUserRepository;

use anyhow::Result;
use async_trait::async_trait;

use crate::shared::models::User;

/// Storage for user records. Emails are stored and looked up lowercase.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<()>;

    /// Replaces the stored record with the same id.
    async fn update(&self, user: &User) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn list(&self) -> Result<Vec<User>>;
}
