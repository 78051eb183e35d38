use anyhow::{Context, Result};
use async_trait::async_trait;
use bson::doc;
use futures::TryStreamExt;
use mongodb::{Collection, Database};

use super::{CertificateRepository, CourseRepository};
use crate::shared::models::{Certificate, Course};

pub struct MongoCourseRepository {
    collection: Collection<Course>,
}

impl MongoCourseRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection("courses"),
        }
    }
}

#[async_trait]
impl CourseRepository for MongoCourseRepository {
    async fn insert(&self, course: &Course) -> Result<()> {
        self.collection
            .insert_one(course)
            .await
            .with_context(|| format!("Failed to insert course {}", course.id))?;
        Ok(())
    }

    async fn update(&self, course: &Course) -> Result<()> {
        let result = self
            .collection
            .replace_one(doc! { "_id": course.id.as_str() }, course)
            .await
            .with_context(|| format!("Failed to update course {}", course.id))?;

        if result.matched_count == 0 {
            anyhow::bail!("course {} does not exist", course.id);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Course>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .with_context(|| format!("Failed to load course {}", id))
    }

    async fn list(&self) -> Result<Vec<Course>> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .context("Failed to list courses")?;

        let mut courses: Vec<Course> =
            cursor.try_collect().await.context("Failed to read courses")?;
        courses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(courses)
    }
}

pub struct MongoCertificateRepository {
    collection: Collection<Certificate>,
}

impl MongoCertificateRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection("certificates"),
        }
    }
}

#[async_trait]
impl CertificateRepository for MongoCertificateRepository {
    async fn insert(&self, certificate: &Certificate) -> Result<()> {
        self.collection
            .insert_one(certificate)
            .await
            .with_context(|| format!("Failed to insert certificate {}", certificate.id))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Certificate>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .with_context(|| format!("Failed to load certificate {}", id))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Certificate>> {
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id })
            .await
            .context("Failed to list certificates")?;

        let mut certificates: Vec<Certificate> =
            cursor.try_collect().await.context("Failed to read certificates")?;
        certificates.sort_by(|a, b| a.issued_at.cmp(&b.issued_at));
        Ok(certificates)
    }
}
