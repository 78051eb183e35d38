use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CertificateRepository, CourseRepository};
use crate::shared::models::{Certificate, Course};

#[derive(Debug, Default)]
pub struct InMemoryCourseRepository {
    // Insertion order is kept so listings are stable
    courses: RwLock<Vec<Course>>,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn insert(&self, course: &Course) -> Result<()> {
        let mut courses = self.courses.write().await;
        if courses.iter().any(|c| c.id == course.id) {
            bail!("course {} already exists", course.id);
        }
        courses.push(course.clone());
        Ok(())
    }

    async fn update(&self, course: &Course) -> Result<()> {
        let mut courses = self.courses.write().await;
        match courses.iter_mut().find(|c| c.id == course.id) {
            Some(stored) => {
                *stored = course.clone();
                Ok(())
            }
            None => bail!("course {} does not exist", course.id),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Course>> {
        let courses = self.courses.read().await;
        Ok(courses.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Course>> {
        Ok(self.courses.read().await.clone())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCertificateRepository {
    certificates: RwLock<HashMap<String, Certificate>>,
}

impl InMemoryCertificateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateRepository for InMemoryCertificateRepository {
    async fn insert(&self, certificate: &Certificate) -> Result<()> {
        let mut certificates = self.certificates.write().await;
        if certificates.contains_key(&certificate.id) {
            bail!("certificate {} already exists", certificate.id);
        }
        certificates.insert(certificate.id.clone(), certificate.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Certificate>> {
        Ok(self.certificates.read().await.get(id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Certificate>> {
        let certificates = self.certificates.read().await;
        let mut owned: Vec<Certificate> = certificates
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.issued_at.cmp(&b.issued_at));
        Ok(owned)
    }
}
