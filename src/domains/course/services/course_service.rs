use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domains::course::errors::CourseError;
use crate::domains::course::repository::{CertificateRepository, CourseRepository};
use crate::domains::user::repository::UserRepository;
use crate::shared::models::course::COMPLETE;
use crate::shared::models::{Certificate, Course, User};
use crate::shared::utils::validation::non_blank;
use crate::system::config::CourseConfig;

/// Outcome of a progress update. `certificate` is set only on the update
/// that completed the course.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub course_id: String,
    pub user_id: String,
    pub progress: f64,
    pub certificate: Option<Certificate>,
}

/// The course catalog: courses, enrollments, progress and certificates.
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    certificates: Arc<dyn CertificateRepository>,
    users: Arc<dyn UserRepository>,
    settings: CourseConfig,
    write_lock: Mutex<()>,
}

impl CourseService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        certificates: Arc<dyn CertificateRepository>,
        users: Arc<dyn UserRepository>,
        settings: CourseConfig,
    ) -> Self {
        Self {
            courses,
            certificates,
            users,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    pub fn certificate_base_url(&self) -> &str {
        &self.settings.certificate_base_url
    }

    pub async fn create_course(
        &self,
        instructor_id: &str,
        title: &str,
        price: f64,
    ) -> Result<Course, CourseError> {
        let instructor = self.users.find_by_id(instructor_id).await?;
        match instructor {
            Some(user) if user.is_active && user.role.can_author_courses() => {}
            _ => {
                return Err(CourseError::AccessDenied(
                    "only active teachers and specialists can create courses".to_string(),
                ));
            }
        }

        let title = non_blank(title)
            .ok_or_else(|| CourseError::Validation("title must not be empty".to_string()))?;
        if !price.is_finite() || price < 0.0 {
            return Err(CourseError::Validation(format!(
                "price must be a non-negative number, got {}",
                price
            )));
        }

        let course = Course::new(title, instructor_id, price);
        self.courses.insert(&course).await?;

        info!(course_id = %course.id, instructor_id, price, "course created");
        Ok(course)
    }

    /// Appends one module to an unpublished course.
    pub async fn add_content(
        &self,
        actor_id: &str,
        course_id: &str,
        module_title: &str,
        lessons: Vec<String>,
    ) -> Result<Course, CourseError> {
        let _guard = self.write_lock.lock().await;
        let mut course = self.get_course(course_id).await?;
        self.ensure_manager(actor_id, &course).await?;

        if course.published {
            return Err(CourseError::AlreadyPublished);
        }

        let module_title = non_blank(module_title).ok_or_else(|| {
            CourseError::Validation("module title must not be empty".to_string())
        })?;
        let lessons: Vec<String> = lessons
            .iter()
            .filter_map(|lesson| non_blank(lesson))
            .map(str::to_string)
            .collect();

        course.add_module(module_title, lessons);
        self.courses.update(&course).await?;

        debug!(
            course_id = %course.id,
            modules = course.modules.len(),
            lessons = course.total_lessons(),
            "module added"
        );
        Ok(course)
    }

    pub async fn publish(&self, actor_id: &str, course_id: &str) -> Result<Course, CourseError> {
        let _guard = self.write_lock.lock().await;
        let mut course = self.get_course(course_id).await?;
        self.ensure_manager(actor_id, &course).await?;

        if course.published {
            return Ok(course);
        }

        let required = self.settings.min_lessons_to_publish;
        let found = course.total_lessons();
        if found < required {
            return Err(CourseError::InvalidPublication { required, found });
        }

        course.published = true;
        self.courses.update(&course).await?;

        info!(course_id = %course.id, lessons = found, "course published");
        Ok(course)
    }

    pub async fn enroll(
        &self,
        course_id: &str,
        user_id: &str,
        payment_confirmed: bool,
    ) -> Result<Course, CourseError> {
        let _guard = self.write_lock.lock().await;
        let mut course = self.get_course(course_id).await?;

        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_active => {}
            _ => return Err(CourseError::UserNotFound(user_id.to_string())),
        }

        if !course.published {
            return Err(CourseError::NotPublished);
        }
        if course.is_enrolled(user_id) {
            return Err(CourseError::AlreadyEnrolled);
        }
        if !course.is_free() && !payment_confirmed {
            return Err(CourseError::PaymentRequired {
                price: course.price,
            });
        }

        course.enroll(user_id);
        self.courses.update(&course).await?;

        info!(course_id = %course.id, user_id, "user enrolled");
        Ok(course)
    }

    /// Stores `min(percent, 100)` and issues a certificate on the update
    /// that crosses into completion.
    pub async fn update_progress(
        &self,
        course_id: &str,
        user_id: &str,
        percent: f64,
    ) -> Result<ProgressUpdate, CourseError> {
        if !percent.is_finite() || percent < 0.0 {
            return Err(CourseError::Validation(format!(
                "progress must be a non-negative number, got {}",
                percent
            )));
        }

        let _guard = self.write_lock.lock().await;
        let mut course = self.get_course(course_id).await?;
        let previous = course.progress_of(user_id).ok_or(CourseError::NotEnrolled)?;

        let progress = percent.min(COMPLETE);

        // Certificate first: a failed write must leave progress below completion
        let certificate = if previous < COMPLETE && progress >= COMPLETE {
            Some(self.issue_certificate(&course.id, user_id).await?)
        } else {
            None
        };

        course.progress.insert(user_id.to_string(), progress);
        self.courses.update(&course).await?;

        debug!(course_id = %course.id, user_id, progress, "progress updated");
        Ok(ProgressUpdate {
            course_id: course.id,
            user_id: user_id.to_string(),
            progress,
            certificate,
        })
    }

    pub async fn get_course(&self, id: &str) -> Result<Course, CourseError> {
        self.courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| CourseError::CourseNotFound(id.to_string()))
    }

    /// Published courses only. Unpublished ones are reported as missing to
    /// anyone who cannot manage them.
    pub async fn get_course_for(
        &self,
        id: &str,
        viewer: Option<&User>,
    ) -> Result<Course, CourseError> {
        let course = self.get_course(id).await?;
        if course.published || viewer.is_some_and(|user| course.is_managed_by(user)) {
            Ok(course)
        } else {
            Err(CourseError::CourseNotFound(id.to_string()))
        }
    }

    pub async fn list_published(&self) -> Result<Vec<Course>, CourseError> {
        let courses = self.courses.list().await?;
        Ok(courses.into_iter().filter(|c| c.published).collect())
    }

    pub async fn list_by_instructor(&self, instructor_id: &str) -> Result<Vec<Course>, CourseError> {
        let courses = self.courses.list().await?;
        Ok(courses
            .into_iter()
            .filter(|c| c.instructor_id == instructor_id)
            .collect())
    }

    pub async fn get_certificate(&self, id: &str) -> Result<Certificate, CourseError> {
        self.certificates
            .find_by_id(id)
            .await?
            .ok_or_else(|| CourseError::CertificateNotFound(id.to_string()))
    }

    pub async fn list_certificates_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Certificate>, CourseError> {
        Ok(self.certificates.list_for_user(user_id).await?)
    }

    /// Reuses a certificate left behind by an earlier attempt whose progress
    /// write failed.
    async fn issue_certificate(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Certificate, CourseError> {
        let existing = self
            .certificates
            .list_for_user(user_id)
            .await?
            .into_iter()
            .find(|certificate| certificate.course_id == course_id);
        if let Some(certificate) = existing {
            warn!(course_id, user_id, certificate_id = %certificate.id, "certificate already issued");
            return Ok(certificate);
        }

        let certificate = Certificate::new(user_id, course_id);
        self.certificates.insert(&certificate).await?;
        info!(course_id, user_id, certificate_id = %certificate.id, "certificate issued");
        Ok(certificate)
    }

    async fn ensure_manager(&self, actor_id: &str, course: &Course) -> Result<(), CourseError> {
        let actor = self.users.find_by_id(actor_id).await?;
        match actor {
            Some(user) if user.is_active && course.is_managed_by(&user) => Ok(()),
            _ => Err(CourseError::AccessDenied(
                "only the course instructor or an administrator can manage this course"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domains::course::repository::{
        InMemoryCertificateRepository, InMemoryCourseRepository,
    };
    use crate::domains::user::repository::InMemoryUserRepository;
    use crate::shared::models::UserRole;
    use crate::shared::testing::Gate;
    use crate::system::config::AppConfig;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixture {
        service: CourseService,
        users: Arc<InMemoryUserRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with(
                Arc::new(InMemoryCourseRepository::new()),
                Arc::new(InMemoryCertificateRepository::new()),
            )
        }

        fn with(
            courses: Arc<dyn CourseRepository>,
            certificates: Arc<dyn CertificateRepository>,
        ) -> Self {
            let users = Arc::new(InMemoryUserRepository::new());
            let service = CourseService::new(
                courses,
                certificates,
                users.clone(),
                AppConfig::for_tests().courses,
            );
            Self { service, users }
        }

        async fn user(&self, name: &str, role: UserRole) -> User {
            let email = format!("{}@lms.com", name.to_lowercase());
            let user = User::new(name, &email, "hash".to_string(), role);
            self.users.insert(&user).await.unwrap();
            user
        }

        /// A published course with three lessons.
        async fn published_course(&self, instructor: &User, price: f64) -> Course {
            let course = self
                .service
                .create_course(&instructor.id, "Rust 101", price)
                .await
                .unwrap();
            self.service
                .add_content(
                    &instructor.id,
                    &course.id,
                    "Basics",
                    vec!["Ownership".into(), "Borrowing".into(), "Lifetimes".into()],
                )
                .await
                .unwrap();
            self.service.publish(&instructor.id, &course.id).await.unwrap()
        }
    }

    /// Course storage whose next `update` can be made to fail, and whose
    /// next lookup can be held at a gate.
    #[derive(Default)]
    struct TestCourses {
        inner: InMemoryCourseRepository,
        fail_next_update: AtomicBool,
        gate: Gate,
    }

    #[async_trait]
    impl CourseRepository for TestCourses {
        async fn insert(&self, course: &Course) -> anyhow::Result<()> {
            self.inner.insert(course).await
        }

        async fn update(&self, course: &Course) -> anyhow::Result<()> {
            if self.fail_next_update.swap(false, Ordering::SeqCst) {
                bail!("course store unavailable");
            }
            self.inner.update(course).await
        }

        async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Course>> {
            let found = self.inner.find_by_id(id).await;
            self.gate.pass().await;
            found
        }

        async fn list(&self) -> anyhow::Result<Vec<Course>> {
            self.inner.list().await
        }
    }

    #[derive(Default)]
    struct FlakyCertificates {
        inner: InMemoryCertificateRepository,
        fail_next_insert: AtomicBool,
    }

    #[async_trait]
    impl CertificateRepository for FlakyCertificates {
        async fn insert(&self, certificate: &Certificate) -> anyhow::Result<()> {
            if self.fail_next_insert.swap(false, Ordering::SeqCst) {
                bail!("certificate store unavailable");
            }
            self.inner.insert(certificate).await
        }

        async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Certificate>> {
            self.inner.find_by_id(id).await
        }

        async fn list_for_user(&self, user_id: &str) -> anyhow::Result<Vec<Certificate>> {
            self.inner.list_for_user(user_id).await
        }
    }

    #[tokio::test]
    async fn test_failed_certificate_write_can_be_retried() {
        let certificates = Arc::new(FlakyCertificates::default());
        let fixture = Fixture::with(Arc::new(InMemoryCourseRepository::new()), certificates.clone());
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let student = fixture.user("Ana", UserRole::Student).await;
        let course = fixture.published_course(&teacher, 0.0).await;
        fixture.service.enroll(&course.id, &student.id, false).await.unwrap();

        certificates.fail_next_insert.store(true, Ordering::SeqCst);
        assert!(matches!(
            fixture.service.update_progress(&course.id, &student.id, 100.0).await,
            Err(CourseError::Storage(_))
        ));
        assert_eq!(
            fixture.service.get_course(&course.id).await.unwrap().progress_of(&student.id),
            Some(0.0)
        );

        let retry = fixture.service.update_progress(&course.id, &student.id, 100.0).await.unwrap();
        assert!(retry.certificate.is_some());
        assert_eq!(fixture.service.list_certificates_for_user(&student.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_progress_write_reuses_certificate() {
        let courses = Arc::new(TestCourses::default());
        let fixture = Fixture::with(courses.clone(), Arc::new(InMemoryCertificateRepository::new()));
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let student = fixture.user("Ana", UserRole::Student).await;
        let course = fixture.published_course(&teacher, 0.0).await;
        fixture.service.enroll(&course.id, &student.id, false).await.unwrap();

        courses.fail_next_update.store(true, Ordering::SeqCst);
        assert!(fixture.service.update_progress(&course.id, &student.id, 100.0).await.is_err());

        let retry = fixture.service.update_progress(&course.id, &student.id, 100.0).await.unwrap();
        let issued = fixture.service.list_certificates_for_user(&student.id).await.unwrap();
        assert_eq!(issued.len(), 1);
        assert_eq!(retry.certificate.unwrap().id, issued[0].id);
    }

    #[tokio::test]
    async fn test_concurrent_enrollment_is_serialized() {
        let courses = Arc::new(TestCourses::default());
        let fixture = Fixture::with(courses.clone(), Arc::new(InMemoryCertificateRepository::new()));
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let student = fixture.user("Ana", UserRole::Student).await;
        let course = fixture.published_course(&teacher, 0.0).await;

        courses.gate.arm();
        let (first, second, _) = tokio::join!(
            fixture.service.enroll(&course.id, &student.id, false),
            fixture.service.enroll(&course.id, &student.id, false),
            async {
                courses.gate.wait_until_held().await;
                tokio::task::yield_now().await;
                courses.gate.open();
            }
        );

        let rejected = [&first, &second]
            .iter()
            .filter(|result| matches!(result, Err(CourseError::AlreadyEnrolled)))
            .count();
        assert_eq!(rejected, 1);
        assert!(first.is_ok() || second.is_ok());
        assert_eq!(fixture.service.get_course(&course.id).await.unwrap().enrolled.len(), 1);
    }

    #[tokio::test]
    async fn test_create_course_requires_author_role() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let specialist = fixture.user("Sue", UserRole::Specialist).await;
        let student = fixture.user("Ana", UserRole::Student).await;

        let course = fixture.service.create_course(&teacher.id, " Rust 101 ", 0.0).await.unwrap();
        assert_eq!(course.title, "Rust 101");
        assert!(!course.published);
        assert!(fixture.service.create_course(&specialist.id, "Data", 25.0).await.is_ok());

        assert!(matches!(
            fixture.service.create_course(&student.id, "Nope", 0.0).await,
            Err(CourseError::AccessDenied(_))
        ));
        assert!(matches!(
            fixture.service.create_course("missing", "Nope", 0.0).await,
            Err(CourseError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_create_course_validation() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;

        for (title, price) in [("  ", 0.0), ("Rust", -1.0), ("Rust", f64::NAN), ("Rust", f64::INFINITY)] {
            assert!(matches!(
                fixture.service.create_course(&teacher.id, title, price).await,
                Err(CourseError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_add_content_permissions_and_freeze() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let other = fixture.user("Max", UserRole::Teacher).await;
        let admin = fixture.user("Root", UserRole::Admin).await;
        let course = fixture.service.create_course(&teacher.id, "Rust 101", 0.0).await.unwrap();

        assert!(matches!(
            fixture.service.add_content(&other.id, &course.id, "Basics", vec![]).await,
            Err(CourseError::AccessDenied(_))
        ));
        assert!(matches!(
            fixture.service.add_content(&teacher.id, &course.id, " ", vec![]).await,
            Err(CourseError::Validation(_))
        ));
        assert!(matches!(
            fixture.service.add_content(&teacher.id, "missing", "Basics", vec![]).await,
            Err(CourseError::CourseNotFound(_))
        ));

        let updated = fixture
            .service
            .add_content(&admin.id, &course.id, "Basics", vec!["One".into(), " ".into()])
            .await
            .unwrap();
        assert_eq!(updated.total_lessons(), 1);

        let published = fixture.published_course(&teacher, 0.0).await;
        assert!(matches!(
            fixture.service.add_content(&teacher.id, &published.id, "More", vec![]).await,
            Err(CourseError::AlreadyPublished)
        ));
    }

    #[tokio::test]
    async fn test_publish_requires_minimum_lessons() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let course = fixture.service.create_course(&teacher.id, "Rust 101", 0.0).await.unwrap();
        fixture
            .service
            .add_content(&teacher.id, &course.id, "Basics", vec!["One".into(), "Two".into()])
            .await
            .unwrap();

        assert!(matches!(
            fixture.service.publish(&teacher.id, &course.id).await,
            Err(CourseError::InvalidPublication { required: 3, found: 2 })
        ));

        fixture
            .service
            .add_content(&teacher.id, &course.id, "Advanced", vec!["Three".into()])
            .await
            .unwrap();
        let published = fixture.service.publish(&teacher.id, &course.id).await.unwrap();
        assert!(published.published);

        // Idempotent
        assert!(fixture.service.publish(&teacher.id, &course.id).await.unwrap().published);
        assert_eq!(fixture.service.list_published().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enroll_rules() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let student = fixture.user("Ana", UserRole::Student).await;
        let draft = fixture.service.create_course(&teacher.id, "Draft", 0.0).await.unwrap();
        let free = fixture.published_course(&teacher, 0.0).await;

        assert!(matches!(
            fixture.service.enroll(&draft.id, &student.id, false).await,
            Err(CourseError::NotPublished)
        ));
        assert!(matches!(
            fixture.service.enroll(&free.id, "missing", false).await,
            Err(CourseError::UserNotFound(_))
        ));
        assert!(matches!(
            fixture.service.enroll("missing", &student.id, false).await,
            Err(CourseError::CourseNotFound(_))
        ));

        let course = fixture.service.enroll(&free.id, &student.id, false).await.unwrap();
        assert_eq!(course.enrolled, vec![student.id.clone()]);
        assert_eq!(course.progress_of(&student.id), Some(0.0));

        assert!(matches!(
            fixture.service.enroll(&free.id, &student.id, false).await,
            Err(CourseError::AlreadyEnrolled)
        ));
    }

    #[tokio::test]
    async fn test_paid_course_requires_confirmed_payment() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let student = fixture.user("Ana", UserRole::Student).await;
        let paid = fixture.published_course(&teacher, 49.99).await;

        assert!(matches!(
            fixture.service.enroll(&paid.id, &student.id, false).await,
            Err(CourseError::PaymentRequired { price }) if price == 49.99
        ));
        assert!(fixture.service.enroll(&paid.id, &student.id, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_enroll() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let mut student = fixture.user("Ana", UserRole::Student).await;
        student.deactivate();
        fixture.users.update(&student).await.unwrap();
        let course = fixture.published_course(&teacher, 0.0).await;

        assert!(matches!(
            fixture.service.enroll(&course.id, &student.id, false).await,
            Err(CourseError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_progress_issues_one_certificate() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let student = fixture.user("Ana", UserRole::Student).await;
        let course = fixture.published_course(&teacher, 0.0).await;
        fixture.service.enroll(&course.id, &student.id, false).await.unwrap();

        let update = fixture.service.update_progress(&course.id, &student.id, 40.0).await.unwrap();
        assert_eq!(update.progress, 40.0);
        assert!(update.certificate.is_none());

        let update = fixture.service.update_progress(&course.id, &student.id, 150.0).await.unwrap();
        assert_eq!(update.progress, 100.0);
        let certificate = update.certificate.unwrap();
        assert_eq!(certificate.course_id, course.id);
        assert_eq!(certificate.user_id, student.id);

        let repeat = fixture.service.update_progress(&course.id, &student.id, 100.0).await.unwrap();
        assert!(repeat.certificate.is_none());

        let certificates = fixture.service.list_certificates_for_user(&student.id).await.unwrap();
        assert_eq!(certificates.len(), 1);
        assert_eq!(
            fixture.service.get_certificate(&certificate.id).await.unwrap().id,
            certificate.id
        );
        assert_eq!(
            fixture.service.get_course(&course.id).await.unwrap().progress_of(&student.id),
            Some(100.0)
        );
    }

    #[tokio::test]
    async fn test_progress_errors() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let student = fixture.user("Ana", UserRole::Student).await;
        let course = fixture.published_course(&teacher, 0.0).await;

        assert!(matches!(
            fixture.service.update_progress(&course.id, &student.id, 10.0).await,
            Err(CourseError::NotEnrolled)
        ));
        assert!(matches!(
            fixture.service.update_progress("missing", &student.id, 10.0).await,
            Err(CourseError::CourseNotFound(_))
        ));

        fixture.service.enroll(&course.id, &student.id, false).await.unwrap();
        for invalid in [-1.0, f64::NAN] {
            assert!(matches!(
                fixture.service.update_progress(&course.id, &student.id, invalid).await,
                Err(CourseError::Validation(_))
            ));
        }
        assert!(matches!(
            fixture.service.get_certificate("missing").await,
            Err(CourseError::CertificateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unpublished_course_visibility() {
        let fixture = Fixture::new();
        let teacher = fixture.user("Tom", UserRole::Teacher).await;
        let student = fixture.user("Ana", UserRole::Student).await;
        let admin = fixture.user("Root", UserRole::Admin).await;
        let draft = fixture.service.create_course(&teacher.id, "Draft", 0.0).await.unwrap();

        assert!(fixture.service.get_course_for(&draft.id, Some(&teacher)).await.is_ok());
        assert!(fixture.service.get_course_for(&draft.id, Some(&admin)).await.is_ok());
        assert!(matches!(
            fixture.service.get_course_for(&draft.id, Some(&student)).await,
            Err(CourseError::CourseNotFound(_))
        ));
        assert!(fixture.service.get_course_for(&draft.id, None).await.is_err());

        assert_eq!(fixture.service.list_by_instructor(&teacher.id).await.unwrap().len(), 1);
        assert!(fixture.service.list_published().await.unwrap().is_empty());
    }
}
