use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::domains::course::services::ProgressUpdate;
use crate::shared::models::{Certificate, Course, CourseModule, User};
use crate::shared::utils::date_util::DateTime;

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    /// Free when omitted
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AddModuleRequest {
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrollRequest {
    #[serde(default)]
    pub payment_confirmed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub percent: f64,
}

/// Full view, shown to the course's managers.
#[derive(Debug, Serialize)]
pub struct CourseDto {
    pub id: String,
    pub title: String,
    pub instructor_id: String,
    pub price: f64,
    pub modules: Vec<CourseModule>,
    pub total_lessons: usize,
    pub published: bool,
    pub enrolled_count: usize,
    pub enrolled: Vec<String>,
    pub created_at: DateTime,
}

impl From<&Course> for CourseDto {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            instructor_id: course.instructor_id.clone(),
            price: course.price,
            modules: course.modules.clone(),
            total_lessons: course.total_lessons(),
            published: course.published,
            enrolled_count: course.enrolled.len(),
            enrolled: course.enrolled.clone(),
            created_at: course.created_at,
        }
    }
}

/// Catalog entry. Enrollment details stay private.
#[derive(Debug, Serialize)]
pub struct CourseSummaryDto {
    pub id: String,
    pub title: String,
    pub instructor_id: String,
    pub price: f64,
    pub modules: Vec<CourseModule>,
    pub total_lessons: usize,
    pub published: bool,
}

impl From<&Course> for CourseSummaryDto {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            instructor_id: course.instructor_id.clone(),
            price: course.price,
            modules: course.modules.clone(),
            total_lessons: course.total_lessons(),
            published: course.published,
        }
    }
}

/// Managers see the full record, everyone else the catalog entry.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CourseView {
    Full(CourseDto),
    Summary(CourseSummaryDto),
}

impl CourseView {
    pub fn new(course: &Course, viewer: Option<&User>) -> Self {
        if viewer.is_some_and(|user| course.is_managed_by(user)) {
            CourseView::Full(CourseDto::from(course))
        } else {
            CourseView::Summary(CourseSummaryDto::from(course))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CertificateDto {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub issued_at: DateTime,
    pub verification_url: String,
}

impl CertificateDto {
    pub fn new(certificate: &Certificate, base_url: &str) -> Self {
        Self {
            id: certificate.id.clone(),
            user_id: certificate.user_id.clone(),
            course_id: certificate.course_id.clone(),
            issued_at: certificate.issued_at,
            verification_url: certificate.verification_url(base_url),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub course_id: String,
    pub user_id: String,
    pub progress: f64,
    pub completed: bool,
    pub certificate: Option<CertificateDto>,
}

impl ProgressResponse {
    pub fn new(update: &ProgressUpdate, base_url: &str) -> Self {
        Self {
            course_id: update.course_id.clone(),
            user_id: update.user_id.clone(),
            progress: update.progress,
            completed: update.progress >= crate::shared::models::course::COMPLETE,
            certificate: update
                .certificate
                .as_ref()
                .map(|certificate| CertificateDto::new(certificate, base_url)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_hides_enrollments() {
        let mut course = Course::new("Rust 101", "teacher-1", 0.0);
        course.enroll("student-1");

        let summary = serde_json::to_value(CourseSummaryDto::from(&course)).unwrap();
        assert!(summary.get("enrolled").is_none());

        let full = serde_json::to_value(CourseDto::from(&course)).unwrap();
        assert_eq!(full["enrolled_count"], 1);
    }

    #[test]
    fn test_course_view_depends_on_viewer() {
        use crate::shared::models::UserRole;

        let instructor = User::new("Tom", "tom@lms.com", "hash".to_string(), UserRole::Teacher);
        let student = User::new("Ana", "ana@lms.com", "hash".to_string(), UserRole::Student);
        let mut course = Course::new("Rust 101", &instructor.id, 0.0);
        course.enroll(&student.id);

        let managed = serde_json::to_value(CourseView::new(&course, Some(&instructor))).unwrap();
        assert_eq!(managed["enrolled_count"], 1);

        let public = serde_json::to_value(CourseView::new(&course, Some(&student))).unwrap();
        assert!(public.get("enrolled").is_none());
        assert_eq!(public["title"], "Rust 101");
        assert!(matches!(CourseView::new(&course, None), CourseView::Summary(_)));
    }

    #[test]
    fn test_progress_response_omits_missing_certificate() {
        let update = ProgressUpdate {
            course_id: "course-1".to_string(),
            user_id: "user-1".to_string(),
            progress: 50.0,
            certificate: None,
        };
        let json = serde_json::to_value(ProgressResponse::new(&update, "https://lms.com")).unwrap();

        assert_eq!(json["completed"], false);
        assert!(json.get("certificate").is_none());
    }

    #[test]
    fn test_certificate_dto_carries_verification_url() {
        let certificate = Certificate::new("user-1", "course-1");
        let dto = CertificateDto::new(&certificate, "https://lms.com");
        assert_eq!(
            dto.verification_url,
            format!("https://lms.com/verify/cert/{}", certificate.id)
        );
    }

    #[test]
    fn test_enroll_request_defaults_to_unpaid() {
        let request: EnrollRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.payment_confirmed);
    }
}
