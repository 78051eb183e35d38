use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;

use crate::domains::course::dto::{
    AddModuleRequest, CertificateDto, CourseDto, CourseSummaryDto, CourseView, CreateCourseRequest,
    EnrollRequest, ProgressRequest, ProgressResponse,
};
use crate::domains::user::handlers::{CurrentUser, MaybeUser};
use crate::shared::errors::HandlerError;
use crate::shared::state::{success, AppState};
use crate::system::locale::LocaleExtractor;

pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
) -> Result<Json<Value>, HandlerError> {
    let courses = state
        .localize(&locale, state.course_service.list_published().await)
        .await?;

    let catalog: Vec<CourseSummaryDto> = courses.iter().map(CourseSummaryDto::from).collect();
    let message = state.message(&locale, "course.catalog").await;
    Ok(success(message, catalog))
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let course = state
        .localize(
            &locale,
            state
                .course_service
                .create_course(current.id(), &payload.title, payload.price.unwrap_or(0.0))
                .await,
        )
        .await?;

    let message = state.message(&locale, "course.created").await;
    Ok((StatusCode::CREATED, success(message, CourseDto::from(&course))))
}

pub async fn get_course(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    viewer: MaybeUser,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let course = state
        .localize(
            &locale,
            state.course_service.get_course_for(&course_id, viewer.user()).await,
        )
        .await?;

    let message = state.message(&locale, "course.found").await;
    Ok(success(message, CourseView::new(&course, viewer.user())))
}

pub async fn add_module(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Path(course_id): Path<String>,
    Json(payload): Json<AddModuleRequest>,
) -> Result<Json<Value>, HandlerError> {
    let course = state
        .localize(
            &locale,
            state
                .course_service
                .add_content(current.id(), &course_id, &payload.title, payload.lessons)
                .await,
        )
        .await?;

    let message = state.message(&locale, "course.module_added").await;
    Ok(success(message, CourseDto::from(&course)))
}

pub async fn publish_course(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let course = state
        .localize(
            &locale,
            state.course_service.publish(current.id(), &course_id).await,
        )
        .await?;

    let message = state.message(&locale, "course.published").await;
    Ok(success(message, CourseDto::from(&course)))
}

/// Enrolls the caller. A missing or unreadable body counts as no payment.
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Path(course_id): Path<String>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> Result<Json<Value>, HandlerError> {
    let payment_confirmed = payload.is_ok_and(|Json(request)| request.payment_confirmed);

    let course = state
        .localize(
            &locale,
            state
                .course_service
                .enroll(&course_id, current.id(), payment_confirmed)
                .await,
        )
        .await?;

    let message = state.message(&locale, "course.enrolled").await;
    Ok(success(message, CourseSummaryDto::from(&course)))
}

pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
    Path(course_id): Path<String>,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<Value>, HandlerError> {
    let update = state
        .localize(
            &locale,
            state
                .course_service
                .update_progress(&course_id, current.id(), payload.percent)
                .await,
        )
        .await?;

    let key = if update.certificate.is_some() {
        "course.completed"
    } else {
        "course.progress_updated"
    };
    let message = state.message(&locale, key).await;
    let base_url = state.course_service.certificate_base_url();
    Ok(success(message, ProgressResponse::new(&update, base_url)))
}

/// Published courses of an instructor. The instructor and administrators
/// also see drafts.
pub async fn instructor_courses(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    viewer: MaybeUser,
    Path(instructor_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let courses = state
        .localize(
            &locale,
            state.course_service.list_by_instructor(&instructor_id).await,
        )
        .await?;

    let views: Vec<CourseView> = courses
        .iter()
        .filter(|course| {
            course.published || viewer.user().is_some_and(|user| course.is_managed_by(user))
        })
        .map(|course| CourseView::new(course, viewer.user()))
        .collect();

    let message = state.message(&locale, "course.listed").await;
    Ok(success(message, views))
}

pub async fn get_certificate(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    Path(certificate_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let certificate = state
        .localize(
            &locale,
            state.course_service.get_certificate(&certificate_id).await,
        )
        .await?;

    let base_url = state.course_service.certificate_base_url();
    let message = state.message(&locale, "certificate.verified").await;
    Ok(success(message, CertificateDto::new(&certificate, base_url)))
}

pub async fn my_certificates(
    State(state): State<Arc<AppState>>,
    LocaleExtractor(locale): LocaleExtractor,
    current: CurrentUser,
) -> Result<Json<Value>, HandlerError> {
    let certificates = state
        .localize(
            &locale,
            state.course_service.list_certificates_for_user(current.id()).await,
        )
        .await?;

    let base_url = state.course_service.certificate_base_url();
    let dtos: Vec<CertificateDto> = certificates
        .iter()
        .map(|certificate| CertificateDto::new(certificate, base_url))
        .collect();

    let message = state.message(&locale, "certificate.listed").await;
    Ok(success(message, dtos))
}
