pub mod course_handlers;

pub use course_handlers::{
    add_module, create_course, enroll, get_certificate, get_course, instructor_courses,
    list_catalog, my_certificates, publish_course, update_progress,
};
