pub mod certificate;
pub mod course;
pub mod user;
pub mod user_session;

pub use certificate::Certificate;
pub use course::{Course, CourseModule};
pub use user::{User, UserRole};
pub use user_session::UserSession;
