pub mod auth_extractor;
pub mod auth_handlers;
pub mod user_handlers;

pub use auth_extractor::{CurrentUser, MaybeUser};
pub use auth_handlers::{auth_health, login, logout, register, validate_token};
pub use user_handlers::{
    activate_user, change_password, change_role, deactivate_user, get_profile, get_user,
    list_users, update_profile,
};
