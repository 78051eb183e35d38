pub mod jwt_service;
pub mod password_service;
pub mod session_service;
pub mod user_service;

pub use jwt_service::{JwtConfig, JwtError, JwtService};
pub use password_service::{PasswordConfig, PasswordError, PasswordService};
pub use session_service::SessionService;
pub use user_service::{IssuedToken, UserService};
