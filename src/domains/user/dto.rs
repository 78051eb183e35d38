use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::shared::models::{User, UserRole};
use crate::shared::utils::date_util::{DateTime, DateUtil};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `student`
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64, // seconds
    pub user: UserDto,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub registered_at: DateTime,
    pub last_login: Option<DateTime>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            registered_at: user.registered_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // user id
    pub email: String,
    pub role: String,
    pub jti: String,   // session id
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
}

impl Claims {
    pub fn is_expired(&self) -> bool {
        DateUtil::to_timestamp(&DateUtil::now()) as usize >= self.exp
    }

    pub fn get_role(&self) -> Result<UserRole, String> {
        UserRole::parse(&self.role)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct TokenValidationResponse {
    pub valid: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub expires_at: Option<DateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_dto_hides_password_hash() {
        let user = User::new("Ana", "ana@lms.com", "secret-hash".to_string(), UserRole::Teacher);
        let json = serde_json::to_value(UserDto::from(&user)).unwrap();

        assert_eq!(json["role"], "teacher");
        assert_eq!(json["email"], "ana@lms.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("last_login").is_none());
        assert!(!json.to_string().contains("secret-hash"));
    }

    #[test]
    fn test_claims_role() {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "ana@lms.com".to_string(),
            role: "specialist".to_string(),
            jti: "session-1".to_string(),
            exp: 0,
            iat: 0,
            iss: "lms-service".to_string(),
        };

        assert_eq!(claims.get_role().unwrap(), UserRole::Specialist);
        assert!(claims.is_expired());
    }

    #[test]
    fn test_register_request_role_is_optional() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"name": "Ana", "email": "ana@lms.com", "password": "12345678"}"#,
        )
        .unwrap();
        assert!(request.role.is_none());
    }
}
