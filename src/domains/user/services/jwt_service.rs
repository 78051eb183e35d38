use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::domains::user::dto::{Claims, TokenValidationResponse};
use crate::shared::models::{User, UserSession};
use crate::shared::utils::date_util::{DateTime, DateUtil};
use crate::system::config::AuthConfig;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token creation failed: {0}")]
    TokenCreation(String),
    #[error("Token validation failed: {0}")]
    TokenValidation(String),
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing token")]
    MissingToken,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub token_expiry_hours: i64,
    pub issuer: String,
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            algorithm: Algorithm::HS256,
            token_expiry_hours: config.token_expiry_hours,
            issuer: config.issuer.clone(),
        }
    }
}

pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.leeway = 0;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn token_expiry_hours(&self) -> i64 {
        self.config.token_expiry_hours
    }

    pub fn expires_at(&self) -> Result<DateTime, JwtError> {
        DateUtil::add_duration(&DateUtil::now(), DateUtil::hours(self.config.token_expiry_hours))
            .map_err(|e| JwtError::TokenCreation(e.to_string()))
    }

    /// Signs an access token bound to `session`; the session id becomes the `jti`.
    pub fn generate_token(&self, user: &User, session: &UserSession) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            jti: session.session_id.clone(),
            exp: DateUtil::to_timestamp(&session.expires_at) as usize,
            iat: DateUtil::to_timestamp(&session.created_at) as usize,
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenCreation(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        if token.is_empty() {
            return Err(JwtError::MissingToken);
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::TokenValidation(e.to_string()),
            })?;

        let claims = token_data.claims;
        if claims.is_expired() {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }

    pub fn get_token_validation_response(&self, claims: &Claims) -> TokenValidationResponse {
        TokenValidationResponse {
            valid: true,
            user_id: Some(claims.sub.clone()),
            email: Some(claims.email.clone()),
            role: Some(claims.role.clone()),
            expires_at: DateUtil::from_timestamp(claims.exp as i64).ok(),
        }
    }
}
