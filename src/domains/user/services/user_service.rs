use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info, warn};

use crate::domains::user::dto::Claims;
use crate::domains::user::errors::UserError;
use crate::domains::user::repository::UserRepository;
use crate::domains::user::services::{JwtService, PasswordError, PasswordService, SessionService};
use crate::shared::models::{User, UserRole};
use crate::shared::utils::validation::{non_blank, normalize_email};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
}

/// The user registry: accounts, credentials and login sessions.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    password_service: PasswordService,
    jwt_service: JwtService,
    sessions: SessionService,
    // Serializes read-modify-write cycles on user records
    write_lock: Mutex<()>,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        password_service: PasswordService,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            repository,
            password_service,
            jwt_service,
            sessions: SessionService::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, UserError> {
        let name = non_blank(name)
            .ok_or_else(|| UserError::Validation("name must not be empty".to_string()))?;
        let email = normalize_email(email)
            .ok_or_else(|| UserError::Validation(format!("invalid email address: {}", email.trim())))?;

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(UserError::EmailTaken(email));
        }
        let password_hash = self.hash_password(password).await?;

        let _guard = self.write_lock.lock().await;
        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(UserError::EmailTaken(email));
        }

        let user = User::new(name, &email, password_hash, role);
        self.repository.insert(&user).await?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Creates the bootstrap administrator unless the email is already taken.
    pub async fn seed_admin(&self, name: &str, email: &str, password: &str) -> Result<User, UserError> {
        match self.get_by_email(email).await {
            Ok(existing) => {
                debug!(user_id = %existing.id, "administrator already present");
                return Ok(existing);
            }
            Err(UserError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let admin = self.register(name, email, password, UserRole::Admin).await?;
        info!(user_id = %admin.id, "administrator seeded");
        Ok(admin)
    }

    /// The same error is returned for unknown, inactive and wrong-password
    /// logins.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, UserError> {
        let Some(candidate) = self.repository.find_by_email(email.trim()).await? else {
            debug!("login for unknown email");
            return Err(UserError::InvalidCredentials);
        };

        if !candidate.is_active {
            debug!(user_id = %candidate.id, "login for inactive account");
            return Err(UserError::InvalidCredentials);
        }

        if !self.verify_password(password, &candidate.password_hash).await? {
            warn!(user_id = %candidate.id, "failed login attempt");
            return Err(UserError::InvalidCredentials);
        }

        // The record may have changed while the password was checked
        let _guard = self.write_lock.lock().await;
        let mut user = match self.repository.find_by_id(&candidate.id).await? {
            Some(user) if user.is_active && user.password_hash == candidate.password_hash => user,
            _ => {
                debug!(user_id = %candidate.id, "account changed during login");
                return Err(UserError::InvalidCredentials);
            }
        };

        user.record_login();
        self.repository.update(&user).await?;

        let session = self
            .sessions
            .open(&user.id, self.jwt_service.expires_at()?)
            .await;
        let token = self.jwt_service.generate_token(&user, &session)?;

        info!(user_id = %user.id, session_id = %session.session_id, "user logged in");
        Ok(IssuedToken {
            user,
            token,
            expires_in: self.jwt_service.token_expiry_hours() * 3600,
        })
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.active_count().await
    }

    pub async fn logout(&self, session_id: &str) {
        self.sessions.revoke(session_id).await;
    }

    /// Resolves a bearer token to its claims and the current user record.
    pub async fn authenticate(&self, token: &str) -> Result<(Claims, User), UserError> {
        let claims = self.jwt_service.validate_token(token)?;

        if !self.sessions.is_valid(&claims.jti).await {
            return Err(UserError::SessionRevoked);
        }

        let user = self
            .repository
            .find_by_id(&claims.sub)
            .await?
            .ok_or(UserError::SessionRevoked)?;

        if !user.is_active {
            return Err(UserError::AccountDisabled);
        }

        Ok((claims, user))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, UserError> {
        self.repository
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| UserError::NotFound(email.to_string()))
    }

    pub async fn list_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.repository.list().await?)
    }

    pub async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, UserError> {
        let users = self.repository.list().await?;
        Ok(users.into_iter().filter(|u| u.role == role).collect())
    }

    /// Blank names and unchanged emails are ignored.
    pub async fn update_profile(
        &self,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, UserError> {
        let _guard = self.write_lock.lock().await;
        let mut user = self.get_by_id(id).await?;

        if let Some(name) = name.and_then(non_blank) {
            user.name = name.to_string();
        }

        if let Some(raw_email) = email {
            let new_email = normalize_email(raw_email).ok_or_else(|| {
                UserError::Validation(format!("invalid email address: {}", raw_email.trim()))
            })?;

            if new_email != user.email {
                if self.repository.find_by_email(&new_email).await?.is_some() {
                    return Err(UserError::EmailTaken(new_email));
                }
                user.email = new_email;
            }
        }

        self.repository.update(&user).await?;
        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    pub async fn change_password(
        &self,
        id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        let user = self.get_by_id(id).await?;
        if !self.verify_password(current_password, &user.password_hash).await? {
            return Err(UserError::InvalidCredentials);
        }
        let password_hash = self.hash_password(new_password).await?;

        let _guard = self.write_lock.lock().await;
        let mut fresh = self.get_by_id(id).await?;
        if fresh.password_hash != user.password_hash {
            return Err(UserError::InvalidCredentials);
        }

        fresh.password_hash = password_hash;
        self.repository.update(&fresh).await?;

        info!(user_id = %fresh.id, "password changed");
        Ok(())
    }

    pub async fn change_role(&self, id: &str, role: UserRole) -> Result<User, UserError> {
        let _guard = self.write_lock.lock().await;
        let mut user = self.get_by_id(id).await?;

        let previous = user.role;
        user.set_role(role);
        self.repository.update(&user).await?;

        info!(user_id = %user.id, from = %previous, to = %role, "role changed");
        Ok(user)
    }

    /// Deactivates the account and revokes its open sessions.
    pub async fn deactivate(&self, id: &str) -> Result<User, UserError> {
        let user = {
            let _guard = self.write_lock.lock().await;
            let mut user = self.get_by_id(id).await?;
            user.deactivate();
            self.repository.update(&user).await?;
            user
        };

        let revoked = self.sessions.revoke_all_for_user(&user.id).await;
        info!(user_id = %user.id, revoked_sessions = revoked, "user deactivated");
        Ok(user)
    }

    pub async fn reactivate(&self, id: &str) -> Result<User, UserError> {
        let _guard = self.write_lock.lock().await;
        let mut user = self.get_by_id(id).await?;
        user.reactivate();
        self.repository.update(&user).await?;

        info!(user_id = %user.id, "user reactivated");
        Ok(user)
    }

    // bcrypt runs on the blocking pool
    async fn hash_password(&self, password: &str) -> Result<String, UserError> {
        let passwords = self.password_service.clone();
        let password = password.to_string();
        let hashed = task::spawn_blocking(move || passwords.hash_password(&password))
            .await
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))??;
        Ok(hashed)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, UserError> {
        let passwords = self.password_service.clone();
        let (password, hash) = (password.to_string(), hash.to_string());
        let matches = task::spawn_blocking(move || passwords.verify_password(&password, &hash))
            .await
            .map_err(|e| PasswordError::VerificationFailed(e.to_string()))??;
        Ok(matches)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domains::user::repository::InMemoryUserRepository;
    use crate::domains::user::services::{JwtConfig, JwtError, PasswordConfig};
    use crate::shared::testing::Gate;
    use crate::system::config::AppConfig;
    use async_trait::async_trait;

    pub(crate) fn create_test_user_service() -> UserService {
        service_with(Arc::new(InMemoryUserRepository::new()))
    }

    fn service_with(repository: Arc<dyn UserRepository>) -> UserService {
        let config = AppConfig::for_tests();
        UserService::new(
            repository,
            PasswordService::new(PasswordConfig::from(&config.auth)),
            JwtService::new(JwtConfig::from(&config.auth)),
        )
    }

    /// Holds the next email lookup until the test opens the gate.
    #[derive(Default)]
    struct GatedUserRepository {
        inner: InMemoryUserRepository,
        gate: Gate,
    }

    #[async_trait]
    impl UserRepository for GatedUserRepository {
        async fn insert(&self, user: &User) -> anyhow::Result<()> {
            self.inner.insert(user).await
        }

        async fn update(&self, user: &User) -> anyhow::Result<()> {
            self.inner.update(user).await
        }

        async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            let found = self.inner.find_by_email(email).await;
            self.gate.pass().await;
            found
        }

        async fn list(&self) -> anyhow::Result<Vec<User>> {
            self.inner.list().await
        }
    }

    /// Registers Ana, then arms the gate so her next login pauses after
    /// the email lookup.
    async fn paused_login_setup() -> (Arc<GatedUserRepository>, UserService, User) {
        let repository = Arc::new(GatedUserRepository::default());
        let service = service_with(repository.clone());
        let user = service
            .register("Ana", "ana@lms.com", "password1", UserRole::Student)
            .await
            .unwrap();
        repository.gate.arm();
        (repository, service, user)
    }

    #[tokio::test]
    async fn test_deactivation_during_login_is_kept() {
        let (repository, service, user) = paused_login_setup().await;

        let (login, deactivated) = tokio::join!(service.login("ana@lms.com", "password1"), async {
            repository.gate.wait_until_held().await;
            let deactivated = service.deactivate(&user.id).await;
            repository.gate.open();
            deactivated
        });

        assert!(deactivated.is_ok());
        assert!(matches!(login, Err(UserError::InvalidCredentials)));
        assert!(!service.get_by_id(&user.id).await.unwrap().is_active);
        assert_eq!(service.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_password_change_during_login_is_kept() {
        let (repository, service, user) = paused_login_setup().await;

        let (login, changed) = tokio::join!(service.login("ana@lms.com", "password1"), async {
            repository.gate.wait_until_held().await;
            let changed = service.change_password(&user.id, "password1", "password2").await;
            repository.gate.open();
            changed
        });

        assert!(changed.is_ok());
        assert!(matches!(login, Err(UserError::InvalidCredentials)));
        assert!(service.login("ana@lms.com", "password1").await.is_err());
        assert!(service.login("ana@lms.com", "password2").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_records_last_login_on_fresh_record() {
        let (repository, service, user) = paused_login_setup().await;

        let (login, changed) = tokio::join!(service.login("ana@lms.com", "password1"), async {
            repository.gate.wait_until_held().await;
            let changed = service.change_role(&user.id, UserRole::Specialist).await;
            repository.gate.open();
            changed
        });

        assert!(changed.is_ok());
        assert_eq!(login.unwrap().user.role, UserRole::Specialist);
        let stored = service.get_by_id(&user.id).await.unwrap();
        assert_eq!(stored.role, UserRole::Specialist);
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_registrations_claim_email_once() {
        let service = create_test_user_service();

        let (first, second) = tokio::join!(
            service.register("Ana", "ana@lms.com", "password1", UserRole::Student),
            service.register("Ana", "ANA@lms.com", "password2", UserRole::Student)
        );

        let taken = [&first, &second]
            .iter()
            .filter(|result| matches!(result, Err(UserError::EmailTaken(_))))
            .count();
        assert_eq!(taken, 1);
        assert!(first.is_ok() || second.is_ok());
        assert_eq!(service.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_defaults() {
        let service = create_test_user_service();
        let user = service
            .register("Ana", "Ana@LMS.com", "password1", UserRole::default())
            .await
            .unwrap();

        assert_eq!(user.email, "ana@lms.com");
        assert_eq!(user.role, UserRole::Student);
        assert!(user.is_active);
        assert_ne!(user.password_hash, "password1");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_case_insensitively() {
        let service = create_test_user_service();
        service.register("Ana", "ana@lms.com", "password1", UserRole::Student).await.unwrap();

        let result = service.register("Other", "ANA@lms.com", "password2", UserRole::Teacher).await;
        assert!(matches!(result, Err(UserError::EmailTaken(email)) if email == "ana@lms.com"));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = create_test_user_service();

        assert!(matches!(
            service.register("  ", "ana@lms.com", "password1", UserRole::Student).await,
            Err(UserError::Validation(_))
        ));
        assert!(matches!(
            service.register("Ana", "ana.lms.com", "password1", UserRole::Student).await,
            Err(UserError::Validation(_))
        ));
        assert!(matches!(
            service.register("Ana", "ana@lms.com", "short", UserRole::Student).await,
            Err(UserError::Password(PasswordError::WeakPassword { .. }))
        ));
        // The failed attempt must not reserve the email
        assert!(matches!(
            service.get_by_email("ana@lms.com").await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_login_flow() {
        let service = create_test_user_service();
        service.register("Ana", "ana@lms.com", "password1", UserRole::Student).await.unwrap();

        let issued = service.login("ANA@lms.com", "password1").await.unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(issued.expires_in, 24 * 3600);
        assert!(issued.user.last_login.is_some());

        let (claims, user) = service.authenticate(&issued.token).await.unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(user.email, "ana@lms.com");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = create_test_user_service();
        let user = service.register("Ana", "ana@lms.com", "password1", UserRole::Student).await.unwrap();

        assert!(matches!(
            service.login("ana@lms.com", "wrong-password").await,
            Err(UserError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@lms.com", "password1").await,
            Err(UserError::InvalidCredentials)
        ));

        service.deactivate(&user.id).await.unwrap();
        assert!(matches!(
            service.login("ana@lms.com", "password1").await,
            Err(UserError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let service = create_test_user_service();
        service.register("Ana", "ana@lms.com", "password1", UserRole::Student).await.unwrap();
        let issued = service.login("ana@lms.com", "password1").await.unwrap();
        let (claims, _) = service.authenticate(&issued.token).await.unwrap();

        service.logout(&claims.jti).await;
        assert!(matches!(
            service.authenticate(&issued.token).await,
            Err(UserError::SessionRevoked)
        ));
    }

    #[tokio::test]
    async fn test_deactivation_revokes_sessions_and_reactivation_restores_login() {
        let service = create_test_user_service();
        let user = service.register("Ana", "ana@lms.com", "password1", UserRole::Student).await.unwrap();
        let issued = service.login("ana@lms.com", "password1").await.unwrap();

        service.deactivate(&user.id).await.unwrap();
        assert!(service.authenticate(&issued.token).await.is_err());

        let user = service.reactivate(&user.id).await.unwrap();
        assert!(user.is_active);
        assert!(service.login("ana@lms.com", "password1").await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let service = create_test_user_service();
        assert!(matches!(
            service.authenticate("garbage").await,
            Err(UserError::Token(JwtError::TokenValidation(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let service = create_test_user_service();
        let ana = service.register("Ana", "ana@lms.com", "password1", UserRole::Student).await.unwrap();
        service.register("Bob", "bob@lms.com", "password1", UserRole::Student).await.unwrap();

        // Blank name ignored, same email (different case) ignored
        let updated = service
            .update_profile(&ana.id, Some("  "), Some("ANA@lms.com"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.email, "ana@lms.com");

        let updated = service
            .update_profile(&ana.id, Some("Ana María"), Some("Ana.Maria@lms.com"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana María");
        assert_eq!(updated.email, "ana.maria@lms.com");
        assert!(service.get_by_email("ana@lms.com").await.is_err());
        assert_eq!(service.get_by_email("ana.maria@lms.com").await.unwrap().id, ana.id);

        assert!(matches!(
            service.update_profile(&ana.id, None, Some("bob@lms.com")).await,
            Err(UserError::EmailTaken(_))
        ));
        assert!(matches!(
            service.update_profile("missing", Some("X"), None).await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let service = create_test_user_service();
        let ana = service.register("Ana", "ana@lms.com", "password1", UserRole::Student).await.unwrap();

        assert!(matches!(
            service.change_password(&ana.id, "wrong", "password2").await,
            Err(UserError::InvalidCredentials)
        ));
        assert!(matches!(
            service.change_password(&ana.id, "password1", "short").await,
            Err(UserError::Password(PasswordError::WeakPassword { .. }))
        ));

        service.change_password(&ana.id, "password1", "password2").await.unwrap();
        assert!(service.login("ana@lms.com", "password1").await.is_err());
        assert!(service.login("ana@lms.com", "password2").await.is_ok());
    }

    #[tokio::test]
    async fn test_roles() {
        let service = create_test_user_service();
        let ana = service.register("Ana", "ana@lms.com", "password1", UserRole::Student).await.unwrap();
        service.register("Tom", "tom@lms.com", "password1", UserRole::Teacher).await.unwrap();

        assert_eq!(service.list_by_role(UserRole::Teacher).await.unwrap().len(), 1);

        service.change_role(&ana.id, UserRole::Specialist).await.unwrap();
        assert!(service.list_by_role(UserRole::Student).await.unwrap().is_empty());
        assert_eq!(service.list_by_role(UserRole::Specialist).await.unwrap()[0].id, ana.id);
        assert_eq!(service.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_seed_admin_is_idempotent() {
        let service = create_test_user_service();

        let first = service.seed_admin("System Admin", "admin@lms.com", "adminpass").await.unwrap();
        let second = service.seed_admin("System Admin", "admin@lms.com", "adminpass").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.role, UserRole::Admin);
        assert_eq!(service.list_by_role(UserRole::Admin).await.unwrap().len(), 1);
    }
}
