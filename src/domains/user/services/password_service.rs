use bcrypt::{hash, verify, DEFAULT_COST};
use regex::Regex;
use std::sync::LazyLock;

use crate::system::config::{AuthConfig, PasswordRules};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
    #[error("Password verification failed: {0}")]
    VerificationFailed(String),
    #[error("Password too weak: {}", .violations.join("; "))]
    WeakPassword { violations: Vec<String> },
}

static UPPERCASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{Lu}").unwrap());
static LOWERCASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{Ll}").unwrap());
static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]").unwrap());
static SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[!@#$%^&*(),.?:;{}|<>_\-+=\[\]/~]").unwrap());

#[derive(Debug, Clone)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub rules: PasswordRules,
    pub bcrypt_cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            rules: PasswordRules::default(),
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            rules: config.password_rules,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

#[derive(Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Checks strength, then hashes with bcrypt.
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.validate_password_strength(password)?;

        hash(password, self.config.bcrypt_cost)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        verify(password, hash).map_err(|e| PasswordError::VerificationFailed(e.to_string()))
    }

    /// Every broken rule is reported, not just the first.
    pub fn validate_password_strength(&self, password: &str) -> Result<(), PasswordError> {
        let rules = &self.config.rules;
        let checks: [(bool, &LazyLock<Regex>, &str); 4] = [
            (rules.uppercase, &UPPERCASE, "an uppercase letter"),
            (rules.lowercase, &LOWERCASE, "a lowercase letter"),
            (rules.digits, &DIGIT, "a digit"),
            (rules.special_chars, &SPECIAL, "a special character"),
        ];

        let mut violations = Vec::new();
        if password.chars().count() < self.config.min_length {
            violations.push(format!(
                "must be at least {} characters long",
                self.config.min_length
            ));
        }
        violations.extend(
            checks
                .iter()
                .filter(|(required, regex, _)| *required && !regex.is_match(password))
                .map(|(_, _, what)| format!("must contain {}", what)),
        );

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PasswordError::WeakPassword { violations })
        }
    }
}
