use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Trimmed, lowercased email, or `None` when it is not an address.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    is_valid_email(&email).then_some(email)
}

pub fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ana@lms.com"));
        assert!(!is_valid_email("ana@lms"));
        assert!(!is_valid_email("ana lms@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@LMS.com "), Some("ana@lms.com".to_string()));
        assert_eq!(normalize_email("not-an-email"), None);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  Rust 101 "), Some("Rust 101"));
        assert_eq!(non_blank("   "), None);
    }
}
