use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{RegisterRequest, Role};
use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// At least 6 characters with one uppercase letter, one lowercase letter and
/// one digit.
pub(crate) fn is_strong_password(password: &str) -> bool {
    password.len() >= 6
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Registration payload after validation and normalization: username
/// trimmed, email trimmed and lower-cased.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub fn validate_registration(payload: RegisterRequest) -> Result<Registration, ApiError> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() {
        return Err(ApiError::MissingField("username"));
    }
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::MissingField("password"));
    }
    if username.chars().count() < 3 || username.chars().count() > 30 {
        return Err(ApiError::InvalidUsername);
    }
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidEmail);
    }
    if !is_strong_password(&payload.password) {
        return Err(ApiError::WeakPassword);
    }

    Ok(Registration {
        username,
        email,
        password: payload.password,
        role: payload.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            role: Role::User,
        }
    }

    #[test]
    fn accepts_a_valid_registration() {
        let reg = validate_registration(request("bob", "Bob@X.com ", "Passw0rd")).unwrap();
        assert_eq!(reg.username, "bob");
        assert_eq!(reg.email, "bob@x.com");
    }

    #[test]
    fn missing_fields_are_reported_first() {
        assert!(matches!(
            validate_registration(request("", "bob@x.com", "Passw0rd")),
            Err(ApiError::MissingField("username"))
        ));
        assert!(matches!(
            validate_registration(request("bob", "   ", "Passw0rd")),
            Err(ApiError::MissingField("email"))
        ));
        assert!(matches!(
            validate_registration(request("bob", "bob@x.com", "")),
            Err(ApiError::MissingField("password"))
        ));
    }

    #[test]
    fn username_length_bounds() {
        assert!(matches!(
            validate_registration(request("ab", "bob@x.com", "Passw0rd")),
            Err(ApiError::InvalidUsername)
        ));
        let long = "a".repeat(31);
        assert!(matches!(
            validate_registration(request(&long, "bob@x.com", "Passw0rd")),
            Err(ApiError::InvalidUsername)
        ));
        assert!(validate_registration(request("abc", "bob@x.com", "Passw0rd")).is_ok());
        let max = "a".repeat(30);
        assert!(validate_registration(request(&max, "bob@x.com", "Passw0rd")).is_ok());
    }

    #[test]
    fn rejects_bad_email_syntax() {
        for email in ["bob", "bob@", "@x.com", "bob@x", "bo b@x.com"] {
            assert!(
                matches!(
                    validate_registration(request("bob", email, "Passw0rd")),
                    Err(ApiError::InvalidEmail)
                ),
                "{email} should be invalid"
            );
        }
    }

    #[test]
    fn password_policy() {
        assert!(!is_strong_password("lowercase123"));
        assert!(!is_strong_password("UPPERCASE123"));
        assert!(!is_strong_password("NoDigits"));
        assert!(!is_strong_password("Ab1"));
        assert!(is_strong_password("Valid123"));

        assert!(matches!(
            validate_registration(request("bob", "bob@x.com", "lowercase123")),
            Err(ApiError::WeakPassword)
        ));
    }
}
