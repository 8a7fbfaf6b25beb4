// 📐 Field Validation
// Every entity constructor and setter funnels through these checks, so an
// entity never lands in a registry half-validated.

use lazy_static::lazy_static;
use regex::Regex;

// ============================================================================
// PATTERNS
// ============================================================================

lazy_static! {
    /// Starts with a letter, 8-31 characters of letters, digits or underscore
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]{7,30}$").unwrap();

    /// `local@domain.tld`, no whitespace, exactly one `@`
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@ \t\r\n]+@[^@ \t\r\n]+\.[^@ \t\r\n]+$").unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(r"^[0-9]{10}$").unwrap();

    /// Five digits with an optional `-NNNN` extension
    static ref ZIP_REGEX: Regex = Regex::new(r"^[0-9]{5}(?:-[0-9]{4})?$").unwrap();
}

/// Symbols accepted as the "special character" of a password (space included)
pub const PASSWORD_SYMBOLS: &str = "#?!@$ %^&*-";

pub const MIN_PASSWORD_LENGTH: usize = 8;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

// ============================================================================
// VALIDATORS
// ============================================================================

pub fn require_non_empty(field: &str, value: &str) -> ValidationResult {
    if value.is_empty() {
        return Err(ValidationError::new(field, "cannot be empty"));
    }
    Ok(())
}

pub fn require_at_least(field: &str, value: i32, minimum: i32) -> ValidationResult {
    if value < minimum {
        return Err(ValidationError::new(
            field,
            format!("cannot be less than {}, got {}", minimum, value),
        ));
    }
    Ok(())
}

fn require_match(field: &str, value: &str, pattern: &Regex, expected: &str) -> ValidationResult {
    require_non_empty(field, value)?;
    if !pattern.is_match(value) {
        return Err(ValidationError::new(
            field,
            format!("must be {}, got '{}'", expected, value),
        ));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> ValidationResult {
    require_match(
        "username",
        username,
        &USERNAME_REGEX,
        "8-31 letters, digits or underscores starting with a letter",
    )
}

pub fn validate_email(email: &str) -> ValidationResult {
    require_match("email", email, &EMAIL_REGEX, "in the form local@domain.tld")
}

pub fn validate_phone(phone: &str) -> ValidationResult {
    require_match("phone", phone, &PHONE_REGEX, "exactly 10 digits")
}

pub fn validate_zip(zip: &str) -> ValidationResult {
    require_match("zip", zip, &ZIP_REGEX, "5 digits with an optional -4 digit suffix")
}

/// Password rules: at least 8 characters with one upper case letter, one
/// lower case letter, one digit and one of [`PASSWORD_SYMBOLS`].
///
/// The value itself is never echoed back in the error.
pub fn validate_password(password: &str) -> ValidationResult {
    require_non_empty("password", password)?;

    let mut missing = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        missing.push(format!("at least {} characters", MIN_PASSWORD_LENGTH));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        missing.push("an upper case letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        missing.push("a lower case letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        missing.push("a digit".to_string());
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        missing.push(format!("one of '{}'", PASSWORD_SYMBOLS));
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(
            "password",
            format!("must contain {}", missing.join(", ")),
        ))
    }
}

// ============================================================================
// TESTS
// ============================================================================
