use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// Input validation helpers shared by the request DTOs

// Hardcoded pattern, compiled once
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("hardcoded username regex is invalid - fix source code")
});

/// Trim and lower-case a username or email before any comparison or storage
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validate username format (3-32 characters of letters, digits or underscore)
pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

/// validator crate compatible custom validator for username shape
pub fn validate_username_shape(username: &str) -> Result<(), ValidationError> {
    if validate_username(username) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_username");
        err.message = Some("username must be 3-32 letters, digits or underscores".into());
        Err(err)
    }
}
