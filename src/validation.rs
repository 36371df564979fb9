//! Field validation for account, habit, quest and roster input.

/// Field validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} is too long (maximum {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} contains control characters")]
    ControlCharacters { field: &'static str },

    #[error("{value:?} is not a valid email address")]
    InvalidEmail { value: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

/// Length limits applied to free-text fields.
#[derive(Debug, Clone)]
pub struct TextRules {
    pub max_length: usize,
    pub allow_newlines: bool,
}

impl TextRules {
    /// Short single-line labels: usernames, habit and quest names, friend names
    pub fn name() -> Self {
        TextRules {
            max_length: 64,
            allow_newlines: false,
        }
    }

    /// Longer descriptive text such as quest descriptions
    pub fn description() -> Self {
        TextRules {
            max_length: 500,
            allow_newlines: true,
        }
    }
}

/// Validate a text field according to the given rules. Returns the trimmed value.
pub fn validate_text(field: &'static str, value: &str, rules: &TextRules) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required { field });
    }
    if trimmed.chars().count() > rules.max_length {
        return Err(FieldError::TooLong {
            field,
            max: rules.max_length,
        });
    }
    let bad_control = trimmed
        .chars()
        .any(|c| c.is_control() && !(rules.allow_newlines && (c == '\n' || c == '\r')));
    if bad_control {
        return Err(FieldError::ControlCharacters { field });
    }
    Ok(trimmed.to_string())
}

/// Validate a short single-line name
pub fn validate_name(field: &'static str, value: &str) -> Result<String, FieldError> {
    validate_text(field, value, &TextRules::name())
}

/// Check that a field is present without otherwise altering it (passwords).
pub fn require(field: &'static str, value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Err(FieldError::Required { field });
    }
    Ok(())
}

/// Validate an email address. The check is deliberately loose: something
/// before and after a single `@`, no whitespace.
pub fn validate_email(value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required { field: "email" });
    }
    let invalid = || FieldError::InvalidEmail {
        value: trimmed.to_string(),
    };
    if trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(trimmed.to_string())
        }
        _ => Err(invalid()),
    }
}

/// Validate a reward amount (XP rewards must be positive)
pub fn validate_reward(field: &'static str, value: u32) -> Result<u32, FieldError> {
    if value == 0 {
        return Err(FieldError::NotPositive { field });
    }
    Ok(value)
}
