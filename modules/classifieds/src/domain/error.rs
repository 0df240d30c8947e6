use std::fmt;

use thiserror::Error;

pub const USERNAME_TAKEN: &str = "User with that name already exists";
pub const EMAIL_TAKEN: &str = "That email already in use";
pub const OWNER_MISSING: &str = "This user does not exist";
pub const OWNER_IMMUTABLE: &str = "You cannot change the owner";
pub const EMPTY_PATCH: &str = "You need to supply data to change the ad";
pub const AD_NOT_FOUND: &str = "There is no such ad";

/// Category of a field-level validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Missing,
    StringType,
    IntType,
    ValueError,
}

impl FieldErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::StringType => "string_type",
            Self::IntType => "int_type",
            Self::ValueError => "value_error",
        }
    }
}

/// One failing input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub msg: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind, msg: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            msg: msg.into(),
            kind,
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, FieldErrorKind::Missing, "field required")
    }

    pub fn value(field: &str, msg: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::ValueError, msg)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.msg)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation failed: {}", join_errors(.errors))]
    ValidationFailed { errors: Vec<FieldError> },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::ValidationFailed { errors }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn username_taken() -> Self {
        Self::conflict(USERNAME_TAKEN)
    }

    pub fn email_taken() -> Self {
        Self::conflict(EMAIL_TAKEN)
    }

    pub fn owner_missing() -> Self {
        Self::conflict(OWNER_MISSING)
    }

    pub fn owner_immutable() -> Self {
        Self::conflict(OWNER_IMMUTABLE)
    }

    pub fn empty_patch() -> Self {
        Self::conflict(EMPTY_PATCH)
    }

    pub fn ad_not_found() -> Self {
        Self::not_found(AD_NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_every_field() {
        let err = DomainError::validation(vec![
            FieldError::missing("username"),
            FieldError::value("password", "Password is too short!"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: username: field required; password: Password is too short!"
        );
    }

    #[test]
    fn taxonomy_messages_are_stable() {
        assert_eq!(DomainError::ad_not_found().to_string(), "There is no such ad");
        assert_eq!(
            DomainError::owner_immutable(),
            DomainError::conflict("You cannot change the owner")
        );
        assert_eq!(FieldErrorKind::IntType.as_str(), "int_type");
    }
}
