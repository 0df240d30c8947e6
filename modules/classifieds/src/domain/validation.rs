//! Coercion of raw JSON payloads into typed records, plus the field rules the
//! service re-applies to typed records handed to it directly.
//!
//! Every failing field is collected; nothing short-circuits on the first error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::contract::model::{AdPatch, NewAd, NewUser};
use crate::domain::error::{DomainError, FieldError, FieldErrorKind};
use crate::domain::service::ServiceConfig;

/// One `@`, non-empty local part, domain with at least one inner dot.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
});

pub const PASSWORD_TOO_SHORT: &str = "Password is too short!";
pub const INVALID_EMAIL: &str = "This is not a valid email";

/// Validation failure for a request body that is not a JSON object.
pub fn body_error(msg: impl Into<String>) -> DomainError {
    DomainError::validation(vec![FieldError::value("body", msg)])
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, DomainError> {
    body.as_object()
        .ok_or_else(|| body_error("Expected a JSON object"))
}

// --- field rules ---

pub fn check_length(field: &str, value: &str, max: usize) -> Option<FieldError> {
    (value.chars().count() > max).then(|| {
        FieldError::value(
            field,
            format!("ensure this value has at most {max} characters"),
        )
    })
}

pub fn check_not_blank(field: &str, value: &str) -> Option<FieldError> {
    value
        .trim()
        .is_empty()
        .then(|| FieldError::value(field, "field must not be blank"))
}

pub fn check_password(password: &str, cfg: &ServiceConfig) -> Option<FieldError> {
    (password.chars().count() < cfg.min_password_length)
        .then(|| FieldError::value("password", PASSWORD_TOO_SHORT))
}

pub fn check_email(email: &str, cfg: &ServiceConfig) -> Option<FieldError> {
    if !EMAIL_RE.is_match(email) {
        return Some(FieldError::value("email", INVALID_EMAIL));
    }
    check_length("email", email, cfg.max_email_length)
}

/// Rules for a typed user record.
pub fn check_new_user(user: &NewUser, cfg: &ServiceConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();
    errors.extend(
        check_not_blank("username", &user.username)
            .or_else(|| check_length("username", &user.username, cfg.max_username_length)),
    );
    errors.extend(check_password(&user.password, cfg));
    errors.extend(check_email(&user.email, cfg));
    errors
}

/// Rules for a typed ad record. Owner existence is a persistence concern.
pub fn check_new_ad(ad: &NewAd, cfg: &ServiceConfig) -> Vec<FieldError> {
    let mut errors = Vec::new();
    errors.extend(
        check_not_blank("title", &ad.title)
            .or_else(|| check_length("title", &ad.title, cfg.max_title_length)),
    );
    errors.extend(
        check_not_blank("description", &ad.description)
            .or_else(|| check_length("description", &ad.description, cfg.max_description_length)),
    );
    errors
}

/// Drops blank fields from a patch and checks the remaining ones.
/// A patch left with nothing to change is a conflict.
pub fn normalize_patch(patch: AdPatch, cfg: &ServiceConfig) -> Result<AdPatch, DomainError> {
    let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let patch = AdPatch {
        title: keep(patch.title),
        description: keep(patch.description),
    };

    let mut errors = Vec::new();
    if let Some(title) = &patch.title {
        errors.extend(check_length("title", title, cfg.max_title_length));
    }
    if let Some(description) = &patch.description {
        errors.extend(check_length(
            "description",
            description,
            cfg.max_description_length,
        ));
    }
    if !errors.is_empty() {
        return Err(DomainError::validation(errors));
    }
    if patch.is_empty() {
        return Err(DomainError::empty_patch());
    }
    Ok(patch)
}

// --- coercion ---

fn required_text(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing(field));
            None
        }
        Some(Value::String(s)) => match check_not_blank(field, s) {
            Some(e) => {
                errors.push(e);
                None
            }
            None => Some(s.clone()),
        },
        Some(_) => {
            errors.push(FieldError::new(
                field,
                FieldErrorKind::StringType,
                "str type expected",
            ));
            None
        }
    }
}

fn required_int(obj: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<i32> {
    let parsed = match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing(field));
            return None;
        }
        Some(Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<i32>().ok(),
        Some(_) => None,
    };
    if parsed.is_none() {
        errors.push(FieldError::new(
            field,
            FieldErrorKind::IntType,
            "value is not a valid integer",
        ));
    }
    parsed
}

/// Absent, null and empty strings all mean "not supplied".
fn optional_text(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::new(
                field,
                FieldErrorKind::StringType,
                "str type expected",
            ));
            None
        }
    }
}

/// `{username, password, email}` → `NewUser`
pub fn parse_new_user(body: &Value, cfg: &ServiceConfig) -> Result<NewUser, DomainError> {
    let obj = as_object(body)?;
    let mut errors = Vec::new();

    let username = required_text(obj, "username", &mut errors);
    if let Some(u) = &username {
        errors.extend(check_length("username", u, cfg.max_username_length));
    }
    let password = required_text(obj, "password", &mut errors);
    if let Some(p) = &password {
        errors.extend(check_password(p, cfg));
    }
    let email = required_text(obj, "email", &mut errors);
    if let Some(e) = &email {
        errors.extend(check_email(e, cfg));
    }

    match (username, password, email) {
        (Some(username), Some(password), Some(email)) if errors.is_empty() => Ok(NewUser {
            username,
            password,
            email,
        }),
        _ => Err(DomainError::validation(errors)),
    }
}

/// `{title, description, owner_id}` → `NewAd`
pub fn parse_new_ad(body: &Value, cfg: &ServiceConfig) -> Result<NewAd, DomainError> {
    let obj = as_object(body)?;
    let mut errors = Vec::new();

    let title = required_text(obj, "title", &mut errors);
    if let Some(t) = &title {
        errors.extend(check_length("title", t, cfg.max_title_length));
    }
    let description = required_text(obj, "description", &mut errors);
    if let Some(d) = &description {
        errors.extend(check_length("description", d, cfg.max_description_length));
    }
    let owner_id = required_int(obj, "owner_id", &mut errors);

    match (title, description, owner_id) {
        (Some(title), Some(description), Some(owner_id)) if errors.is_empty() => Ok(NewAd {
            title,
            description,
            owner_id,
        }),
        _ => Err(DomainError::validation(errors)),
    }
}

/// `{title?, description?}` → `AdPatch`.
/// Any owner key is refused before the other fields are looked at.
pub fn parse_ad_patch(body: &Value, cfg: &ServiceConfig) -> Result<AdPatch, DomainError> {
    let obj = as_object(body)?;
    if obj.contains_key("owner") || obj.contains_key("owner_id") {
        return Err(DomainError::owner_immutable());
    }

    let mut errors = Vec::new();
    let title = optional_text(obj, "title", &mut errors);
    let description = optional_text(obj, "description", &mut errors);
    if !errors.is_empty() {
        return Err(DomainError::validation(errors));
    }

    normalize_patch(AdPatch { title, description }, cfg)
}
