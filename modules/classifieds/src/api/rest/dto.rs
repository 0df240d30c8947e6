use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{Ad, User};
use crate::domain::error::FieldError;

// Request bodies are coerced from raw JSON by the validation layer; these
// types document the accepted shapes.

/// Body of `POST /users/`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserReq {
    pub username: String,
    /// At least 8 characters
    pub password: String,
    pub email: String,
}

/// Body of `POST /ads/`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAdReq {
    pub title: String,
    pub description: String,
    /// Integer or numeric string; must reference an existing user
    pub owner_id: i32,
}

/// Body of `PATCH /ads/{id}/`; at least one field, never `owner`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateAdReq {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreatedDto {
    pub status: String,
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdCreatedDto {
    pub status: String,
    pub id: i32,
    pub owner: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AdDto {
    pub id: i32,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedDto {
    #[serde(rename = "Status")]
    pub status: String,
}

/// One failing field: `{"loc": [field], "msg": ..., "type": ...}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FieldErrorDto {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldErrorDto>),
}

/// Error envelope: `{"Error": <message or field errors>}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorEnvelope {
    #[serde(rename = "Error")]
    pub error: ErrorDetail,
}

const OK: &str = "OK";

impl From<User> for UserCreatedDto {
    fn from(user: User) -> Self {
        Self {
            status: OK.to_string(),
            id: user.id,
            username: user.username,
        }
    }
}

impl From<Ad> for AdCreatedDto {
    fn from(ad: Ad) -> Self {
        Self {
            status: OK.to_string(),
            id: ad.id,
            owner: ad.owner_id,
        }
    }
}

impl From<Ad> for AdDto {
    fn from(ad: Ad) -> Self {
        Self {
            id: ad.id,
            title: ad.title,
            description: ad.description,
        }
    }
}

impl DeletedDto {
    pub fn success() -> Self {
        Self {
            status: "deletion successful".to_string(),
        }
    }
}

impl From<FieldError> for FieldErrorDto {
    fn from(e: FieldError) -> Self {
        Self {
            loc: vec![e.field],
            msg: e.msg,
            kind: e.kind.as_str().to_string(),
        }
    }
}
