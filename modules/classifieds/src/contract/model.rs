use chrono::{DateTime, Utc};

/// Stored user. `password_hash` is the hex SHA-256 digest, never the raw password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new user (raw password, hashed by the service)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Stored classified ad
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ad {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new ad
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAd {
    pub title: String,
    pub description: String,
    pub owner_id: i32,
}

/// Partial update of an ad. The owner is immutable and has no slot here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl AdPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}
