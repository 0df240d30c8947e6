use async_trait::async_trait;
use thiserror::Error;

use crate::contract::model::{Ad, AdPatch, NewAd, User};

/// Failures a repository reports to the domain.
/// Constraint outcomes are typed; everything else is opaque.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("email already taken")]
    EmailTaken,

    #[error("owner {0} does not exist")]
    OwnerMissing(i32),

    #[error("ad {0} does not exist")]
    AdMissing(i32),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// A user row ready to be stored: validated, password already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

/// Port for user persistence.
/// Each call runs in its own transaction.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Check username then email for existing rows and insert.
    /// A unique constraint hit at insert time is reported the same way.
    async fn create(&self, rec: UserRecord) -> RepoResult<User>;

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<User>>;
}

/// Port for ad persistence.
/// Each call runs in its own transaction.
#[async_trait]
pub trait AdsRepository: Send + Sync {
    /// Insert; an unknown owner is `OwnerMissing`.
    async fn create(&self, ad: NewAd) -> RepoResult<Ad>;

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<Ad>>;

    /// Write only the supplied fields; `AdMissing` if no row matched.
    async fn update(&self, id: i32, patch: AdPatch) -> RepoResult<Ad>;

    /// `AdMissing` if no row was deleted.
    async fn delete(&self, id: i32) -> RepoResult<()>;
}
