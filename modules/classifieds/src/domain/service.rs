use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::contract::model::{Ad, AdPatch, NewAd, NewUser, User};
use crate::domain::error::DomainError;
use crate::domain::password::hash_password;
use crate::domain::repo::{AdsRepository, RepoError, UserRecord, UsersRepository};
use crate::domain::validation;

/// Domain service with the rules for users and ads.
/// Depends only on the repository ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    users: Arc<dyn UsersRepository>,
    ads: Arc<dyn AdsRepository>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub min_password_length: usize,
    pub max_username_length: usize,
    pub max_email_length: usize,
    pub max_title_length: usize,
    pub max_description_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            max_username_length: 100,
            max_email_length: 50,
            max_title_length: 100,
            max_description_length: 100,
        }
    }
}

impl Service {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        ads: Arc<dyn AdsRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self { users, ads, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[instrument(
        name = "classifieds.service.create_user",
        skip(self, new_user),
        fields(username = %new_user.username)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        let errors = validation::check_new_user(&new_user, &self.config);
        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }

        let record = UserRecord {
            username: new_user.username,
            password_hash: hash_password(&new_user.password),
            email: new_user.email,
        };
        let user = self.users.create(record).await.map_err(map_repo_error)?;

        info!(user_id = user.id, "Successfully created user");
        Ok(user)
    }

    #[instrument(name = "classifieds.service.get_user", skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: i32) -> Result<Option<User>, DomainError> {
        debug!("Getting user by id");
        self.users.find_by_id(id).await.map_err(map_repo_error)
    }

    #[instrument(
        name = "classifieds.service.create_ad",
        skip(self, new_ad),
        fields(owner_id = new_ad.owner_id)
    )]
    pub async fn create_ad(&self, new_ad: NewAd) -> Result<Ad, DomainError> {
        info!("Creating new ad");

        let errors = validation::check_new_ad(&new_ad, &self.config);
        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }

        let ad = self.ads.create(new_ad).await.map_err(map_repo_error)?;
        info!(ad_id = ad.id, "Successfully created ad");
        Ok(ad)
    }

    #[instrument(name = "classifieds.service.get_ad", skip(self), fields(ad_id = id))]
    pub async fn get_ad(&self, id: i32) -> Result<Ad, DomainError> {
        debug!("Getting ad by id");
        self.ads
            .find_by_id(id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(DomainError::ad_not_found)
    }

    #[instrument(name = "classifieds.service.update_ad", skip(self, patch), fields(ad_id = id))]
    pub async fn update_ad(&self, id: i32, patch: AdPatch) -> Result<Ad, DomainError> {
        info!("Updating ad");

        let patch = validation::normalize_patch(patch, &self.config)?;
        let ad = self.ads.update(id, patch).await.map_err(map_repo_error)?;

        info!("Successfully updated ad");
        Ok(ad)
    }

    #[instrument(name = "classifieds.service.delete_ad", skip(self), fields(ad_id = id))]
    pub async fn delete_ad(&self, id: i32) -> Result<(), DomainError> {
        info!("Deleting ad");
        self.ads.delete(id).await.map_err(map_repo_error)?;
        info!("Successfully deleted ad");
        Ok(())
    }
}

fn map_repo_error(e: RepoError) -> DomainError {
    match e {
        RepoError::UsernameTaken => DomainError::username_taken(),
        RepoError::EmailTaken => DomainError::email_taken(),
        RepoError::OwnerMissing(_) => DomainError::owner_missing(),
        RepoError::AdMissing(_) => DomainError::ad_not_found(),
        RepoError::Other(e) => {
            error!(error = ?e, "Repository failure");
            DomainError::database(format!("{e:#}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{FieldErrorKind, AD_NOT_FOUND, EMPTY_PATCH, OWNER_MISSING};
    use crate::domain::repo::RepoResult;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// In-memory port implementation; records what reached persistence.
    #[derive(Default)]
    struct FakeRepo {
        users: Mutex<Vec<User>>,
        ads: Mutex<Vec<Ad>>,
        fail: bool,
    }

    #[async_trait]
    impl UsersRepository for FakeRepo {
        async fn create(&self, rec: UserRecord) -> RepoResult<User> {
            if self.fail {
                return Err(anyhow::anyhow!("connection refused").into());
            }
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.username == rec.username) {
                return Err(RepoError::UsernameTaken);
            }
            if users.iter().any(|u| u.email == rec.email) {
                return Err(RepoError::EmailTaken);
            }
            let user = User {
                id: users.len() as i32 + 1,
                username: rec.username,
                password_hash: rec.password_hash,
                email: rec.email,
                created_at: Utc::now(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: i32) -> RepoResult<Option<User>> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }
    }

    #[async_trait]
    impl AdsRepository for FakeRepo {
        async fn create(&self, ad: NewAd) -> RepoResult<Ad> {
            if !self.users.lock().unwrap().iter().any(|u| u.id == ad.owner_id) {
                return Err(RepoError::OwnerMissing(ad.owner_id));
            }
            let mut ads = self.ads.lock().unwrap();
            let ad = Ad {
                id: ads.len() as i32 + 1,
                title: ad.title,
                description: ad.description,
                owner_id: ad.owner_id,
                created_at: Utc::now(),
            };
            ads.push(ad.clone());
            Ok(ad)
        }

        async fn find_by_id(&self, id: i32) -> RepoResult<Option<Ad>> {
            Ok(self.ads.lock().unwrap().iter().find(|a| a.id == id).cloned())
        }

        async fn update(&self, id: i32, patch: AdPatch) -> RepoResult<Ad> {
            let mut ads = self.ads.lock().unwrap();
            let ad = ads
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(RepoError::AdMissing(id))?;
            if let Some(t) = patch.title {
                ad.title = t;
            }
            if let Some(d) = patch.description {
                ad.description = d;
            }
            Ok(ad.clone())
        }

        async fn delete(&self, id: i32) -> RepoResult<()> {
            let mut ads = self.ads.lock().unwrap();
            let before = ads.len();
            ads.retain(|a| a.id != id);
            if ads.len() == before {
                return Err(RepoError::AdMissing(id));
            }
            Ok(())
        }
    }

    fn service_with(repo: FakeRepo) -> (Service, Arc<FakeRepo>) {
        let repo = Arc::new(repo);
        let svc = Service::new(repo.clone(), repo.clone(), ServiceConfig::default());
        (svc, repo)
    }

    fn alice() -> NewUser {
        NewUser {
            username: "alice".into(),
            password: "longenough1".into(),
            email: "alice@example.com".into(),
        }
    }

    #[tokio::test]
    async fn password_is_hashed_before_persistence() {
        let (svc, repo) = service_with(FakeRepo::default());
        let user = svc.create_user(alice()).await.unwrap();

        assert_eq!(user.password_hash, hash_password("longenough1"));
        assert!(repo
            .users
            .lock()
            .unwrap()
            .iter()
            .all(|u| u.password_hash != "longenough1"));
    }

    #[tokio::test]
    async fn invalid_user_never_reaches_the_repository() {
        let (svc, repo) = service_with(FakeRepo::default());
        let err = svc
            .create_user(NewUser {
                password: "short".into(),
                ..alice()
            })
            .await
            .unwrap_err();

        match err {
            DomainError::ValidationFailed { errors } => {
                assert_eq!(errors[0].kind, FieldErrorKind::ValueError)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(repo.users.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repo_conflicts_map_to_taxonomy() {
        let (svc, _) = service_with(FakeRepo::default());
        svc.create_user(alice()).await.unwrap();

        let dup_name = svc
            .create_user(NewUser {
                email: "other@example.com".into(),
                ..alice()
            })
            .await
            .unwrap_err();
        assert_eq!(dup_name, DomainError::username_taken());

        let dup_email = svc
            .create_user(NewUser {
                username: "bob".into(),
                ..alice()
            })
            .await
            .unwrap_err();
        assert_eq!(dup_email, DomainError::email_taken());

        let orphan = svc
            .create_ad(NewAd {
                title: "Bike".into(),
                description: "Red".into(),
                owner_id: 99,
            })
            .await
            .unwrap_err();
        assert_eq!(orphan, DomainError::conflict(OWNER_MISSING));
    }

    #[tokio::test]
    async fn ad_lifecycle_through_ports() {
        let (svc, _) = service_with(FakeRepo::default());
        let owner = svc.create_user(alice()).await.unwrap();
        let ad = svc
            .create_ad(NewAd {
                title: "Bike".into(),
                description: "Red".into(),
                owner_id: owner.id,
            })
            .await
            .unwrap();

        let updated = svc
            .update_ad(
                ad.id,
                AdPatch {
                    title: None,
                    description: Some("Blue".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Bike");
        assert_eq!(updated.description, "Blue");

        let empty = svc.update_ad(ad.id, AdPatch::default()).await.unwrap_err();
        assert_eq!(empty, DomainError::conflict(EMPTY_PATCH));

        svc.delete_ad(ad.id).await.unwrap();
        assert_eq!(
            svc.get_ad(ad.id).await.unwrap_err(),
            DomainError::not_found(AD_NOT_FOUND)
        );
        assert_eq!(svc.delete_ad(ad.id).await.unwrap_err(), DomainError::ad_not_found());
    }

    #[tokio::test]
    async fn unexpected_repo_failure_is_a_database_error() {
        let (svc, _) = service_with(FakeRepo {
            fail: true,
            ..Default::default()
        });
        let err = svc.create_user(alice()).await.unwrap_err();
        assert!(matches!(err, DomainError::Database { .. }));
    }
}
