//! SeaORM-backed implementations of the repository ports.
//!
//! Generic over `C: ConnectionTrait + TransactionTrait`, so a repository can be
//! built on a `DatabaseConnection` or on an outer transaction. Every write
//! opens its own (nested) transaction; dropping it without `commit` rolls back.
//! Single-row reads run as one statement.
//!
//! The first statement of every write transaction is the write itself. A
//! deferred SQLite transaction that reads first cannot be upgraded to a writer
//! after another connection commits (`SQLITE_BUSY_SNAPSHOT`), so pre-checks run
//! outside the transaction and the constraints are classified at write time.

use anyhow::Context;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};

use crate::contract::model::{Ad, AdPatch, NewAd, User};
use crate::domain::repo::{AdsRepository, RepoError, RepoResult, UserRecord, UsersRepository};
use crate::infra::storage::entity::{ads, users};

/// Translate a write failure into the typed constraint outcomes.
fn classify_write_error(err: DbErr, owner_id: Option<i32>, op: &'static str) -> RepoError {
    match (err.sql_err(), owner_id) {
        (Some(SqlErr::UniqueConstraintViolation(msg)), _) => {
            if msg.to_ascii_lowercase().contains("email") {
                RepoError::EmailTaken
            } else {
                RepoError::UsernameTaken
            }
        }
        (Some(SqlErr::ForeignKeyConstraintViolation(_)), Some(owner)) => {
            RepoError::OwnerMissing(owner)
        }
        _ => RepoError::Other(anyhow::Error::new(err).context(op)),
    }
}

/// Users repository.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn create(&self, rec: UserRecord) -> RepoResult<User> {
        // Username is reported before email when both are taken.
        let same_name = users::Entity::find()
            .filter(users::Column::Username.eq(rec.username.as_str()))
            .count(&self.conn)
            .await
            .context("username lookup failed")?;
        if same_name > 0 {
            return Err(RepoError::UsernameTaken);
        }

        let same_email = users::Entity::find()
            .filter(users::Column::Email.eq(rec.email.as_str()))
            .count(&self.conn)
            .await
            .context("email lookup failed")?;
        if same_email > 0 {
            return Err(RepoError::EmailTaken);
        }

        let txn = self.conn.begin().await.context("begin failed")?;
        let m = users::ActiveModel {
            username: Set(rec.username),
            password: Set(rec.password_hash),
            email: Set(rec.email),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let created = m
            .insert(&txn)
            .await
            .map_err(|e| classify_write_error(e, None, "insert user failed"))?;

        txn.commit().await.context("commit failed")?;
        Ok(created.into())
    }

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<User>> {
        let found = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find user failed")?;
        Ok(found.map(Into::into))
    }
}

/// Ads repository.
pub struct SeaOrmAdsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmAdsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> AdsRepository for SeaOrmAdsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn create(&self, ad: NewAd) -> RepoResult<Ad> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let owner_id = ad.owner_id;
        let m = ads::ActiveModel {
            title: Set(ad.title),
            description: Set(ad.description),
            owner_id: Set(owner_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let created = m
            .insert(&txn)
            .await
            .map_err(|e| classify_write_error(e, Some(owner_id), "insert ad failed"))?;

        txn.commit().await.context("commit failed")?;
        Ok(created.into())
    }

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<Ad>> {
        let found = ads::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find ad failed")?;
        Ok(found.map(Into::into))
    }

    async fn update(&self, id: i32, patch: AdPatch) -> RepoResult<Ad> {
        if patch.is_empty() {
            return self.find_by_id(id).await?.ok_or(RepoError::AdMissing(id));
        }

        let txn = self.conn.begin().await.context("begin failed")?;

        let mut stmt = ads::Entity::update_many().filter(ads::Column::Id.eq(id));
        if let Some(title) = patch.title {
            stmt = stmt.col_expr(ads::Column::Title, Expr::value(title));
        }
        if let Some(description) = patch.description {
            stmt = stmt.col_expr(ads::Column::Description, Expr::value(description));
        }
        let res = stmt
            .exec(&txn)
            .await
            .map_err(|e| classify_write_error(e, None, "update ad failed"))?;
        if res.rows_affected == 0 {
            return Err(RepoError::AdMissing(id));
        }

        let updated = ads::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("reload ad failed")?
            .ok_or(RepoError::AdMissing(id))?;

        txn.commit().await.context("commit failed")?;
        Ok(updated.into())
    }

    async fn delete(&self, id: i32) -> RepoResult<()> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let res = ads::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete ad failed")?;
        if res.rows_affected == 0 {
            return Err(RepoError::AdMissing(id));
        }

        txn.commit().await.context("commit failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::migrations::Migrator;
    use sea_orm::{DatabaseConnection, RuntimeErr};
    use sea_orm_migration::MigratorTrait;

    async fn migrated() -> DatabaseConnection {
        let db = db::DbHandle::connect("sqlite::memory:", db::ConnectOpts::default())
            .await
            .unwrap();
        Migrator::up(db.seaorm(), None).await.unwrap();
        db.sea()
    }

    fn user_row(name: &str, email: &str) -> users::ActiveModel {
        users::ActiveModel {
            username: Set(name.to_string()),
            password: Set("digest".to_string()),
            email: Set(email.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn insert_time_violations_are_typed() {
        let conn = migrated().await;
        user_row("alice", "a@x.com").insert(&conn).await.unwrap();

        let dup_name = user_row("alice", "b@x.com").insert(&conn).await.unwrap_err();
        assert!(matches!(
            classify_write_error(dup_name, None, "insert user failed"),
            RepoError::UsernameTaken
        ));

        let dup_email = user_row("bob", "a@x.com").insert(&conn).await.unwrap_err();
        assert!(matches!(
            classify_write_error(dup_email, None, "insert user failed"),
            RepoError::EmailTaken
        ));

        let orphan = ads::ActiveModel {
            title: Set("Bike".to_string()),
            description: Set("Red".to_string()),
            owner_id: Set(9),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&conn)
        .await
        .unwrap_err();
        assert!(matches!(
            classify_write_error(orphan, Some(9), "insert ad failed"),
            RepoError::OwnerMissing(9)
        ));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let conn = migrated().await;
        let repo = SeaOrmAdsRepository::new(conn.clone());
        let owner = user_row("alice", "a@x.com").insert(&conn).await.unwrap();
        let ad = repo
            .create(NewAd {
                title: "Bike".to_string(),
                description: "Red".to_string(),
                owner_id: owner.id,
            })
            .await
            .unwrap();

        let patch = AdPatch {
            title: None,
            description: Some("Blue".to_string()),
        };
        let updated = repo.update(ad.id, patch.clone()).await.unwrap();
        assert_eq!(updated.title, "Bike");
        assert_eq!(updated.description, "Blue");

        repo.delete(ad.id).await.unwrap();
        assert!(matches!(
            repo.delete(ad.id).await,
            Err(RepoError::AdMissing(id)) if id == ad.id
        ));
        assert!(matches!(
            repo.update(ad.id, patch).await,
            Err(RepoError::AdMissing(_))
        ));
        assert!(matches!(
            repo.update(ad.id, AdPatch::default()).await,
            Err(RepoError::AdMissing(_))
        ));
    }

    #[test]
    fn unrecognised_errors_stay_opaque() {
        let err = classify_write_error(
            DbErr::Query(RuntimeErr::Internal("boom".into())),
            Some(1),
            "insert ad failed",
        );
        match err {
            RepoError::Other(e) => assert!(format!("{e:#}").contains("insert ad failed")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
