use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    response::Json,
    Extension,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::rest::dto::{
    AdCreatedDto, AdDto, CreateAdReq, CreateUserReq, DeletedDto, ErrorEnvelope, UpdateAdReq,
    UserCreatedDto,
};
use crate::api::rest::error::ApiError;
use crate::domain::error::DomainError;
use crate::domain::service::Service;
use crate::domain::validation;

/// Unwrap a JSON body; unreadable bodies are a validation failure on `body`.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| validation::body_error(rejection.body_text()).into())
}

/// Path ids that are not integers cannot name an ad.
fn ad_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DomainError::ad_not_found().into())
}

fn log_failure(op: &str, e: &DomainError) {
    if !matches!(e, DomainError::Database { .. }) {
        warn!("{} rejected: {}", op, e);
    }
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users/",
    tag = "users",
    request_body = CreateUserReq,
    responses(
        (status = 200, description = "User created", body = UserCreatedDto),
        (status = 400, description = "Validation failure or conflict", body = ErrorEnvelope),
    )
)]
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserCreatedDto>, ApiError> {
    let payload = json_body(body)?;
    let new_user = validation::parse_new_user(&payload, svc.config()).inspect_err(|e| {
        log_failure("create_user", e);
    })?;
    info!("Creating user: {}", new_user.username);

    match svc.create_user(new_user).await {
        Ok(user) => Ok(Json(UserCreatedDto::from(user))),
        Err(e) => {
            log_failure("create_user", &e);
            Err(e.into())
        }
    }
}

/// Create an ad
#[utoipa::path(
    post,
    path = "/ads/",
    tag = "ads",
    request_body = CreateAdReq,
    responses(
        (status = 200, description = "Ad created", body = AdCreatedDto),
        (status = 400, description = "Validation failure or unknown owner", body = ErrorEnvelope),
    )
)]
pub async fn create_ad(
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AdCreatedDto>, ApiError> {
    let payload = json_body(body)?;
    let new_ad = validation::parse_new_ad(&payload, svc.config()).inspect_err(|e| {
        log_failure("create_ad", e);
    })?;
    info!("Creating ad for owner {}", new_ad.owner_id);

    match svc.create_ad(new_ad).await {
        Ok(ad) => Ok(Json(AdCreatedDto::from(ad))),
        Err(e) => {
            log_failure("create_ad", &e);
            Err(e.into())
        }
    }
}

/// Get an ad by id
#[utoipa::path(
    get,
    path = "/ads/{id}/",
    tag = "ads",
    params(("id" = i32, Path, description = "Ad id")),
    responses(
        (status = 200, description = "Ad found", body = AdDto),
        (status = 404, description = "No such ad", body = ErrorEnvelope),
    )
)]
pub async fn get_ad(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<Json<AdDto>, ApiError> {
    info!("Getting ad with id: {}", id);
    let id = ad_id(&id)?;

    match svc.get_ad(id).await {
        Ok(ad) => Ok(Json(AdDto::from(ad))),
        Err(e) => {
            log_failure("get_ad", &e);
            Err(e.into())
        }
    }
}

/// Partially update an ad
#[utoipa::path(
    patch,
    path = "/ads/{id}/",
    tag = "ads",
    params(("id" = i32, Path, description = "Ad id")),
    request_body = UpdateAdReq,
    responses(
        (status = 200, description = "Updated ad", body = AdDto),
        (status = 400, description = "Owner change, empty patch or invalid field", body = ErrorEnvelope),
        (status = 404, description = "No such ad", body = ErrorEnvelope),
    )
)]
pub async fn update_ad(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AdDto>, ApiError> {
    info!("Updating ad with id: {}", id);
    let payload = json_body(body)?;
    let patch = validation::parse_ad_patch(&payload, svc.config()).inspect_err(|e| {
        log_failure("update_ad", e);
    })?;
    let id = ad_id(&id)?;

    match svc.update_ad(id, patch).await {
        Ok(ad) => Ok(Json(AdDto::from(ad))),
        Err(e) => {
            log_failure("update_ad", &e);
            Err(e.into())
        }
    }
}

/// Delete an ad
#[utoipa::path(
    delete,
    path = "/ads/{id}/",
    tag = "ads",
    params(("id" = i32, Path, description = "Ad id")),
    responses(
        (status = 200, description = "Ad deleted", body = DeletedDto),
        (status = 404, description = "No such ad", body = ErrorEnvelope),
    )
)]
pub async fn delete_ad(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedDto>, ApiError> {
    info!("Deleting ad: {}", id);
    let id = ad_id(&id)?;

    match svc.delete_ad(id).await {
        Ok(()) => Ok(Json(DeletedDto::success())),
        Err(e) => {
            log_failure("delete_ad", &e);
            Err(e.into())
        }
    }
}
