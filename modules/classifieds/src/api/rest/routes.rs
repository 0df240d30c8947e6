use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    info(title = "Classifieds API", description = "Users and classified ads"),
    paths(
        handlers::create_user,
        handlers::create_ad,
        handlers::get_ad,
        handlers::update_ad,
        handlers::delete_ad,
    ),
    components(schemas(
        dto::CreateUserReq,
        dto::CreateAdReq,
        dto::UpdateAdReq,
        dto::UserCreatedDto,
        dto::AdCreatedDto,
        dto::AdDto,
        dto::DeletedDto,
        dto::ErrorEnvelope,
        dto::ErrorDetail,
        dto::FieldErrorDto,
    )),
    tags(
        (name = "users", description = "User registration"),
        (name = "ads", description = "Classified ads")
    )
)]
pub struct ApiDoc;

/// OpenAPI document for the routes registered by [`register_routes`].
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Mount the classifieds routes on `router`.
/// Every path answers both with and without the trailing slash.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let ad_item = || {
        get(handlers::get_ad)
            .patch(handlers::update_ad)
            .delete(handlers::delete_ad)
    };

    router
        .route("/users", post(handlers::create_user))
        .route("/users/", post(handlers::create_user))
        .route("/ads", post(handlers::create_ad))
        .route("/ads/", post(handlers::create_ad))
        .route("/ads/{id}", ad_item())
        .route("/ads/{id}/", ad_item())
        .layer(Extension(service))
}
