use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;
use crate::services::restaurants::RestaurantResponse;
use crate::services::users::UpdateProfileRequest;
use crate::{ApiResponse, AppState};

/// Public view of an account. The password hash never leaves the entity
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    responses(
        (status = 200, description = "Current profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, ServiceError> {
    let model = state.services.users.get_profile(auth_user.user_id).await?;
    Ok(Json(ApiResponse::success(model.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Invalid field value", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ServiceError> {
    let model = state
        .services
        .users
        .update_profile(auth_user.user_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(model.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/favorites/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant to favorite")),
    responses(
        (status = 201, description = "Favorite added"),
        (status = 404, description = "Restaurant not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already a favorite", body = crate::errors::ErrorResponse)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .users
        .add_favorite(auth_user.user_id, restaurant_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(serde_json::json!({
            "restaurant_id": restaurant_id
        }))),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/favorites/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant to unfavorite")),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 404, description = "Not in favorites", body = crate::errors::ErrorResponse)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .users
        .remove_favorite(auth_user.user_id, restaurant_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/users/favorites",
    responses(
        (status = 200, description = "Favorite restaurants", body = Vec<RestaurantResponse>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<RestaurantResponse>>>, ServiceError> {
    let restaurants = state
        .services
        .users
        .list_favorites(auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(
        restaurants.into_iter().map(RestaurantResponse::from).collect(),
    )))
}

pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/favorites", get(list_favorites))
        .route(
            "/favorites/:restaurant_id",
            post(add_favorite).delete(remove_favorite),
        )
        .with_auth(state)
}
