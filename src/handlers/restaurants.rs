use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::errors::ServiceError;
use crate::services::restaurants::{
    CreateRestaurantRequest, MenuItemRequest, MenuItemResponse, RestaurantDetailResponse,
    RestaurantQuery, RestaurantResponse, ReviewRequest, ReviewResponse, UpdateMenuItemRequest,
    UpdateRestaurantRequest,
};
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

/// Browse restaurants
#[utoipa::path(
    get,
    path = "/api/v1/restaurants",
    params(
        RestaurantQuery,
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Matching restaurants", body = ApiResponse<PaginatedResponse<RestaurantResponse>>)
    ),
    tag = "restaurants"
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(filters): Query<RestaurantQuery>,
    Query(paging): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<RestaurantResponse>>>, ServiceError> {
    let per_page = paging.limit.clamp(1, 100);
    let result = state
        .services
        .restaurants
        .list(filters, paging.page, per_page)
        .await?;
    let total_pages = result.total.div_ceil(result.per_page.max(1));
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.restaurants,
        total: result.total,
        page: result.page,
        limit: result.per_page,
        total_pages,
    })))
}

/// Restaurant details with full menu
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Restaurant and menu", body = RestaurantDetailResponse),
        (status = 404, description = "Restaurant not found", body = crate::errors::ErrorResponse)
    ),
    tag = "restaurants"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RestaurantDetailResponse>>, ServiceError> {
    let detail = state.services.restaurants.get(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Open a new restaurant owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/restaurants",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant created", body = RestaurantResponse),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    ),
    tag = "restaurants",
    security(("bearer_auth" = []))
)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateRestaurantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RestaurantResponse>>), ServiceError> {
    let created = state
        .services
        .restaurants
        .create(&auth_user, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Update restaurant settings (owner only)
#[utoipa::path(
    put,
    path = "/api/v1/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = UpdateRestaurantRequest,
    responses(
        (status = 200, description = "Restaurant updated", body = RestaurantResponse),
        (status = 403, description = "Caller does not own the restaurant", body = crate::errors::ErrorResponse),
        (status = 404, description = "Restaurant not found", body = crate::errors::ErrorResponse)
    ),
    tag = "restaurants",
    security(("bearer_auth" = []))
)]
pub async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateRestaurantRequest>,
) -> Result<Json<ApiResponse<RestaurantResponse>>, ServiceError> {
    let updated = state
        .services
        .restaurants
        .update(id, &auth_user, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Add a dish to the menu (owner only)
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/menu",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = MenuItemRequest,
    responses(
        (status = 201, description = "Menu item added", body = MenuItemResponse),
        (status = 403, description = "Caller does not own the restaurant", body = crate::errors::ErrorResponse),
        (status = 404, description = "Restaurant not found", body = crate::errors::ErrorResponse)
    ),
    tag = "restaurants",
    security(("bearer_auth" = []))
)]
pub async fn add_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<MenuItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MenuItemResponse>>), ServiceError> {
    let item = state
        .services
        .restaurants
        .add_menu_item(id, &auth_user, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

/// Update a dish (owner only)
#[utoipa::path(
    put,
    path = "/api/v1/restaurants/{id}/menu/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Restaurant ID"),
        ("item_id" = Uuid, Path, description = "Menu item ID"),
    ),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItemResponse),
        (status = 403, description = "Caller does not own the restaurant", body = crate::errors::ErrorResponse),
        (status = 404, description = "Restaurant or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "restaurants",
    security(("bearer_auth" = []))
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    auth_user: AuthUser,
    Json(request): Json<UpdateMenuItemRequest>,
) -> Result<Json<ApiResponse<MenuItemResponse>>, ServiceError> {
    let item = state
        .services
        .restaurants
        .update_menu_item(id, item_id, &auth_user, request)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Remove a dish (owner only)
#[utoipa::path(
    delete,
    path = "/api/v1/restaurants/{id}/menu/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Restaurant ID"),
        ("item_id" = Uuid, Path, description = "Menu item ID"),
    ),
    responses(
        (status = 204, description = "Menu item removed"),
        (status = 403, description = "Caller does not own the restaurant", body = crate::errors::ErrorResponse),
        (status = 404, description = "Restaurant or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "restaurants",
    security(("bearer_auth" = []))
)]
pub async fn remove_menu_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .restaurants
        .remove_menu_item(id, item_id, &auth_user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Leave a review
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/reviews",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review recorded", body = ReviewResponse),
        (status = 400, description = "Rating outside 1..=5", body = crate::errors::ErrorResponse),
        (status = 404, description = "Restaurant not found", body = crate::errors::ErrorResponse)
    ),
    tag = "restaurants",
    security(("bearer_auth" = []))
)]
pub async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponse>>), ServiceError> {
    let review = state
        .services
        .restaurants
        .add_review(id, auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(review))))
}

/// Reviews for a restaurant, newest first
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Restaurant ID"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Reviews", body = ApiResponse<PaginatedResponse<ReviewResponse>>),
        (status = 404, description = "Restaurant not found", body = crate::errors::ErrorResponse)
    ),
    tag = "restaurants"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(paging): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<ReviewResponse>>>, ServiceError> {
    let per_page = paging.limit.clamp(1, 100);
    let result = state
        .services
        .restaurants
        .list_reviews(id, paging.page, per_page)
        .await?;
    let total_pages = result.total.div_ceil(result.per_page.max(1));
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: result.reviews,
        total: result.total,
        page: result.page,
        limit: result.per_page,
        total_pages,
    })))
}

pub fn restaurant_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_restaurant))
        .route("/:id", put(update_restaurant))
        .route("/:id/menu", post(add_menu_item))
        .route(
            "/:id/menu/:item_id",
            put(update_menu_item).delete(remove_menu_item),
        )
        .route("/:id/reviews", post(add_review))
        .with_auth(state);

    Router::new()
        .route("/", get(list_restaurants))
        .route("/:id", get(get_restaurant))
        .route("/:id/reviews", get(list_reviews))
        .merge(protected)
}
