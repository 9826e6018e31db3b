use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::entities::order::OrderStatus;
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderRequest, OrderListResponse, OrderResponse};
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// Target status, e.g. `confirmed` or `out_for_delivery`.
    pub status: String,
}

fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    raw.trim()
        .to_ascii_lowercase()
        .parse::<OrderStatus>()
        .map_err(|_| ServiceError::ValidationError(format!("unknown order status: {raw}")))
}

fn to_page(result: OrderListResponse) -> PaginatedResponse<OrderResponse> {
    let total_pages = result.total.div_ceil(result.per_page.max(1));
    PaginatedResponse {
        items: result.orders,
        total: result.total,
        page: result.page,
        limit: result.per_page,
        total_pages,
    }
}

/// Place an order from a submitted cart
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Empty cart, bad quantities, or foreign menu items", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
        (status = 404, description = "Restaurant not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders",
    security(("bearer_auth" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let order = state
        .services
        .orders
        .create_order(auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Move an order along its lifecycle
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 403, description = "Caller does not own the restaurant", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Transition not allowed from the current status", body = crate::errors::ErrorResponse)
    ),
    tag = "orders",
    security(("bearer_auth" = []))
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let new_status = parse_status(&request.status)?;
    let order = state
        .services
        .orders
        .update_status(id, &auth_user, new_status)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Fetch one order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order details", body = OrderResponse),
        (status = 403, description = "Caller is not a party to this order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders",
    security(("bearer_auth" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.get_order(id, &auth_user).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// List the caller's own orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Orders, newest first", body = ApiResponse<PaginatedResponse<OrderResponse>>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    ),
    tag = "orders",
    security(("bearer_auth" = []))
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>, ServiceError> {
    let per_page = query.limit.clamp(1, 100);
    let result = state
        .services
        .orders
        .list_orders_for_user(auth_user.user_id, query.page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(to_page(result))))
}

/// List orders placed against the caller's restaurants
#[utoipa::path(
    get,
    path = "/api/v1/orders/restaurant",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Incoming orders, newest first", body = ApiResponse<PaginatedResponse<OrderResponse>>),
        (status = 403, description = "Caller owns no restaurant", body = crate::errors::ErrorResponse)
    ),
    tag = "orders",
    security(("bearer_auth" = []))
)]
pub async fn list_restaurant_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>, ServiceError> {
    let per_page = query.limit.clamp(1, 100);
    let result = state
        .services
        .orders
        .list_orders_for_restaurant(&auth_user, query.page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(to_page(result))))
}

pub fn order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_my_orders))
        .route("/restaurant", get(list_restaurant_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
        .with_auth(state)
}
