use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "QuickBite API",
        description = r#"
# QuickBite Food Delivery API

REST backend for a food-delivery marketplace: browse restaurants and menus,
place orders from a cart snapshot, and track each order through its delivery
lifecycle.

## Authentication

All order and account endpoints require a JWT. Include it in the
Authorization header:

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

Failures use a consistent body with a machine-readable `error` kind:

```json
{
  "error": "NOT_FOUND",
  "message": "restaurant 550e8400-e29b-41d4-a716-446655440000",
  "request_id": "0e8cbd4e-7b3f-4d2a-9c3e-1f2a6b7c8d90",
  "timestamp": "2025-11-02T10:30:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100)
query parameters.
        "#,
        contact(
            name = "QuickBite Engineering",
            email = "dev@quickbite.io",
            url = "https://quickbite.io"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "https://api.quickbite.io", description = "Production server"),
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "restaurants", description = "Restaurant catalog, menus, and reviews"),
        (name = "orders", description = "Order placement and lifecycle"),
        (name = "users", description = "Profiles and favorites"),
        (name = "health", description = "Health checks")
    ),
    paths(
        crate::auth::register,
        crate::auth::login,
        crate::auth::me,

        crate::handlers::restaurants::list_restaurants,
        crate::handlers::restaurants::get_restaurant,
        crate::handlers::restaurants::create_restaurant,
        crate::handlers::restaurants::update_restaurant,
        crate::handlers::restaurants::add_menu_item,
        crate::handlers::restaurants::update_menu_item,
        crate::handlers::restaurants::remove_menu_item,
        crate::handlers::restaurants::add_review,
        crate::handlers::restaurants::list_reviews,

        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::list_my_orders,
        crate::handlers::orders::list_restaurant_orders,
        crate::handlers::orders::update_order_status,

        crate::handlers::users::get_profile,
        crate::handlers::users::update_profile,
        crate::handlers::users::add_favorite,
        crate::handlers::users::remove_favorite,
        crate::handlers::users::list_favorites,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            crate::auth::RegisterRequest,
            crate::auth::LoginRequest,
            crate::auth::AuthResponse,
            crate::handlers::users::UserProfile,
            crate::services::users::UpdateProfileRequest,

            crate::services::restaurants::CreateRestaurantRequest,
            crate::services::restaurants::UpdateRestaurantRequest,
            crate::services::restaurants::MenuItemRequest,
            crate::services::restaurants::UpdateMenuItemRequest,
            crate::services::restaurants::ReviewRequest,
            crate::services::restaurants::RestaurantResponse,
            crate::services::restaurants::RestaurantDetailResponse,
            crate::services::restaurants::MenuItemResponse,
            crate::services::restaurants::ReviewResponse,

            crate::services::orders::CreateOrderRequest,
            crate::services::orders::OrderItemRequest,
            crate::services::orders::Address,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::handlers::orders::UpdateOrderStatusRequest,
            crate::entities::order::OrderStatus,
            crate::entities::order::PaymentStatus,
            crate::entities::order::PaymentMethod,
            crate::entities::user::UserRole,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
