pub mod orders;
pub mod restaurants;
pub mod users;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9()\- ]{7,20}$").expect("phone pattern is a valid regex")
});

/// Shared phone validation for request DTOs across handler and auth modules.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("must be a valid phone number".into());
        Err(err)
    }
}

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<crate::services::orders::OrderService>,
    pub restaurants: Arc<crate::services::restaurants::RestaurantService>,
    pub users: Arc<crate::services::users::UserService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            event_sender,
            config.tax_rate_decimal(),
            config.estimated_delivery_minutes,
        ));
        let restaurants = Arc::new(crate::services::restaurants::RestaurantService::new(
            db_pool.clone(),
        ));
        let users = Arc::new(crate::services::users::UserService::new(db_pool));

        Self {
            orders,
            restaurants,
            users,
        }
    }
}
