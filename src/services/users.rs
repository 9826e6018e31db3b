use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{favorite, restaurant, user};
use crate::errors::ServiceError;

/// Profile patch. Only these three fields are writable through the API;
/// unknown keys are rejected so email, role, and password cannot ride in.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(custom = "crate::handlers::validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
}

/// Account profile and favorite-restaurant bookkeeping.
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))
    }

    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<user::Model, ServiceError> {
        request.validate()?;

        let model = self.get_profile(user_id).await?;
        let mut active: user::ActiveModel = model.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db_pool).await?;
        info!(user_id = %user_id, "profile updated");
        Ok(updated)
    }

    /// Marks a restaurant as a favorite. Fails with `Conflict` when it is
    /// already on the list.
    #[instrument(skip(self), fields(user_id = %user_id, restaurant_id = %restaurant_id))]
    pub async fn add_favorite(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        restaurant::Entity::find_by_id(restaurant_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("restaurant {restaurant_id}")))?;

        let existing = favorite::Entity::find_by_id((user_id, restaurant_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "restaurant is already in favorites".to_string(),
            ));
        }

        favorite::ActiveModel {
            user_id: Set(user_id),
            restaurant_id: Set(restaurant_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(user_id = %user_id, restaurant_id = %restaurant_id, "favorite added");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id, restaurant_id = %restaurant_id))]
    pub async fn remove_favorite(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> Result<(), ServiceError> {
        let result = favorite::Entity::delete_by_id((user_id, restaurant_id))
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "favorite restaurant {restaurant_id}"
            )));
        }
        info!(user_id = %user_id, restaurant_id = %restaurant_id, "favorite removed");
        Ok(())
    }

    /// Returns the user's favorite restaurants, most recently added first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_favorites(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<restaurant::Model>, ServiceError> {
        let db = &*self.db_pool;

        let favorites = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .order_by_desc(favorite::Column::CreatedAt)
            .all(db)
            .await?;
        if favorites.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = favorites.iter().map(|f| f.restaurant_id).collect();
        let mut restaurants = restaurant::Entity::find()
            .filter(restaurant::Column::Id.is_in(ids.clone()))
            .all(db)
            .await?;

        // Keep the favorites ordering rather than the table's.
        restaurants.sort_by_key(|r| ids.iter().position(|id| *id == r.id).unwrap_or(usize::MAX));
        Ok(restaurants)
    }
}
