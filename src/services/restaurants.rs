use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::entities::user::UserRole;
use crate::entities::{menu_item, restaurant, review, user};
use crate::errors::ServiceError;

/// Filters accepted by the restaurant listing. All fields are optional and
/// combine with AND; `search` matches name or description.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RestaurantQuery {
    /// Comma-separated list of cuisines to include.
    pub cuisine: Option<String>,
    /// Lower bound on the average review rating.
    pub min_rating: Option<Decimal>,
    pub search: Option<String>,
    /// `rating`, `name`, or `delivery_time`.
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRestaurantRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub cuisine: String,
    #[validate(length(min = 1, max = 300))]
    pub address: String,
    #[validate(custom = "crate::handlers::validate_phone")]
    pub phone: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub delivery_fee: Decimal,
    pub minimum_order: Decimal,
    #[validate(range(min = 5, max = 240))]
    pub delivery_time_minutes: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRestaurantRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub cuisine: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub address: Option<String>,
    #[validate(custom = "crate::handlers::validate_phone")]
    pub phone: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub delivery_fee: Option<Decimal>,
    pub minimum_order: Option<Decimal>,
    #[validate(range(min = 5, max = 240))]
    pub delivery_time_minutes: Option<i32>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MenuItemRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMenuItemRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cuisine: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub rating: Decimal,
    pub review_count: i32,
    pub delivery_fee: Decimal,
    pub minimum_order: Decimal,
    pub delivery_time_minutes: i32,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

impl From<restaurant::Model> for RestaurantResponse {
    fn from(model: restaurant::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            description: model.description,
            cuisine: model.cuisine,
            address: model.address,
            phone: model.phone,
            image_url: model.image_url,
            rating: model.rating,
            review_count: model.review_count,
            delivery_fee: model.delivery_fee,
            minimum_order: model.minimum_order,
            delivery_time_minutes: model.delivery_time_minutes,
            is_open: model.is_open,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
}

impl From<menu_item::Model> for MenuItemResponse {
    fn from(model: menu_item::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            name: model.name,
            description: model.description,
            price: model.price,
            category: model.category,
            image_url: model.image_url,
            is_available: model.is_available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<review::Model> for ReviewResponse {
    fn from(model: review::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            restaurant_id: model.restaurant_id,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantDetailResponse {
    #[serde(flatten)]
    pub restaurant: RestaurantResponse,
    pub menu: Vec<MenuItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RestaurantListResponse {
    pub restaurants: Vec<RestaurantResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Catalog side of the marketplace: restaurants, their menus, and reviews.
pub struct RestaurantService {
    db_pool: Arc<DbPool>,
}

impl RestaurantService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists restaurants matching the query, paginated.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: RestaurantQuery,
        page: u64,
        per_page: u64,
    ) -> Result<RestaurantListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut filter = Condition::all();
        if let Some(cuisine) = &query.cuisine {
            let cuisines: Vec<String> = cuisine
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if !cuisines.is_empty() {
                filter = filter.add(restaurant::Column::Cuisine.is_in(cuisines));
            }
        }
        if let Some(min_rating) = query.min_rating {
            filter = filter.add(restaurant::Column::Rating.gte(min_rating));
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search);
            filter = filter.add(
                Condition::any()
                    .add(restaurant::Column::Name.like(&pattern))
                    .add(restaurant::Column::Description.like(&pattern)),
            );
        }

        let mut select = restaurant::Entity::find().filter(filter);
        select = match query.sort.as_deref() {
            Some("name") => select.order_by_asc(restaurant::Column::Name),
            Some("delivery_time") => select.order_by_asc(restaurant::Column::DeliveryTimeMinutes),
            _ => select.order_by_desc(restaurant::Column::Rating),
        };

        let paginator = select.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        Ok(RestaurantListResponse {
            restaurants: models.into_iter().map(RestaurantResponse::from).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Fetches one restaurant together with its full menu.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    pub async fn get(&self, restaurant_id: Uuid) -> Result<RestaurantDetailResponse, ServiceError> {
        let db = &*self.db_pool;

        let model = restaurant::Entity::find_by_id(restaurant_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("restaurant {restaurant_id}")))?;

        let menu = menu_item::Entity::find()
            .filter(menu_item::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(menu_item::Column::Category)
            .order_by_asc(menu_item::Column::Name)
            .all(db)
            .await?;

        Ok(RestaurantDetailResponse {
            restaurant: model.into(),
            menu: menu.into_iter().map(MenuItemResponse::from).collect(),
        })
    }

    /// Registers a new restaurant owned by the caller. A customer creating
    /// their first restaurant is promoted to the `restaurant_owner` role.
    #[instrument(skip(self, request), fields(owner_id = %owner.user_id, name = %request.name))]
    pub async fn create(
        &self,
        owner: &AuthUser,
        request: CreateRestaurantRequest,
    ) -> Result<RestaurantResponse, ServiceError> {
        request.validate()?;
        if request.delivery_fee < Decimal::ZERO || request.minimum_order < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "delivery fee and minimum order must not be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let restaurant_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start restaurant creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        let model = restaurant::ActiveModel {
            id: Set(restaurant_id),
            owner_id: Set(owner.user_id),
            name: Set(request.name),
            description: Set(request.description),
            cuisine: Set(request.cuisine),
            address: Set(request.address),
            phone: Set(request.phone),
            image_url: Set(request.image_url),
            rating: Set(Decimal::ZERO),
            review_count: Set(0),
            delivery_fee: Set(request.delivery_fee),
            minimum_order: Set(request.minimum_order),
            delivery_time_minutes: Set(request.delivery_time_minutes),
            is_open: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if owner.role == UserRole::Customer {
            if let Some(account) = user::Entity::find_by_id(owner.user_id).one(&txn).await? {
                let mut active: user::ActiveModel = account.into();
                active.role = Set(UserRole::RestaurantOwner);
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, restaurant_id = %restaurant_id, "failed to commit restaurant creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(restaurant_id = %restaurant_id, "restaurant created");
        Ok(model.into())
    }

    /// Applies a partial update. Only the owner may modify a restaurant.
    #[instrument(skip(self, actor, request), fields(restaurant_id = %restaurant_id, actor_id = %actor.user_id))]
    pub async fn update(
        &self,
        restaurant_id: Uuid,
        actor: &AuthUser,
        request: UpdateRestaurantRequest,
    ) -> Result<RestaurantResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let model = self.load_owned(restaurant_id, actor).await?;

        let mut active: restaurant::ActiveModel = model.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(cuisine) = request.cuisine {
            active.cuisine = Set(cuisine);
        }
        if let Some(address) = request.address {
            active.address = Set(address);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(image_url) = request.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(delivery_fee) = request.delivery_fee {
            if delivery_fee < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "delivery fee must not be negative".to_string(),
                ));
            }
            active.delivery_fee = Set(delivery_fee);
        }
        if let Some(minimum_order) = request.minimum_order {
            if minimum_order < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "minimum order must not be negative".to_string(),
                ));
            }
            active.minimum_order = Set(minimum_order);
        }
        if let Some(minutes) = request.delivery_time_minutes {
            active.delivery_time_minutes = Set(minutes);
        }
        if let Some(is_open) = request.is_open {
            active.is_open = Set(is_open);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        info!(restaurant_id = %restaurant_id, "restaurant updated");
        Ok(updated.into())
    }

    /// Adds a dish to the restaurant's menu. Owner only.
    #[instrument(skip(self, actor, request), fields(restaurant_id = %restaurant_id, actor_id = %actor.user_id))]
    pub async fn add_menu_item(
        &self,
        restaurant_id: Uuid,
        actor: &AuthUser,
        request: MenuItemRequest,
    ) -> Result<MenuItemResponse, ServiceError> {
        request.validate()?;
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        self.load_owned(restaurant_id, actor).await?;

        let now = Utc::now();
        let model = menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(restaurant_id),
            name: Set(request.name),
            description: Set(request.description),
            price: Set(request.price),
            category: Set(request.category),
            image_url: Set(request.image_url),
            is_available: Set(request.is_available),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(restaurant_id = %restaurant_id, menu_item_id = %model.id, "menu item added");
        Ok(model.into())
    }

    /// Partially updates one menu item. Owner only.
    #[instrument(skip(self, actor, request), fields(restaurant_id = %restaurant_id, menu_item_id = %menu_item_id))]
    pub async fn update_menu_item(
        &self,
        restaurant_id: Uuid,
        menu_item_id: Uuid,
        actor: &AuthUser,
        request: UpdateMenuItemRequest,
    ) -> Result<MenuItemResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        self.load_owned(restaurant_id, actor).await?;

        let item = menu_item::Entity::find_by_id(menu_item_id)
            .filter(menu_item::Column::RestaurantId.eq(restaurant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("menu item {menu_item_id}")))?;

        let mut active: menu_item::ActiveModel = item.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = request.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price must not be negative".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(category) = request.category {
            active.category = Set(Some(category));
        }
        if let Some(image_url) = request.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(updated.into())
    }

    /// Deletes one menu item. Owner only.
    #[instrument(skip(self, actor), fields(restaurant_id = %restaurant_id, menu_item_id = %menu_item_id))]
    pub async fn remove_menu_item(
        &self,
        restaurant_id: Uuid,
        menu_item_id: Uuid,
        actor: &AuthUser,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.load_owned(restaurant_id, actor).await?;

        let item = menu_item::Entity::find_by_id(menu_item_id)
            .filter(menu_item::Column::RestaurantId.eq(restaurant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("menu item {menu_item_id}")))?;

        menu_item::Entity::delete_by_id(item.id).exec(db).await?;
        info!(restaurant_id = %restaurant_id, menu_item_id = %menu_item_id, "menu item removed");
        Ok(())
    }

    /// Records a review and folds it into the restaurant's average rating
    /// and review count in the same transaction.
    #[instrument(skip(self, request), fields(restaurant_id = %restaurant_id, user_id = %user_id))]
    pub async fn add_review(
        &self,
        restaurant_id: Uuid,
        user_id: Uuid,
        request: ReviewRequest,
    ) -> Result<ReviewResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let model = restaurant::Entity::find_by_id(restaurant_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("restaurant {restaurant_id}")))?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start review transaction");
            ServiceError::DatabaseError(e)
        })?;

        let created = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            restaurant_id: Set(restaurant_id),
            rating: Set(request.rating),
            comment: Set(request.comment),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let ratings: Vec<i16> = review::Entity::find()
            .filter(review::Column::RestaurantId.eq(restaurant_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|r| r.rating)
            .collect();

        let mut active: restaurant::ActiveModel = model.into();
        active.rating = Set(mean_rating(&ratings));
        active.review_count = Set(ratings.len() as i32);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, restaurant_id = %restaurant_id, "failed to commit review");
            ServiceError::DatabaseError(e)
        })?;

        info!(restaurant_id = %restaurant_id, rating = request.rating, "review added");
        Ok(created.into())
    }

    /// Lists reviews for a restaurant, newest first.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    pub async fn list_reviews(
        &self,
        restaurant_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<ReviewListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        restaurant::Entity::find_by_id(restaurant_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("restaurant {restaurant_id}")))?;

        let paginator = review::Entity::find()
            .filter(review::Column::RestaurantId.eq(restaurant_id))
            .order_by_desc(review::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        Ok(ReviewListResponse {
            reviews: models.into_iter().map(ReviewResponse::from).collect(),
            total,
            page,
            per_page,
        })
    }

    async fn load_owned(
        &self,
        restaurant_id: Uuid,
        actor: &AuthUser,
    ) -> Result<restaurant::Model, ServiceError> {
        let model = restaurant::Entity::find_by_id(restaurant_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("restaurant {restaurant_id}")))?;
        if model.owner_id != actor.user_id {
            return Err(ServiceError::Forbidden(
                "only the restaurant owner can modify this restaurant".to_string(),
            ));
        }
        Ok(model)
    }
}

/// Average of review ratings rounded to two places; zero when empty.
fn mean_rating(ratings: &[i16]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = ratings.iter().map(|r| Decimal::from(*r)).sum();
    (sum / Decimal::from(ratings.len())).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn mean_of_no_ratings_is_zero() {
        assert_eq!(mean_rating(&[]), Decimal::ZERO);
    }

    #[test]
    fn mean_of_four_and_five_is_four_point_five() {
        assert_eq!(mean_rating(&[4, 5]), dec!(4.50));
    }

    #[test]
    fn mean_rounds_to_two_places() {
        assert_eq!(mean_rating(&[4, 4, 5]), dec!(4.33));
    }

    #[test]
    fn single_rating_is_its_own_mean() {
        assert_eq!(mean_rating(&[3]), dec!(3));
    }
}
