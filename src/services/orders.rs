use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::try_join_all;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::entities::order::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::entities::{menu_item, order, order_item, restaurant};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Structured delivery address carried on order requests and responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Address {
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub zip_code: String,
}

/// One requested line of a new order. The price is the cart's snapshot of
/// the menu price; the subtotal is recomputed from these pairs server-side.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub restaurant_id: Uuid,
    #[validate]
    pub items: Vec<OrderItemRequest>,
    #[validate]
    pub delivery_address: Address,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub tracking_id: String,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_address: Address,
    pub items: Vec<OrderItemResponse>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub estimated_delivery_time: DateTime<Utc>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Authoritative persistence and status governance for orders.
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    tax_rate: Decimal,
    estimated_delivery: ChronoDuration,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        tax_rate: Decimal,
        estimated_delivery_minutes: i64,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            tax_rate,
            estimated_delivery: ChronoDuration::minutes(estimated_delivery_minutes),
        }
    }

    /// Creates an order from a submitted cart snapshot.
    ///
    /// The subtotal is recomputed from the submitted price and quantity
    /// pairs; the delivery fee and tax always come from the restaurant
    /// record and the configured rate, never from the client. The new order
    /// starts in `pending` with a freshly generated tracking id, and a
    /// best-effort `OrderCreated` event is published after commit.
    ///
    /// # Errors
    ///
    /// `NotFound` when the restaurant does not exist, `ValidationError`
    /// when the item list is empty, carries a negative price, or references
    /// an item that is not on the restaurant's menu.
    #[instrument(skip(self, request), fields(user_id = %user_id, restaurant_id = %request.restaurant_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "order must contain at least one item".to_string(),
            ));
        }
        if request.items.iter().any(|item| item.price < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "item price must not be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let restaurant = restaurant::Entity::find_by_id(request.restaurant_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("restaurant {}", request.restaurant_id))
            })?;

        // The snapshot names come from the live menu; ids that do not belong
        // to this restaurant are rejected outright.
        let requested_ids: HashSet<Uuid> =
            request.items.iter().map(|item| item.menu_item_id).collect();
        let menu_rows = menu_item::Entity::find()
            .filter(menu_item::Column::RestaurantId.eq(restaurant.id))
            .filter(menu_item::Column::Id.is_in(requested_ids.iter().copied()))
            .all(db)
            .await?;
        if menu_rows.len() != requested_ids.len() {
            return Err(ServiceError::ValidationError(
                "order contains items that are not on this restaurant's menu".to_string(),
            ));
        }
        let names_by_id: HashMap<Uuid, String> = menu_rows
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect();

        let (subtotal, tax, total) =
            compute_totals(&request.items, restaurant.delivery_fee, self.tax_rate);

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let tracking_id = generate_tracking_id();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            tracking_id: Set(tracking_id.clone()),
            user_id: Set(user_id),
            restaurant_id: Set(restaurant.id),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            payment_method: Set(request.payment_method),
            delivery_street: Set(request.delivery_address.street.clone()),
            delivery_city: Set(request.delivery_address.city.clone()),
            delivery_state: Set(request.delivery_address.state.clone()),
            delivery_zip: Set(request.delivery_address.zip_code.clone()),
            subtotal: Set(subtotal),
            delivery_fee: Set(restaurant.delivery_fee),
            tax: Set(tax),
            total: Set(total),
            estimated_delivery_time: Set(now + self.estimated_delivery),
            actual_delivery_time: Set(None),
            driver_id: Set(None),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let item_models: Vec<order_item::ActiveModel> = request
            .items
            .iter()
            .map(|item| order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                menu_item_id: Set(item.menu_item_id),
                name: Set(names_by_id
                    .get(&item.menu_item_id)
                    .cloned()
                    .unwrap_or_default()),
                price: Set(item.price),
                quantity: Set(item.quantity as i32),
            })
            .collect();
        order_item::Entity::insert_many(item_models).exec(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, tracking_id = %tracking_id, %total, "order created");

        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id,
                restaurant_id: restaurant.id,
                tracking_id: tracking_id.clone(),
                total,
                placed_at: now,
            })
            .await;

        self.to_response(order_model).await
    }

    /// Applies a status change on behalf of the restaurant owner.
    ///
    /// Only the owner of the order's restaurant may move the status, and
    /// only along the transition table on [`OrderStatus`]. Reaching
    /// `delivered` stamps `actual_delivery_time` exactly once. A
    /// best-effort `OrderStatusChanged` event follows the write.
    #[instrument(skip(self, actor), fields(order_id = %order_id, actor_id = %actor.user_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        actor: &AuthUser,
        new_status: OrderStatus,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let existing = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id}")))?;

        let restaurant = restaurant::Entity::find_by_id(existing.restaurant_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("restaurant {}", existing.restaurant_id))
            })?;
        if restaurant.owner_id != actor.user_id {
            return Err(ServiceError::Forbidden(
                "only the restaurant owner can update this order".to_string(),
            ));
        }

        let old_status = existing.status;
        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatusTransition {
                from: old_status.to_string(),
                to: new_status.to_string(),
            });
        }

        let now = Utc::now();
        let version = existing.version;
        let mut active: order::ActiveModel = existing.into();
        active.status = Set(new_status);
        if new_status == OrderStatus::Delivered {
            active.actual_delivery_time = Set(Some(now));
        }
        active.version = Set(version + 1);
        active.updated_at = Set(now);

        let updated = active.update(db).await?;

        info!(order_id = %order_id, from = %old_status, to = %new_status, "order status updated");

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                restaurant_id: updated.restaurant_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
                changed_at: now,
            })
            .await;

        self.to_response(updated).await
    }

    /// Fetches one order, visible to its customer, the restaurant owner,
    /// and administrators only.
    #[instrument(skip(self, actor), fields(order_id = %order_id, actor_id = %actor.user_id))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
        actor: &AuthUser,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let model = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id}")))?;

        let mut authorized = model.user_id == actor.user_id || actor.is_admin();
        if !authorized {
            let restaurant = restaurant::Entity::find_by_id(model.restaurant_id)
                .one(db)
                .await?;
            authorized = restaurant
                .map(|r| r.owner_id == actor.user_id)
                .unwrap_or(false);
        }
        if !authorized {
            return Err(ServiceError::Forbidden(
                "you do not have access to this order".to_string(),
            ));
        }

        self.to_response(model).await
    }

    /// Lists a customer's own orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let paginator = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;
        let orders = try_join_all(models.into_iter().map(|model| self.to_response(model))).await?;

        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Lists every order placed against the actor's restaurants, newest
    /// first. Fails with `Forbidden` when the actor owns no restaurant.
    #[instrument(skip(self, actor), fields(actor_id = %actor.user_id))]
    pub async fn list_orders_for_restaurant(
        &self,
        actor: &AuthUser,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let owned = restaurant::Entity::find()
            .filter(restaurant::Column::OwnerId.eq(actor.user_id))
            .all(db)
            .await?;
        if owned.is_empty() {
            return Err(ServiceError::Forbidden(
                "no restaurant is associated with this account".to_string(),
            ));
        }
        let restaurant_ids: Vec<Uuid> = owned.into_iter().map(|r| r.id).collect();

        let paginator = order::Entity::find()
            .filter(order::Column::RestaurantId.is_in(restaurant_ids))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;
        let orders = try_join_all(models.into_iter().map(|model| self.to_response(model))).await?;

        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }

    async fn to_response(&self, model: order::Model) -> Result<OrderResponse, ServiceError> {
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(model.id))
            .all(&*self.db_pool)
            .await?;
        Ok(build_response(model, items))
    }
}

/// Money math for a new order: subtotal from the submitted pairs, tax from
/// the configured rate rounded to cents, and the grand total.
fn compute_totals(
    items: &[OrderItemRequest],
    delivery_fee: Decimal,
    tax_rate: Decimal,
) -> (Decimal, Decimal, Decimal) {
    let subtotal: Decimal = items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();
    let tax = (subtotal * tax_rate).round_dp(2);
    let total = subtotal + delivery_fee + tax;
    (subtotal, tax, total)
}

/// Tracking ids look like `TRK48291045X7QD`: the last eight digits of the
/// creation time in unix milliseconds plus four random base-36 characters.
fn generate_tracking_id() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let millis = Utc::now().timestamp_millis().to_string();
    let tail: String = millis
        .chars()
        .skip(millis.len().saturating_sub(8))
        .collect();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("TRK{tail}{suffix}")
}

fn build_response(model: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
    OrderResponse {
        id: model.id,
        tracking_id: model.tracking_id,
        user_id: model.user_id,
        restaurant_id: model.restaurant_id,
        status: model.status,
        payment_status: model.payment_status,
        payment_method: model.payment_method,
        delivery_address: Address {
            street: model.delivery_street,
            city: model.delivery_city,
            state: model.delivery_state,
            zip_code: model.delivery_zip,
        },
        items: items
            .into_iter()
            .map(|item| OrderItemResponse {
                menu_item_id: item.menu_item_id,
                name: item.name,
                price: item.price,
                quantity: item.quantity,
            })
            .collect(),
        subtotal: model.subtotal,
        delivery_fee: model.delivery_fee,
        tax: model.tax,
        total: model.total,
        estimated_delivery_time: model.estimated_delivery_time,
        actual_delivery_time: model.actual_delivery_time,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(price: Decimal, quantity: u32) -> OrderItemRequest {
        OrderItemRequest {
            menu_item_id: Uuid::new_v4(),
            quantity,
            price,
        }
    }

    #[test]
    fn totals_follow_subtotal_plus_fee_plus_tax() {
        let items = vec![item(dec!(50.00), 2)];
        let (subtotal, tax, total) = compute_totals(&items, dec!(20.00), dec!(0.10));

        assert_eq!(subtotal, dec!(100.00));
        assert_eq!(tax, dec!(10.00));
        assert_eq!(total, dec!(130.00));
    }

    #[test]
    fn subtotal_sums_across_lines() {
        let items = vec![item(dec!(12.50), 2), item(dec!(5.25), 3)];
        let (subtotal, tax, total) = compute_totals(&items, dec!(3.00), dec!(0.10));

        assert_eq!(subtotal, dec!(40.75));
        assert_eq!(tax, dec!(4.08));
        assert_eq!(total, dec!(47.83));
    }

    #[test]
    fn zero_tax_rate_charges_no_tax() {
        let items = vec![item(dec!(30.00), 1)];
        let (subtotal, tax, total) = compute_totals(&items, dec!(5.00), Decimal::ZERO);

        assert_eq!(subtotal, dec!(30.00));
        assert_eq!(tax, Decimal::ZERO);
        assert_eq!(total, dec!(35.00));
    }

    #[test]
    fn tracking_id_has_expected_shape() {
        let id = generate_tracking_id();

        assert!(id.starts_with("TRK"));
        assert_eq!(id.len(), 15);
        assert!(id[3..11].chars().all(|c| c.is_ascii_digit()));
        assert!(id[11..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn tracking_ids_differ_between_calls() {
        let ids: HashSet<String> = (0..32).map(|_| generate_tracking_id()).collect();
        assert!(ids.len() > 1);
    }

    #[test]
    fn response_carries_address_and_items() {
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let model = order::Model {
            id: order_id,
            tracking_id: "TRK12345678ABCD".to_string(),
            user_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: PaymentMethod::Card,
            delivery_street: "12 Hill Road".to_string(),
            delivery_city: "Pune".to_string(),
            delivery_state: "MH".to_string(),
            delivery_zip: "411001".to_string(),
            subtotal: dec!(100.00),
            delivery_fee: dec!(20.00),
            tax: dec!(10.00),
            total: dec!(130.00),
            estimated_delivery_time: now,
            actual_delivery_time: None,
            driver_id: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let items = vec![order_item::Model {
            id: Uuid::new_v4(),
            order_id,
            menu_item_id: Uuid::new_v4(),
            name: "Paneer Tikka".to_string(),
            price: dec!(50.00),
            quantity: 2,
        }];

        let response = build_response(model, items);

        assert_eq!(response.delivery_address.city, "Pune");
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].name, "Paneer Tikka");
        assert_eq!(response.total, dec!(130.00));
        assert!(response.actual_delivery_time.is_none());
    }
}
