//! Client-side cart state container.
//!
//! A [`Cart`] is plain owned data scoped to one user session: frontends
//! construct one at session start, mutate it through the methods here, and
//! drop it at teardown. There are no globals and no interior mutability;
//! whoever owns the cart owns its lifecycle.
//!
//! Two invariants hold after every mutation: all items in a non-empty cart
//! belong to a single restaurant, and the running total equals the sum of
//! `price * quantity` over the item lines. The total is recomputed rather
//! than stored independently, so it cannot drift.
//!
//! Checkout goes through a [`CheckoutGateway`]: [`Cart::submit`] serializes
//! the cart into an order request, and only a successful placement clears
//! the cart. A failed attempt leaves every line in place so the user can
//! retry.

pub mod gateway;

pub use gateway::{
    CheckoutGateway, GatewayError, HttpCheckoutGateway, OrderLine, OrderReceipt, PlaceOrder,
};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::order::PaymentMethod;
use crate::services::orders::Address;

/// One line in the cart, keyed by `menu_item_id`.
///
/// `name` and `price` are snapshots taken when the item was added; a later
/// menu edit does not reach back into an open cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// Snapshot of the restaurant the cart is ordering from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantRef {
    pub id: Uuid,
    pub name: String,
    pub delivery_fee: Decimal,
    pub minimum_order: Decimal,
}

/// Delivery details collected at checkout, passed to [`Cart::submit`].
#[derive(Debug, Clone)]
pub struct DeliveryDetails {
    pub address: Address,
    pub payment_method: PaymentMethod,
}

/// Conflict signalled by [`Cart::add_item`] when the new item belongs to a
/// different restaurant than the one already in the cart. The cart is left
/// untouched; the caller confirms with the user and either clears or calls
/// [`Cart::replace_with`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("cart holds items from {current}; clear it before ordering from {attempted}")]
    DifferentRestaurant { current: String, attempted: String },
}

/// Failure modes of [`Cart::submit`]. Any failure leaves the cart intact.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("cannot submit an empty cart")]
    EmptyCart,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// The in-progress cart for a single session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
    restaurant: Option<RestaurantRef>,
    total: Decimal,
}

impl Cart {
    /// Creates an empty cart with no restaurant attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Item lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The restaurant the cart is ordering from, `None` while empty.
    pub fn restaurant(&self) -> Option<&RestaurantRef> {
        self.restaurant.as_ref()
    }

    /// Running total, always `Σ(price × quantity)` over [`Self::items`].
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines, the cart badge number.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether the current total reaches the restaurant's minimum order
    /// value. An empty cart never meets the minimum.
    pub fn meets_minimum(&self) -> bool {
        self.restaurant
            .as_ref()
            .map_or(false, |restaurant| self.total >= restaurant.minimum_order)
    }

    /// Adds an item, merging with an existing line for the same menu item by
    /// incrementing its quantity.
    ///
    /// If the cart already holds items from a different restaurant, returns
    /// [`CartError::DifferentRestaurant`] without mutating anything. The
    /// caller is expected to ask the user for confirmation and then either
    /// [`clear`](Self::clear) and re-add, or call
    /// [`replace_with`](Self::replace_with).
    pub fn add_item(&mut self, item: CartItem, restaurant: RestaurantRef) -> Result<(), CartError> {
        if let Some(current) = &self.restaurant {
            if current.id != restaurant.id {
                return Err(CartError::DifferentRestaurant {
                    current: current.name.clone(),
                    attempted: restaurant.name,
                });
            }
        }
        self.insert(item, restaurant);
        Ok(())
    }

    /// Confirmed replacement: clears the cart and re-seeds it with an item
    /// from a new restaurant. This is the second step of the
    /// different-restaurant flow, after the user has agreed to discard the
    /// current items.
    pub fn replace_with(&mut self, item: CartItem, restaurant: RestaurantRef) {
        self.clear();
        self.insert(item, restaurant);
    }

    /// Removes the line for `menu_item_id` if present. Removing the last
    /// line detaches the restaurant again.
    pub fn remove_item(&mut self, menu_item_id: Uuid) {
        self.items.retain(|item| item.menu_item_id != menu_item_id);
        if self.items.is_empty() {
            self.restaurant = None;
        }
        self.recompute_total();
    }

    /// Sets the quantity of an existing line in place. A quantity of zero
    /// removes the line instead of keeping a zero-quantity row; unknown ids
    /// are ignored.
    pub fn set_quantity(&mut self, menu_item_id: Uuid, quantity: u32) {
        if quantity == 0 {
            self.remove_item(menu_item_id);
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.menu_item_id == menu_item_id)
        {
            item.quantity = quantity;
        }
        self.recompute_total();
    }

    /// Resets to the empty state unconditionally.
    pub fn clear(&mut self) {
        self.items.clear();
        self.restaurant = None;
        self.total = Decimal::ZERO;
    }

    /// Sends the cart through the gateway as an order request.
    ///
    /// On success the cart is cleared and the receipt returned. On any
    /// failure, including transport errors, the cart keeps its items so the
    /// user can retry.
    pub async fn submit(
        &mut self,
        gateway: &dyn CheckoutGateway,
        delivery: DeliveryDetails,
    ) -> Result<OrderReceipt, SubmitError> {
        let restaurant = self.restaurant.as_ref().ok_or(SubmitError::EmptyCart)?;

        let request = PlaceOrder {
            restaurant_id: restaurant.id,
            items: self
                .items
                .iter()
                .map(|item| OrderLine {
                    menu_item_id: item.menu_item_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            delivery_address: delivery.address,
            payment_method: delivery.payment_method,
        };

        let receipt = gateway.place_order(request).await?;
        self.clear();
        Ok(receipt)
    }

    // Merge-or-append half of add_item, shared with replace_with. Assumes
    // the restaurant conflict has already been ruled out.
    fn insert(&mut self, item: CartItem, restaurant: RestaurantRef) {
        if self.restaurant.is_none() {
            self.restaurant = Some(restaurant);
        }
        match self
            .items
            .iter_mut()
            .find(|line| line.menu_item_id == item.menu_item_id)
        {
            Some(line) => line.quantity += item.quantity,
            None => self.items.push(item),
        }
        self.recompute_total();
    }

    fn recompute_total(&mut self) {
        self.total = self
            .items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();
    }
}
