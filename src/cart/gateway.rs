//! Checkout transport for the cart.
//!
//! [`CheckoutGateway`] is the seam between the client-local cart and the
//! order API. The production implementation, [`HttpCheckoutGateway`], posts
//! the serialized cart to `POST /api/v1/orders` and maps HTTP failures into
//! [`GatewayError`] kinds mirroring the server's error taxonomy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::entities::order::{OrderStatus, PaymentMethod};
use crate::errors::ErrorResponse;
use crate::services::orders::Address;
use crate::ApiResponse;

/// Wire body for order placement, assembled from the cart snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrder {
    pub restaurant_id: Uuid,
    pub items: Vec<OrderLine>,
    pub delivery_address: Address,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub menu_item_id: Uuid,
    pub quantity: u32,
    pub price: Decimal,
}

/// The slice of the persisted order a client needs after checkout. Extra
/// response fields are ignored on deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderReceipt {
    pub id: Uuid,
    pub tracking_id: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub estimated_delivery_time: DateTime<Utc>,
}

/// Order placement failures, carrying the server's message where one was
/// returned.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),
    #[error("order service error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("order service returned a success without an order payload")]
    MissingPayload,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn place_order(&self, request: PlaceOrder) -> Result<OrderReceipt, GatewayError>;
}

/// [`CheckoutGateway`] over the REST API.
#[derive(Clone)]
pub struct HttpCheckoutGateway {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpCheckoutGateway {
    /// `base_url` is the API root without a trailing path, for example
    /// `https://api.quickbite.io`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer_token: None,
        }
    }

    /// Attaches the JWT sent as `Authorization: Bearer` on every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

#[async_trait]
impl CheckoutGateway for HttpCheckoutGateway {
    async fn place_order(&self, request: PlaceOrder) -> Result<OrderReceipt, GatewayError> {
        let url = format!("{}/api/v1/orders", self.base_url.trim_end_matches('/'));
        debug!(url = %url, restaurant_id = %request.restaurant_id, "placing order");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            let envelope = response.json::<ApiResponse<OrderReceipt>>().await?;
            envelope.data.ok_or(GatewayError::MissingPayload)
        } else {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| format!("order service returned {status}"));
            Err(error_from_status(status, message))
        }
    }
}

fn error_from_status(status: StatusCode, message: String) -> GatewayError {
    match status {
        StatusCode::NOT_FOUND => GatewayError::NotFound(message),
        StatusCode::FORBIDDEN => GatewayError::Forbidden(message),
        StatusCode::UNAUTHORIZED => GatewayError::Unauthorized(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            GatewayError::Validation(message)
        }
        other => GatewayError::Server {
            status: other.as_u16(),
            message,
        },
    }
}
