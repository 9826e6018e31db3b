use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Message pushed to a restaurant's live dashboard feed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderFeedMessage {
    NewOrder {
        order_id: Uuid,
        tracking_id: String,
        total: Decimal,
        placed_at: DateTime<Utc>,
    },
    StatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
        changed_at: DateTime<Utc>,
    },
}

/// In-process fan-out of order activity, one broadcast channel per
/// restaurant. Dashboards subscribe by restaurant id; publishers never block
/// and never fail. A feed with no listeners simply drops the message.
#[derive(Debug)]
pub struct OrderFeedHub {
    feeds: DashMap<Uuid, broadcast::Sender<OrderFeedMessage>>,
    capacity: usize,
}

impl OrderFeedHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            feeds: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to a restaurant's feed, creating it on first use. Slow
    /// subscribers that fall more than `capacity` messages behind observe a
    /// `Lagged` error and skip ahead; they never slow the publisher down.
    pub fn subscribe(&self, restaurant_id: Uuid) -> broadcast::Receiver<OrderFeedMessage> {
        self.feeds
            .entry(restaurant_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish to a restaurant's feed. Returns the number of subscribers the
    /// message reached; zero when the feed does not exist or nobody listens.
    pub fn publish(&self, restaurant_id: Uuid, message: OrderFeedMessage) -> usize {
        match self.feeds.get(&restaurant_id) {
            Some(feed) => feed.send(message).unwrap_or(0),
            None => 0,
        }
    }

    pub fn active_feeds(&self) -> usize {
        self.feeds.len()
    }
}
