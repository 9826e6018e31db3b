use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notifications::{OrderFeedHub, OrderFeedMessage};

/// Domain events emitted after a successful write. Delivery is best-effort:
/// losing an event never fails or rolls back the request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        restaurant_id: Uuid,
        tracking_id: String,
        total: Decimal,
        placed_at: DateTime<Utc>,
    },
    OrderStatusChanged {
        order_id: Uuid,
        restaurant_id: Uuid,
        old_status: String,
        new_status: String,
        changed_at: DateTime<Utc>,
    },
}

/// Clonable handle for publishing [`Event`]s onto the bounded channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {e}"))
    }

    /// Sends an event and downgrades failure to a warning. Services use this
    /// on their post-commit paths so a saturated or closed channel cannot
    /// fail a request that already persisted.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "event dropped");
        }
    }
}

/// Consumes the event channel and fans events out to the live order feeds.
/// Runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, hub: Arc<OrderFeedHub>) {
    info!("event processing loop started");

    while let Some(event) = rx.recv().await {
        debug!(?event, "processing event");

        match event {
            Event::OrderCreated {
                order_id,
                restaurant_id,
                tracking_id,
                total,
                placed_at,
            } => {
                let delivered = hub.publish(
                    restaurant_id,
                    OrderFeedMessage::NewOrder {
                        order_id,
                        tracking_id,
                        total,
                        placed_at,
                    },
                );
                debug!(%order_id, %restaurant_id, subscribers = delivered, "new order published");
            }
            Event::OrderStatusChanged {
                order_id,
                restaurant_id,
                old_status,
                new_status,
                changed_at,
            } => {
                let delivered = hub.publish(
                    restaurant_id,
                    OrderFeedMessage::StatusChanged {
                        order_id,
                        old_status,
                        new_status,
                        changed_at,
                    },
                );
                debug!(%order_id, %restaurant_id, subscribers = delivered, "status change published");
            }
        }
    }

    info!("event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_event() -> Event {
        Event::OrderCreated {
            order_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            tracking_id: "TRK48291045X7QD".to_string(),
            total: dec!(130.00),
            placed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender.send(sample_event()).await.unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(Event::OrderCreated { .. })
        ));
    }

    #[tokio::test]
    async fn send_fails_when_channel_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(sample_event()).await.is_err());
    }

    #[tokio::test]
    async fn send_or_log_swallows_channel_failure() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or return an error.
        sender.send_or_log(sample_event()).await;
    }

    #[tokio::test]
    async fn processor_forwards_to_subscribed_feed() {
        let (tx, rx) = mpsc::channel(4);
        let hub = Arc::new(OrderFeedHub::new(8));
        let restaurant_id = Uuid::new_v4();
        let mut feed = hub.subscribe(restaurant_id);

        let processor = tokio::spawn(process_events(rx, hub));

        EventSender::new(tx.clone())
            .send(Event::OrderStatusChanged {
                order_id: Uuid::new_v4(),
                restaurant_id,
                old_status: "pending".to_string(),
                new_status: "confirmed".to_string(),
                changed_at: Utc::now(),
            })
            .await
            .unwrap();

        let message = feed.recv().await.unwrap();
        assert!(matches!(message, OrderFeedMessage::StatusChanged { .. }));

        drop(tx);
        processor.await.unwrap();
    }
}
