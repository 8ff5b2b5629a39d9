use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published after a write has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Checkout events
    OrderPlaced {
        order_id: Uuid,
        user_id: Uuid,
        total_price: Decimal,
        discount_applied: Decimal,
        line_count: usize,
        placed_at: DateTime<Utc>,
    },
    PromoRedeemed {
        promo_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
    },

    // Promo administration events
    PromoCreated {
        promo_id: Uuid,
        code: String,
    },
    PromoUpdated(Uuid),
    PromoDeleted(Uuid),

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::OrderPlaced { .. } => "order_placed",
            Event::PromoRedeemed { .. } => "promo_redeemed",
            Event::PromoCreated { .. } => "promo_created",
            Event::PromoUpdated(_) => "promo_updated",
            Event::PromoDeleted(_) => "promo_deleted",
            Event::ProductCreated(_) => "product_created",
            Event::ProductUpdated(_) => "product_updated",
            Event::ProductDeleted(_) => "product_deleted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed or full.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.sender.try_send(event) {
            warn!(event = name, error = %e, "dropping domain event");
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderPlaced {
                order_id,
                user_id,
                total_price,
                discount_applied,
                line_count,
                ..
            } => {
                info!(
                    %order_id,
                    %user_id,
                    %total_price,
                    %discount_applied,
                    line_count,
                    "order placed"
                );
            }
            Event::PromoRedeemed {
                promo_id,
                user_id,
                order_id,
            } => {
                info!(%promo_id, %user_id, %order_id, "one-time promo redeemed");
            }
            Event::PromoCreated { promo_id, code } => {
                info!(%promo_id, code = %code, "promo code created");
            }
            Event::PromoUpdated(id) | Event::PromoDeleted(id) => {
                info!(promo_id = %id, event = event.name(), "promo code changed");
            }
            Event::ProductCreated(id) | Event::ProductUpdated(id) | Event::ProductDeleted(id) => {
                info!(product_id = %id, event = event.name(), "catalog changed");
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::ProductCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::ProductCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::PromoDeleted(Uuid::new_v4())).await.is_err());
        sender.send_or_log(Event::PromoDeleted(Uuid::new_v4())).await;
    }
}
