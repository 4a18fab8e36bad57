//! Fire-and-forget notification hook
//!
//! Downstream notification delivery (email, push) is an external
//! collaborator; this module only posts events to its webhook. Delivery runs
//! on a spawned task off the request path — the pipeline never blocks on it
//! and tolerates its failure.

use shared::models::Order;

/// Webhook notifier. With no URL configured every event is a debug-logged
/// no-op, which is the default in development.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            webhook_url,
        }
    }

    pub fn order_created(&self, order: &Order) {
        self.dispatch("order.created", order);
    }

    pub fn order_cancelled(&self, order: &Order) {
        self.dispatch("order.cancelled", order);
    }

    pub fn payment_succeeded(&self, order: &Order) {
        self.dispatch("order.paid", order);
    }

    fn dispatch(&self, event: &'static str, order: &Order) {
        let Some(url) = self.webhook_url.clone() else {
            tracing::debug!(event, order_id = order.id, "no notify webhook configured, skipping");
            return;
        };

        let client = self.client.clone();
        let body = serde_json::json!({
            "event": event,
            "order_id": order.id,
            "order_number": order.order_number,
            "user_id": order.user_id,
            "status": order.status,
            "payment_status": order.payment_status,
            "total_amount": order.total_amount,
        });
        let order_id = order.id;

        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(event, order_id, "notification delivered");
                }
                Ok(resp) => {
                    tracing::warn!(event, order_id, status = %resp.status(), "notification rejected");
                }
                Err(e) => {
                    tracing::warn!(event, order_id, error = %e, "notification delivery failed");
                }
            }
        });
    }
}
