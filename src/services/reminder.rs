//! Abandoned-cart reminder sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::aggregates::Cart;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::repository::Store;
use crate::services::notify::{Email, EventPublisher, Mailer};
use crate::Result;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(600);
/// Carts untouched for this many minutes are considered abandoned.
pub const STALE_AFTER_MINUTES: i64 = 60;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    events: EventPublisher,
}

impl ReminderService {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, events: EventPublisher) -> Self {
        Self { store, mailer, events }
    }

    /// Emails every stale cart once. A cart is marked right after its email
    /// goes out, so a crash in between can produce a second email.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let carts = self.store.find_stale_carts(now - chrono::Duration::minutes(STALE_AFTER_MINUTES)).await?;
        let mut report = SweepReport::default();
        for cart in carts {
            let Some(email) = reminder_for(&cart) else { continue };
            if let Err(e) = self.mailer.send(email).await {
                warn!(cart_id = %cart.id, error = %e, "cart reminder not sent");
                report.failed += 1;
                continue;
            }
            if let Err(e) = self.store.mark_reminder_sent(cart.id).await {
                error!(cart_id = %cart.id, error = %e, "cart reminder sent but not recorded");
                report.failed += 1;
                continue;
            }
            self.events.publish(DomainEvent::Cart(CartEvent::ReminderSent { cart_id: cart.id })).await;
            report.sent += 1;
        }
        if report.sent > 0 || report.failed > 0 {
            info!(sent = report.sent, failed = report.failed, "reminder sweep finished");
        }
        Ok(report)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once(Utc::now()).await {
                    error!(error = %e, "reminder sweep failed");
                }
            }
        })
    }
}

fn reminder_for(cart: &Cart) -> Option<Email> {
    let to = cart.email.clone()?;
    let count = cart.items.iter().fold(0u32, |acc, i| acc.saturating_add(i.quantity));
    Some(Email {
        to,
        subject: "You left something in your cart".into(),
        body: format!("Your cart still holds {count} item(s) worth {}. Come back to finish your order.", cart.items_total()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{LinePrice, Product};
    use crate::domain::value_objects::{ItemOptions, Owner};
    use crate::repository::{CartRepository, MemoryStore};
    use crate::services::notify::testing::RecordingMailer;
    use chrono::Duration;

    async fn cart_with_email(store: &MemoryStore, guest: &str, email: Option<&str>) -> Cart {
        let mut cart = store.create_open_cart(&Cart::new(Owner::Guest(guest.into()))).await.unwrap();
        let product = Product::create("Earrings", 300);
        cart.add_item(product.id, 1, ItemOptions::default(), LinePrice::for_product(&product, Utc::now())).unwrap();
        cart.email = email.map(str::to_string);
        store.save_cart(&cart).await.unwrap();
        cart
    }

    #[tokio::test]
    async fn test_sweep_reminds_stale_carts_once() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let svc = ReminderService::new(store.clone(), mailer.clone(), EventPublisher::disabled());
        let cart = cart_with_email(&store, "a", Some("a@shop.test")).await;
        cart_with_email(&store, "b", None).await;

        // Fresh carts are left alone.
        assert_eq!(svc.sweep_once(Utc::now()).await.unwrap(), SweepReport::default());

        let later = Utc::now() + Duration::hours(2);
        assert_eq!(svc.sweep_once(later).await.unwrap().sent, 1);
        assert!(store.find_cart(cart.id).await.unwrap().unwrap().reminder_sent);
        let sent = mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@shop.test");

        assert_eq!(svc.sweep_once(later).await.unwrap().sent, 0);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_cart_unmarked() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer { fail: true, ..Default::default() });
        let svc = ReminderService::new(store.clone(), mailer, EventPublisher::disabled());
        let cart = cart_with_email(&store, "a", Some("a@shop.test")).await;

        let report = svc.sweep_once(Utc::now() + Duration::hours(2)).await.unwrap();
        assert_eq!(report, SweepReport { sent: 0, failed: 1 });
        assert!(!store.find_cart(cart.id).await.unwrap().unwrap().reminder_sent);
    }
}
