//! Shared user/subscription resolution ladder.
//!
//! Webhook delivery order is not guaranteed: an `invoice.payment_succeeded`
//! or `customer.subscription.updated` can arrive before the
//! `customer.subscription.created` that would normally have produced our
//! mirror record. Every handler that needs the record therefore resolves
//! through this one ladder, which reconstructs a missing record instead of
//! giving up.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::domain::billing::payloads::SubscriptionObject;
use crate::domain::billing::subscription::SubscriptionRecord;
use crate::domain::billing::webhook_errors::ReconciliationError;
use crate::domain::marketplace::User;
use crate::ports::{BillingProvider, SubscriptionRepository, UserRepository};

/// Synthesized billing-period length when live period bounds are
/// unavailable. Corrected by the next lifecycle event that carries real
/// bounds.
pub const SYNTHETIC_PERIOD_DAYS: i64 = 30;

/// A resolved user together with their subscription mirror record.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub user: User,
    pub record: SubscriptionRecord,
    /// True when the record was reconstructed rather than found.
    pub healed: bool,
}

/// Resolves the user and subscription record affected by an event,
/// reconstructing the record when the creation event was missed.
pub struct SubscriptionResolver {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    provider: Arc<dyn BillingProvider>,
}

impl SubscriptionResolver {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        provider: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            provider,
        }
    }

    /// Resolution ladder, first hit wins:
    ///
    /// 1. Subscription record by provider subscription id.
    /// 2. User whose stored subscription id matches (record is healed).
    /// 3. User attached to the provider customer id (record is healed).
    /// 4. Customer metadata fetched live from the provider (record is
    ///    healed).
    ///
    /// `seed` carries the event's subscription payload when the event has
    /// one; healed records prefer its fields over a live fetch. Returns
    /// `Ok(None)` when nothing resolves.
    pub async fn resolve_or_create(
        &self,
        subscription_id: &str,
        customer_id: Option<&str>,
        seed: Option<&SubscriptionObject>,
    ) -> Result<Option<Resolution>, ReconciliationError> {
        if let Some(record) = self
            .subscriptions
            .find_by_stripe_subscription_id(subscription_id)
            .await?
        {
            if let Some(user) = self.users.find_by_id(record.user_id).await? {
                return Ok(Some(Resolution {
                    user,
                    record,
                    healed: false,
                }));
            }
            warn!(
                subscription_id,
                user_id = %record.user_id,
                "subscription record references a missing user"
            );
        }

        if let Some(user) = self
            .users
            .find_by_stripe_subscription_id(subscription_id)
            .await?
        {
            return self.heal(user, subscription_id, customer_id, seed).await;
        }

        if let Some(customer_id) = customer_id {
            if let Some(user) = self.users.find_by_stripe_customer_id(customer_id).await? {
                return self.heal(user, subscription_id, Some(customer_id), seed).await;
            }

            if let Some(user) = self.user_from_customer_metadata(customer_id).await? {
                return self.heal(user, subscription_id, Some(customer_id), seed).await;
            }
        }

        Ok(None)
    }

    /// Last rung: fetch the customer from the provider and read our user
    /// id out of its metadata. Fetch failures are logged, not fatal; the
    /// caller decides what an unresolved event means.
    async fn user_from_customer_metadata(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, ReconciliationError> {
        let customer = match self.provider.get_customer(customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => return Ok(None),
            Err(err) => {
                warn!(customer_id, error = %err, "customer fetch failed during resolution");
                return Ok(None);
            }
        };

        let Some(raw_user_id) = customer.user_id_metadata() else {
            return Ok(None);
        };

        let Ok(user_id) = raw_user_id.parse() else {
            warn!(customer_id, raw_user_id, "customer metadata user id is malformed");
            return Ok(None);
        };

        Ok(self.users.find_by_id(user_id).await?)
    }

    /// Reconstructs and persists the missing subscription record.
    async fn heal(
        &self,
        user: User,
        subscription_id: &str,
        customer_id: Option<&str>,
        seed: Option<&SubscriptionObject>,
    ) -> Result<Option<Resolution>, ReconciliationError> {
        let customer_id = customer_id
            .map(str::to_string)
            .or_else(|| user.stripe_customer_id.clone())
            .unwrap_or_default();

        let mut record = SubscriptionRecord::new(user.id, customer_id, subscription_id);

        match seed {
            Some(payload) => {
                record.status = payload.parsed_status();
                record.stripe_price_id = payload.price_id().map(str::to_string);
                record.current_period_start = payload.period_start();
                record.current_period_end =
                    payload.period_end().or_else(|| Some(synthetic_period_end(Utc::now())));
                record.cancel_at_period_end = payload.cancel_at_period_end;
                record.canceled_at = payload.canceled_at_time();
            }
            None => self.enrich_from_provider(&mut record, subscription_id).await,
        }

        self.subscriptions.upsert(&record).await?;
        info!(
            subscription_id,
            user_id = %user.id,
            "reconstructed missing subscription record"
        );

        Ok(Some(Resolution {
            user,
            record,
            healed: true,
        }))
    }

    /// Best-effort enrichment from a live provider fetch; falls back to a
    /// synthesized period when the fetch fails.
    async fn enrich_from_provider(&self, record: &mut SubscriptionRecord, subscription_id: &str) {
        let now = Utc::now();
        match self.provider.get_subscription(subscription_id).await {
            Ok(Some(live)) => {
                record.status =
                    crate::domain::billing::SubscriptionStatus::from_provider(&live.status);
                record.stripe_price_id = live.price_id;
                record.current_period_start = live
                    .current_period_start
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                record.current_period_end = live
                    .current_period_end
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .or_else(|| Some(synthetic_period_end(now)));
                record.cancel_at_period_end = live.cancel_at_period_end;
            }
            Ok(None) => {
                record.current_period_start = Some(now);
                record.current_period_end = Some(synthetic_period_end(now));
            }
            Err(err) => {
                warn!(
                    subscription_id,
                    error = %err,
                    "subscription fetch failed, synthesizing period bounds"
                );
                record.current_period_start = Some(now);
                record.current_period_end = Some(synthetic_period_end(now));
            }
        }
    }
}

/// The single definition of the synthesized period-end fallback.
pub(crate) fn synthetic_period_end(from: DateTime<Utc>) -> DateTime<Utc> {
    from + Duration::days(SYNTHETIC_PERIOD_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemorySubscriptionRepository, InMemoryUserRepository, MockBillingProvider,
    };
    use crate::domain::foundation::UserId;
    use serde_json::json;

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        provider: Arc<MockBillingProvider>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                users: Arc::new(InMemoryUserRepository::new()),
                subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
                provider: Arc::new(MockBillingProvider::new()),
            }
        }

        fn resolver(&self) -> SubscriptionResolver {
            SubscriptionResolver::new(
                self.users.clone(),
                self.subscriptions.clone(),
                self.provider.clone(),
            )
        }
    }

    fn seed_payload(sub_id: &str, customer: &str, status: &str) -> SubscriptionObject {
        serde_json::from_value(json!({
            "id": sub_id,
            "customer": customer,
            "status": status,
            "current_period_start": 1704067200,
            "current_period_end": 1706745600,
            "items": { "data": [ { "price": { "id": "price_monthly" } } ] }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn finds_existing_record_without_healing() {
        let fx = Fixture::new();
        let user = User::new(UserId::new(), "a@example.com");
        fx.users.insert(user.clone()).await;
        let record = SubscriptionRecord::new(user.id, "cus_1", "sub_1");
        fx.subscriptions.upsert(&record).await.unwrap();

        let resolution = fx
            .resolver()
            .resolve_or_create("sub_1", Some("cus_1"), None)
            .await
            .unwrap()
            .unwrap();

        assert!(!resolution.healed);
        assert_eq!(resolution.user.id, user.id);
    }

    #[tokio::test]
    async fn heals_from_user_subscription_id() {
        let fx = Fixture::new();
        let mut user = User::new(UserId::new(), "b@example.com");
        user.stripe_subscription_id = Some("sub_2".to_string());
        user.stripe_customer_id = Some("cus_2".to_string());
        fx.users.insert(user.clone()).await;

        let resolution = fx
            .resolver()
            .resolve_or_create("sub_2", None, Some(&seed_payload("sub_2", "cus_2", "active")))
            .await
            .unwrap()
            .unwrap();

        assert!(resolution.healed);
        assert_eq!(resolution.record.stripe_price_id.as_deref(), Some("price_monthly"));
        assert!(fx
            .subscriptions
            .find_by_stripe_subscription_id("sub_2")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn heals_from_customer_id() {
        let fx = Fixture::new();
        let mut user = User::new(UserId::new(), "c@example.com");
        user.stripe_customer_id = Some("cus_3".to_string());
        fx.users.insert(user.clone()).await;

        let resolution = fx
            .resolver()
            .resolve_or_create("sub_3", Some("cus_3"), Some(&seed_payload("sub_3", "cus_3", "trialing")))
            .await
            .unwrap()
            .unwrap();

        assert!(resolution.healed);
        assert_eq!(
            resolution.record.status,
            crate::domain::billing::SubscriptionStatus::Trialing
        );
    }

    #[tokio::test]
    async fn heals_from_provider_customer_metadata() {
        let fx = Fixture::new();
        let user = User::new(UserId::new(), "d@example.com");
        fx.users.insert(user.clone()).await;
        fx.provider
            .add_customer("cus_4", Some("d@example.com"), Some(&user.id.to_string()));

        let resolution = fx
            .resolver()
            .resolve_or_create("sub_4", Some("cus_4"), None)
            .await
            .unwrap()
            .unwrap();

        assert!(resolution.healed);
        assert_eq!(resolution.user.id, user.id);
    }

    #[tokio::test]
    async fn synthesizes_period_when_no_seed_and_no_live_data() {
        let fx = Fixture::new();
        let mut user = User::new(UserId::new(), "e@example.com");
        user.stripe_subscription_id = Some("sub_5".to_string());
        fx.users.insert(user).await;

        let resolution = fx
            .resolver()
            .resolve_or_create("sub_5", None, None)
            .await
            .unwrap()
            .unwrap();

        let end = resolution.record.current_period_end.unwrap();
        let expected = Utc::now() + Duration::days(SYNTHETIC_PERIOD_DAYS);
        assert!((end - expected).num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn unresolvable_returns_none_without_writes() {
        let fx = Fixture::new();

        let resolution = fx
            .resolver()
            .resolve_or_create("sub_ghost", Some("cus_ghost"), None)
            .await
            .unwrap();

        assert!(resolution.is_none());
        assert_eq!(fx.subscriptions.len().await, 0);
    }
}
