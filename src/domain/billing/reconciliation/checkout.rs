//! `checkout.session.completed` handler.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use super::resolver::synthetic_period_end;
use super::FEATURE_WINDOW_DAYS;
use crate::domain::billing::payloads::CheckoutSessionObject;
use crate::domain::billing::payment::PaymentRecord;
use crate::domain::billing::stripe_event::{StripeEvent, StripeEventType};
use crate::domain::billing::webhook_errors::ReconciliationError;
use crate::domain::billing::webhook_processor::{Outcome, WebhookEventHandler};
use crate::domain::billing::SubscriptionStatus;
use crate::domain::marketplace::User;
use crate::ports::{BillingProvider, ListingRepository, PaymentLedger, UserRepository};

/// Handles completed checkout sessions.
///
/// A session is one of two mutually exclusive purchases, keyed by payload
/// shape: a one-off featured-placement purchase (metadata carries a
/// listing id) or a subscription checkout (the session references a
/// subscription).
pub struct CheckoutCompletedHandler {
    users: Arc<dyn UserRepository>,
    listings: Arc<dyn ListingRepository>,
    ledger: Arc<dyn PaymentLedger>,
    provider: Arc<dyn BillingProvider>,
}

impl CheckoutCompletedHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        listings: Arc<dyn ListingRepository>,
        ledger: Arc<dyn PaymentLedger>,
        provider: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            users,
            listings,
            ledger,
            provider,
        }
    }

    /// Feature purchase: flag the listing for a fixed window and append a
    /// ledger row.
    async fn handle_feature_purchase(
        &self,
        session: &CheckoutSessionObject,
    ) -> Result<Outcome, ReconciliationError> {
        let Some(listing_id) = session.listing_id() else {
            warn!(session_id = %session.id, "feature purchase with missing or malformed listing id");
            return Ok(Outcome::Skipped("listing id unresolvable".to_string()));
        };

        let expiration = Utc::now() + Duration::days(FEATURE_WINDOW_DAYS);
        let payment = PaymentRecord::feature(
            session.user_id(),
            listing_id,
            &session.id,
            session.payment_intent.clone(),
            session.amount_total.unwrap_or(0),
            session.currency.as_deref().unwrap_or("usd"),
            serde_json::to_value(&session.metadata)
                .map_err(|e| ReconciliationError::ParseError(e.to_string()))?,
        );

        let found = self
            .listings
            .set_featured(listing_id, expiration, session.payment_reference())
            .await?;
        if !found {
            warn!(%listing_id, session_id = %session.id, "feature purchase for unknown listing");
            return Ok(Outcome::Skipped("listing not found".to_string()));
        }

        info!(%listing_id, %expiration, "listing featured");

        // Ledger is diagnostic only; a failed write never fails the event.
        if let Err(err) = self.ledger.record(&payment).await {
            warn!(session_id = %session.id, error = %err, "feature payment ledger write failed");
        }

        Ok(Outcome::Applied)
    }

    /// Subscription checkout: attach billing ids to the user and copy the
    /// live subscription state onto them.
    async fn handle_subscription_checkout(
        &self,
        session: &CheckoutSessionObject,
        subscription_id: &str,
    ) -> Result<Outcome, ReconciliationError> {
        let Some(mut user) = self.resolve_user(session).await? else {
            return Err(ReconciliationError::Unresolvable(format!(
                "checkout session {} maps to no user",
                session.id
            )));
        };

        if let Some(customer_id) = session.customer.as_deref() {
            user.attach_customer_id(customer_id);
        }
        user.stripe_subscription_id = Some(subscription_id.to_string());

        self.apply_live_subscription(&mut user, subscription_id).await;
        self.users.save_billing_state(&user).await?;

        info!(
            user_id = %user.id,
            subscription_id,
            status = %user.subscription_status,
            "subscription checkout reconciled"
        );

        let payment = PaymentRecord::subscription(
            user.id,
            &session.id,
            session.payment_intent.clone(),
            session.amount_total.unwrap_or(0),
            session.currency.as_deref().unwrap_or("usd"),
            serde_json::to_value(&session.metadata)
                .map_err(|e| ReconciliationError::ParseError(e.to_string()))?,
        );
        if let Err(err) = self.ledger.record(&payment).await {
            warn!(session_id = %session.id, error = %err, "subscription payment ledger write failed");
        }

        Ok(Outcome::Applied)
    }

    /// User resolution for a subscription checkout: session metadata first,
    /// then the stored customer attachment, then the provider customer's
    /// metadata.
    async fn resolve_user(
        &self,
        session: &CheckoutSessionObject,
    ) -> Result<Option<User>, ReconciliationError> {
        if let Some(user_id) = session.user_id() {
            if let Some(user) = self.users.find_by_id(user_id).await? {
                return Ok(Some(user));
            }
        }

        let Some(customer_id) = session.customer.as_deref() else {
            return Ok(None);
        };

        if let Some(user) = self.users.find_by_stripe_customer_id(customer_id).await? {
            return Ok(Some(user));
        }

        match self.provider.get_customer(customer_id).await {
            Ok(Some(customer)) => {
                let Some(user_id) = customer.user_id_metadata().and_then(|raw| raw.parse().ok())
                else {
                    return Ok(None);
                };
                Ok(self.users.find_by_id(user_id).await?)
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(customer_id, error = %err, "customer fetch failed during checkout resolution");
                Ok(None)
            }
        }
    }

    /// Copies live subscription state onto the user; on fetch failure,
    /// assumes active with a synthesized period end since the checkout
    /// itself just succeeded.
    async fn apply_live_subscription(&self, user: &mut User, subscription_id: &str) {
        match self.provider.get_subscription(subscription_id).await {
            Ok(Some(live)) => {
                user.apply_status(SubscriptionStatus::from_provider(&live.status));
                user.subscription_plan = live.price_id.clone();
                user.subscription_start = live
                    .current_period_start
                    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));
                user.subscription_end = live
                    .current_period_end
                    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));
            }
            Ok(None) => {
                warn!(subscription_id, "live subscription missing after checkout");
                user.apply_status(SubscriptionStatus::Active);
                user.subscription_end = Some(synthetic_period_end(Utc::now()));
            }
            Err(err) => {
                warn!(subscription_id, error = %err, "subscription fetch failed after checkout");
                user.apply_status(SubscriptionStatus::Active);
                user.subscription_end = Some(synthetic_period_end(Utc::now()));
            }
        }
    }
}

#[async_trait::async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![StripeEventType::CheckoutSessionCompleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Outcome, ReconciliationError> {
        let session: CheckoutSessionObject = event
            .deserialize_object()
            .map_err(|e| ReconciliationError::ParseError(e.to_string()))?;

        if session.is_feature_purchase() {
            self.handle_feature_purchase(&session).await
        } else if let Some(subscription_id) = session.subscription.clone() {
            self.handle_subscription_checkout(&session, &subscription_id)
                .await
        } else {
            info!(session_id = %session.id, "checkout session with no subscription or feature tag");
            Ok(Outcome::Skipped(
                "session carries neither subscription nor feature metadata".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryListingRepository, InMemoryPaymentLedger, InMemoryUserRepository,
        MockBillingProvider,
    };
    use crate::domain::billing::stripe_event::StripeEventBuilder;
    use crate::domain::foundation::{ListingId, UserId};
    use crate::domain::marketplace::Listing;
    use serde_json::json;

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        listings: Arc<InMemoryListingRepository>,
        ledger: Arc<InMemoryPaymentLedger>,
        provider: Arc<MockBillingProvider>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                users: Arc::new(InMemoryUserRepository::new()),
                listings: Arc::new(InMemoryListingRepository::new()),
                ledger: Arc::new(InMemoryPaymentLedger::new()),
                provider: Arc::new(MockBillingProvider::new()),
            }
        }

        fn handler(&self) -> CheckoutCompletedHandler {
            CheckoutCompletedHandler::new(
                self.users.clone(),
                self.listings.clone(),
                self.ledger.clone(),
                self.provider.clone(),
            )
        }
    }

    fn feature_event(listing_id: ListingId, user_id: UserId) -> StripeEvent {
        StripeEventBuilder::new()
            .event_type("checkout.session.completed")
            .object(json!({
                "id": "cs_feat",
                "customer": "cus_1",
                "payment_intent": "pi_1",
                "amount_total": 2500,
                "currency": "usd",
                "metadata": {
                    "listing_id": listing_id.to_string(),
                    "user_id": user_id.to_string()
                }
            }))
            .build()
    }

    #[tokio::test]
    async fn feature_purchase_flags_listing_for_thirty_days() {
        let fx = Fixture::new();
        let owner = UserId::new();
        let listing = Listing::new(ListingId::new(), owner, "Massage therapy");
        fx.listings.insert(listing.clone()).await;

        let outcome = fx
            .handler()
            .handle(&feature_event(listing.id, owner))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied);
        let stored = fx.listings.find_by_id(listing.id).await.unwrap().unwrap();
        assert!(stored.is_featured);
        let expected = Utc::now() + Duration::days(FEATURE_WINDOW_DAYS);
        let actual = stored.feature_expiration.unwrap();
        assert!((actual - expected).num_seconds().abs() < 5);
        assert_eq!(fx.ledger.len().await, 1);
    }

    #[tokio::test]
    async fn feature_purchase_for_unknown_listing_is_skipped() {
        let fx = Fixture::new();

        let outcome = fx
            .handler()
            .handle(&feature_event(ListingId::new(), UserId::new()))
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Skipped(_)));
        assert_eq!(fx.ledger.len().await, 0);
    }

    #[tokio::test]
    async fn feature_purchase_survives_ledger_failure() {
        let fx = Fixture::new();
        let listing = Listing::new(ListingId::new(), UserId::new(), "Yoga classes");
        fx.listings.insert(listing.clone()).await;
        fx.ledger.fail_writes().await;

        let outcome = fx
            .handler()
            .handle(&feature_event(listing.id, UserId::new()))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Applied);
        let stored = fx.listings.find_by_id(listing.id).await.unwrap().unwrap();
        assert!(stored.is_featured);
    }

    #[tokio::test]
    async fn subscription_checkout_copies_live_state() {
        let fx = Fixture::new();
        let user = User::new(UserId::new(), "pro@example.com");
        fx.users.insert(user.clone()).await;
        fx.provider.add_subscription_with_status("sub_1", "cus_1", "trialing");

        let event = StripeEventBuilder::new()
            .event_type("checkout.session.completed")
            .object(json!({
                "id": "cs_sub",
                "customer": "cus_1",
                "subscription": "sub_1",
                "amount_total": 1999,
                "currency": "usd",
                "metadata": { "user_id": user.id.to_string() }
            }))
            .build();

        let outcome = fx.handler().handle(&event).await.unwrap();

        assert_eq!(outcome, Outcome::Applied);
        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.is_subscribed);
        assert_eq!(stored.subscription_status, SubscriptionStatus::Trialing);
        assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(stored.stripe_subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(fx.ledger.len().await, 1);
    }

    #[tokio::test]
    async fn subscription_checkout_defaults_to_active_when_fetch_fails() {
        let fx = Fixture::new();
        let user = User::new(UserId::new(), "pro2@example.com");
        fx.users.insert(user.clone()).await;
        fx.provider.fail_requests();

        let event = StripeEventBuilder::new()
            .event_type("checkout.session.completed")
            .object(json!({
                "id": "cs_sub2",
                "customer": "cus_2",
                "subscription": "sub_2",
                "metadata": { "user_id": user.id.to_string() }
            }))
            .build();

        let outcome = fx.handler().handle(&event).await.unwrap();

        assert_eq!(outcome, Outcome::Applied);
        let stored = fx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.is_subscribed);
        assert_eq!(stored.subscription_status, SubscriptionStatus::Active);
        assert!(stored.subscription_end.is_some());
    }

    #[tokio::test]
    async fn subscription_checkout_with_no_user_is_unresolvable() {
        let fx = Fixture::new();

        let event = StripeEventBuilder::new()
            .event_type("checkout.session.completed")
            .object(json!({
                "id": "cs_ghost",
                "customer": "cus_ghost",
                "subscription": "sub_ghost"
            }))
            .build();

        let result = fx.handler().handle(&event).await;

        assert!(matches!(result, Err(ReconciliationError::Unresolvable(_))));
        assert_eq!(fx.ledger.len().await, 0);
    }
}
