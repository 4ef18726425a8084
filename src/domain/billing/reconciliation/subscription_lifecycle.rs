//! `customer.subscription.created` / `.updated` / `.deleted` handlers.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::resolver::SubscriptionResolver;
use crate::domain::billing::payloads::SubscriptionObject;
use crate::domain::billing::stripe_event::{StripeEvent, StripeEventType};
use crate::domain::billing::webhook_errors::ReconciliationError;
use crate::domain::billing::webhook_processor::{Outcome, WebhookEventHandler};
use crate::domain::billing::SubscriptionStatus;
use crate::ports::{SubscriptionRepository, UserRepository};

/// Handles subscription lifecycle events.
///
/// Created and updated share one recipe: resolve (healing a missed record
/// if necessary), copy the payload onto the record, and gate the user's
/// entitlement on the payload status. Deleted transitions both the record
/// and the user to canceled without ever reconstructing a record.
pub struct SubscriptionLifecycleHandler {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    resolver: Arc<SubscriptionResolver>,
}

impl SubscriptionLifecycleHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        resolver: Arc<SubscriptionResolver>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            resolver,
        }
    }

    async fn handle_created_or_updated(
        &self,
        payload: &SubscriptionObject,
    ) -> Result<Outcome, ReconciliationError> {
        let resolution = self
            .resolver
            .resolve_or_create(&payload.id, Some(&payload.customer), Some(payload))
            .await?;

        let Some(resolution) = resolution else {
            warn!(
                subscription_id = %payload.id,
                customer_id = %payload.customer,
                "subscription event maps to no user, skipping"
            );
            return Ok(Outcome::Skipped("no user resolved".to_string()));
        };

        let mut record = resolution.record;
        let status = payload.parsed_status();

        record.status = status;
        record.stripe_price_id = payload
            .price_id()
            .map(str::to_string)
            .or(record.stripe_price_id);
        record.current_period_start = payload.period_start().or(record.current_period_start);
        record.current_period_end = payload.period_end().or(record.current_period_end);
        record.cancel_at_period_end = payload.cancel_at_period_end;
        if let Some(canceled_at) = payload.canceled_at_time() {
            record.canceled_at = Some(canceled_at);
        }
        self.subscriptions.upsert(&record).await?;

        let mut user = resolution.user;
        user.stripe_subscription_id = Some(payload.id.clone());
        user.attach_customer_id(&payload.customer);
        user.apply_status(status);
        user.subscription_plan = record.stripe_price_id.clone().or(user.subscription_plan);
        user.subscription_start = payload.period_start().or(user.subscription_start);
        user.subscription_end = payload.period_end().or(user.subscription_end);
        self.users.save_billing_state(&user).await?;

        info!(
            subscription_id = %payload.id,
            user_id = %user.id,
            %status,
            is_subscribed = user.is_subscribed,
            "subscription lifecycle reconciled"
        );

        Ok(Outcome::Applied)
    }

    /// Deletion never reconstructs a record: a cancellation for a
    /// subscription we never knew about has nothing worth mirroring.
    async fn handle_deleted(
        &self,
        payload: &SubscriptionObject,
    ) -> Result<Outcome, ReconciliationError> {
        let now = Utc::now();

        if let Some(mut record) = self
            .subscriptions
            .find_by_stripe_subscription_id(&payload.id)
            .await?
        {
            record.cancel(now);
            self.subscriptions.upsert(&record).await?;

            if let Some(mut user) = self.users.find_by_id(record.user_id).await? {
                user.apply_status(SubscriptionStatus::Canceled);
                self.users.save_billing_state(&user).await?;
                info!(subscription_id = %payload.id, user_id = %user.id, "subscription canceled");
            } else {
                warn!(
                    subscription_id = %payload.id,
                    user_id = %record.user_id,
                    "canceled subscription references a missing user"
                );
            }
            return Ok(Outcome::Applied);
        }

        if let Some(mut user) = self
            .users
            .find_by_stripe_subscription_id(&payload.id)
            .await?
        {
            user.apply_status(SubscriptionStatus::Canceled);
            self.users.save_billing_state(&user).await?;
            info!(
                subscription_id = %payload.id,
                user_id = %user.id,
                "subscription canceled via user fallback"
            );
            return Ok(Outcome::Applied);
        }

        warn!(subscription_id = %payload.id, "deletion for unknown subscription, skipping");
        Ok(Outcome::Skipped("unknown subscription".to_string()))
    }
}

#[async_trait::async_trait]
impl WebhookEventHandler for SubscriptionLifecycleHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![
            StripeEventType::CustomerSubscriptionCreated,
            StripeEventType::CustomerSubscriptionUpdated,
            StripeEventType::CustomerSubscriptionDeleted,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Outcome, ReconciliationError> {
        let payload: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| ReconciliationError::ParseError(e.to_string()))?;

        match event.parsed_type() {
            StripeEventType::CustomerSubscriptionCreated
            | StripeEventType::CustomerSubscriptionUpdated => {
                self.handle_created_or_updated(&payload).await
            }
            StripeEventType::CustomerSubscriptionDeleted => self.handle_deleted(&payload).await,
            other => Ok(Outcome::Skipped(format!(
                "unexpected event type {} for lifecycle handler",
                other.as_str()
            ))),
        }
    }
}
