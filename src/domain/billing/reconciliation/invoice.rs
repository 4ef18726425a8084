//! `invoice.payment_succeeded` / `.payment_failed` handlers.

use std::sync::Arc;

use tracing::{info, warn};

use super::resolver::SubscriptionResolver;
use crate::domain::billing::payloads::InvoiceObject;
use crate::domain::billing::payment::PaymentRecord;
use crate::domain::billing::stripe_event::{StripeEvent, StripeEventType};
use crate::domain::billing::webhook_errors::ReconciliationError;
use crate::domain::billing::webhook_processor::{Outcome, WebhookEventHandler};
use crate::domain::billing::SubscriptionStatus;
use crate::ports::{PaymentLedger, SubscriptionRepository, UserRepository};

/// Handles subscription invoice outcomes.
///
/// A successful invoice is the renewal heartbeat: it re-asserts active
/// entitlement on every billing cycle, healing any state an earlier missed
/// event left stale. A failed invoice marks the account past due but keeps
/// access until a lifecycle event revokes it.
pub struct InvoiceHandler {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn PaymentLedger>,
    resolver: Arc<SubscriptionResolver>,
}

impl InvoiceHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn PaymentLedger>,
        resolver: Arc<SubscriptionResolver>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            ledger,
            resolver,
        }
    }

    async fn handle_succeeded(
        &self,
        invoice: &InvoiceObject,
        subscription_id: &str,
    ) -> Result<Outcome, ReconciliationError> {
        let resolution = self
            .resolver
            .resolve_or_create(subscription_id, invoice.customer.as_deref(), None)
            .await?;

        let Some(resolution) = resolution else {
            warn!(
                invoice_id = %invoice.id,
                subscription_id,
                "paid invoice maps to no user, skipping"
            );
            return Ok(Outcome::Skipped("no user resolved".to_string()));
        };

        let mut record = resolution.record;
        record.status = SubscriptionStatus::Active;
        self.subscriptions.upsert(&record).await?;

        let mut user = resolution.user;
        user.apply_status(SubscriptionStatus::Active);
        user.stripe_subscription_id = Some(subscription_id.to_string());
        if let Some(customer_id) = invoice.customer.as_deref() {
            user.attach_customer_id(customer_id);
        }
        user.subscription_end = record.current_period_end.or(user.subscription_end);
        self.users.save_billing_state(&user).await?;

        info!(
            invoice_id = %invoice.id,
            subscription_id,
            user_id = %user.id,
            "renewal reconciled"
        );

        let payment = PaymentRecord::subscription(
            user.id,
            &invoice.id,
            invoice.payment_intent.clone(),
            invoice.amount_paid,
            if invoice.currency.is_empty() {
                "usd"
            } else {
                invoice.currency.as_str()
            },
            serde_json::json!({ "invoice_id": invoice.id, "subscription_id": subscription_id }),
        );
        if let Err(err) = self.ledger.record(&payment).await {
            warn!(invoice_id = %invoice.id, error = %err, "renewal ledger write failed");
        }

        Ok(Outcome::Applied)
    }

    /// Failed invoices never reconstruct state; an unknown subscription is
    /// just logged.
    async fn handle_failed(
        &self,
        invoice: &InvoiceObject,
        subscription_id: &str,
    ) -> Result<Outcome, ReconciliationError> {
        if let Some(mut record) = self
            .subscriptions
            .find_by_stripe_subscription_id(subscription_id)
            .await?
        {
            record.status = SubscriptionStatus::PastDue;
            self.subscriptions.upsert(&record).await?;

            if let Some(mut user) = self.users.find_by_id(record.user_id).await? {
                user.mark_status_only(SubscriptionStatus::PastDue);
                self.users.save_billing_state(&user).await?;
                info!(
                    invoice_id = %invoice.id,
                    subscription_id,
                    user_id = %user.id,
                    "invoice failure recorded, entitlement kept for grace period"
                );
            }
            return Ok(Outcome::Applied);
        }

        if let Some(mut user) = self
            .users
            .find_by_stripe_subscription_id(subscription_id)
            .await?
        {
            user.mark_status_only(SubscriptionStatus::PastDue);
            self.users.save_billing_state(&user).await?;
            info!(
                invoice_id = %invoice.id,
                subscription_id,
                user_id = %user.id,
                "invoice failure recorded via user fallback"
            );
            return Ok(Outcome::Applied);
        }

        warn!(invoice_id = %invoice.id, subscription_id, "failed invoice for unknown subscription");
        Ok(Outcome::Skipped("unknown subscription".to_string()))
    }
}

#[async_trait::async_trait]
impl WebhookEventHandler for InvoiceHandler {
    fn handles(&self) -> Vec<StripeEventType> {
        vec![
            StripeEventType::InvoicePaymentSucceeded,
            StripeEventType::InvoicePaymentFailed,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<Outcome, ReconciliationError> {
        let invoice: InvoiceObject = event
            .deserialize_object()
            .map_err(|e| ReconciliationError::ParseError(e.to_string()))?;

        // Only subscription invoices drive entitlement.
        let Some(subscription_id) = invoice.subscription.clone() else {
            info!(invoice_id = %invoice.id, "invoice without subscription reference, skipping");
            return Ok(Outcome::Skipped("invoice has no subscription".to_string()));
        };

        match event.parsed_type() {
            StripeEventType::InvoicePaymentSucceeded => {
                self.handle_succeeded(&invoice, &subscription_id).await
            }
            StripeEventType::InvoicePaymentFailed => {
                self.handle_failed(&invoice, &subscription_id).await
            }
            other => Ok(Outcome::Skipped(format!(
                "unexpected event type {} for invoice handler",
                other.as_str()
            ))),
        }
    }
}
