//! Subscription mirror record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SubscriptionStatus;
use crate::domain::foundation::{SubscriptionId, UserId};

/// Local mirror of a Stripe subscription, kept so the marketplace can
/// query billing state without calling out to the provider.
///
/// At most one record may exist per `stripe_subscription_id`; all writes
/// go through upserts keyed on that field. "Deletion" is a transition to
/// `Canceled`, never a row delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub stripe_price_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    /// Creates a new mirror record for a user.
    pub fn new(
        user_id: UserId,
        stripe_customer_id: impl Into<String>,
        stripe_subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            stripe_customer_id: stripe_customer_id.into(),
            stripe_subscription_id: stripe_subscription_id.into(),
            stripe_price_id: None,
            status: SubscriptionStatus::Active,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
            canceled_at: None,
        }
    }

    /// Marks the subscription canceled as of `now`.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = SubscriptionStatus::Canceled;
        self.canceled_at = Some(now);
    }
}
