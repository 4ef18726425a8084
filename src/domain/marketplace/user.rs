//! User billing projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::UserId;

/// A marketplace user (provider or product seller) as the billing core
/// sees them: identity plus subscription entitlement state.
///
/// Created at registration (outside this core) and mutated exclusively by
/// webhook reconciliation handlers. Never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Contact email, set at registration.
    pub email: String,

    /// Stripe customer id; absent until the first checkout completes.
    pub stripe_customer_id: Option<String>,

    /// Stripe subscription id; absent until a subscription exists.
    pub stripe_subscription_id: Option<String>,

    /// Entitlement flag read by the directory and listing screens.
    pub is_subscribed: bool,

    /// Mirrored subscription status.
    pub subscription_status: SubscriptionStatus,

    /// Plan label shown on billing screens.
    pub subscription_plan: Option<String>,

    /// Current billing period start.
    pub subscription_start: Option<DateTime<Utc>>,

    /// Current billing period end.
    pub subscription_end: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a user with no billing history.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            is_subscribed: false,
            subscription_status: SubscriptionStatus::None,
            subscription_plan: None,
            subscription_start: None,
            subscription_end: None,
        }
    }

    /// Applies a subscription status and recomputes the entitlement flag.
    ///
    /// This is the status-gated transition: `is_subscribed` becomes true
    /// exactly when the status grants access (active or trialing).
    pub fn apply_status(&mut self, status: SubscriptionStatus) {
        self.subscription_status = status;
        self.is_subscribed = status.grants_access();
    }

    /// Records a status without touching the entitlement flag.
    ///
    /// Used for the invoice-failure grace period: a single failed payment
    /// marks the account `past_due` but does not revoke access until a
    /// later lifecycle event does.
    pub fn mark_status_only(&mut self, status: SubscriptionStatus) {
        self.subscription_status = status;
    }

    /// Stores the Stripe customer id if not already present.
    pub fn attach_customer_id(&mut self, customer_id: &str) {
        if self.stripe_customer_id.is_none() {
            self.stripe_customer_id = Some(customer_id.to_string());
        }
    }

    /// True when the entitlement flag agrees with the status gate.
    pub fn entitlement_consistent(&self) -> bool {
        self.is_subscribed == self.subscription_status.grants_access()
    }
}
