//! Subscription record persistence port.

use async_trait::async_trait;

use crate::domain::billing::SubscriptionRecord;
use crate::domain::foundation::DomainError;

/// Repository for subscription records keyed by the provider's
/// subscription id.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Finds a record by the provider's subscription id.
    async fn find_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Inserts or updates a record, keyed on the provider subscription id.
    async fn upsert(&self, record: &SubscriptionRecord) -> Result<(), DomainError>;
}
