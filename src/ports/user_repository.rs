//! User persistence port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::marketplace::User;

/// Repository for user accounts and their billing state.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by internal id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Finds the user attached to a provider customer id.
    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, DomainError>;

    /// Finds the user attached to a provider subscription id.
    async fn find_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<User>, DomainError>;

    /// Persists the billing-related fields of a user.
    async fn save_billing_state(&self, user: &User) -> Result<(), DomainError>;
}
