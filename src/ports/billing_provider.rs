//! Billing provider port.
//!
//! Live reads against the payment provider's API, used when a webhook
//! payload alone cannot identify the affected user or the current state
//! of a subscription.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the billing provider API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or transport failure.
    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    /// The provider returned a non-success status.
    #[error("Provider returned {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Provider response decode failed: {0}")]
    DecodeFailed(String),
}

/// A customer as known to the billing provider.
#[derive(Debug, Clone)]
pub struct BillingCustomer {
    pub id: String,
    pub email: Option<String>,
    /// Metadata attached at checkout time; may carry our user id.
    pub metadata: HashMap<String, String>,
}

impl BillingCustomer {
    /// Our user id from customer metadata, if present.
    pub fn user_id_metadata(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }
}

/// A subscription as known to the billing provider.
#[derive(Debug, Clone)]
pub struct ProviderSubscription {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub price_id: Option<String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
}

/// Read access to the billing provider's API.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Fetches a customer. `Ok(None)` means the customer does not exist.
    async fn get_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<BillingCustomer>, ProviderError>;

    /// Fetches a subscription. `Ok(None)` means it does not exist.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, ProviderError>;
}
