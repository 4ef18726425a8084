//! Stripe REST client implementing the [`BillingProvider`] port.
//!
//! The reconciliation core only reads from Stripe: customers (for metadata
//! resolution) and subscriptions (for live status and period bounds).
//! Secrets are held in `secrecy::SecretString` so they never appear in
//! debug output.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{BillingCustomer, BillingProvider, ProviderError, ProviderSubscription};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeClientConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Overrides the API base URL (for testing against a local stub).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Read-only Stripe REST client.
pub struct StripeClient {
    config: StripeClientConfig,
    http_client: reqwest::Client,
}

impl StripeClient {
    pub fn new(config: StripeClientConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, ProviderError> {
        let response = self
            .http_client
            .get(url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| ProviderError::DecodeFailed(e.to_string()))
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn get_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<BillingCustomer>, ProviderError> {
        let url = format!("{}/v1/customers/{}", self.config.api_base_url, customer_id);
        let Some(customer) = self.get_json::<StripeCustomer>(&url).await? else {
            return Ok(None);
        };

        // Stripe returns deleted customers as a stub object, not a 404.
        if customer.deleted {
            return Ok(None);
        }

        Ok(Some(BillingCustomer {
            id: customer.id,
            email: customer.email,
            metadata: customer.metadata,
        }))
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, ProviderError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );
        let Some(sub) = self.get_json::<StripeSubscription>(&url).await? else {
            return Ok(None);
        };

        Ok(Some(ProviderSubscription {
            id: sub.id,
            customer_id: sub.customer,
            status: sub.status,
            price_id: sub
                .items
                .data
                .first()
                .and_then(|item| item.price.as_ref())
                .map(|price| price.id.clone()),
            current_period_start: sub.current_period_start,
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
    email: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct StripeSubscription {
    id: String,
    customer: String,
    status: String,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    #[serde(default)]
    cancel_at_period_end: bool,
    #[serde(default)]
    items: StripeSubscriptionItems,
}

#[derive(Debug, Default, Deserialize)]
struct StripeSubscriptionItems {
    #[serde(default)]
    data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct StripeSubscriptionItem {
    price: Option<StripePrice>,
}

#[derive(Debug, Deserialize)]
struct StripePrice {
    id: String,
}
