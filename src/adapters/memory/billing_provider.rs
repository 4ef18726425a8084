//! Scripted billing provider for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{BillingCustomer, BillingProvider, ProviderError, ProviderSubscription};

/// A billing provider backed by scripted responses.
#[derive(Default)]
pub struct MockBillingProvider {
    customers: Mutex<HashMap<String, BillingCustomer>>,
    subscriptions: Mutex<HashMap<String, ProviderSubscription>>,
    fail: AtomicBool,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a customer, optionally carrying our user id in metadata.
    pub fn add_customer(&self, id: &str, email: Option<&str>, user_id: Option<&str>) {
        let mut metadata = HashMap::new();
        if let Some(user_id) = user_id {
            metadata.insert("user_id".to_string(), user_id.to_string());
        }
        self.customers.lock().unwrap_or_else(|e| e.into_inner()).insert(
            id.to_string(),
            BillingCustomer {
                id: id.to_string(),
                email: email.map(str::to_string),
                metadata,
            },
        );
    }

    /// Scripts a subscription with the given status and a month-long
    /// billing period.
    pub fn add_subscription_with_status(&self, id: &str, customer_id: &str, status: &str) {
        let now = chrono::Utc::now().timestamp();
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                id.to_string(),
                ProviderSubscription {
                    id: id.to_string(),
                    customer_id: customer_id.to_string(),
                    status: status.to_string(),
                    price_id: Some("price_monthly".to_string()),
                    current_period_start: Some(now),
                    current_period_end: Some(now + 30 * 24 * 3600),
                    cancel_at_period_end: false,
                },
            );
    }

    /// Makes every subsequent request fail with a transport error.
    pub fn fail_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::RequestFailed(
                "scripted transport failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn get_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<BillingCustomer>, ProviderError> {
        self.check_failure()?;
        Ok(self
            .customers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(customer_id)
            .cloned())
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, ProviderError> {
        self.check_failure()?;
        Ok(self
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(subscription_id)
            .cloned())
    }
}
