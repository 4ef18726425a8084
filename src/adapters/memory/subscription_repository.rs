//! In-memory subscription repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::SubscriptionRecord;
use crate::domain::foundation::DomainError;
use crate::ports::SubscriptionRepository;

/// Keyed by `stripe_subscription_id`, matching the database's uniqueness
/// constraint.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    records: RwLock<HashMap<String, SubscriptionRecord>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_stripe_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self.records.read().await.get(subscription_id).cloned())
    }

    async fn upsert(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.stripe_subscription_id) {
            Some(existing) => {
                // Keep the original row identity on update.
                let id = existing.id;
                *existing = record.clone();
                existing.id = id;
            }
            None => {
                records.insert(record.stripe_subscription_id.clone(), record.clone());
            }
        }
        Ok(())
    }
}
