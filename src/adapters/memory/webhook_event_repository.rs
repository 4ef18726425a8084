//! In-memory webhook event dedup store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    records: RwLock<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.read().await.get(event_id).cloned())
    }

    async fn save(&self, record: &WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.event_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        records.insert(record.event_id.clone(), record.clone());
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.processed_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::stripe_event::StripeEventBuilder;

    #[tokio::test]
    async fn save_reports_race_loser() {
        let repo = InMemoryWebhookEventRepository::new();
        let event = StripeEventBuilder::new().id("evt_race").build();
        let record = WebhookEventRecord::success(&event);

        assert_eq!(repo.save(&record).await.unwrap(), SaveResult::Inserted);
        assert_eq!(repo.save(&record).await.unwrap(), SaveResult::AlreadyExists);
    }

    #[tokio::test]
    async fn delete_before_prunes_old_records() {
        let repo = InMemoryWebhookEventRepository::new();
        let event = StripeEventBuilder::new().id("evt_old").build();
        repo.save(&WebhookEventRecord::success(&event)).await.unwrap();

        let removed = repo
            .delete_before(Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(repo.find_by_event_id("evt_old").await.unwrap().is_none());
    }
}
