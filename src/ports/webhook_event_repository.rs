//! Webhook event dedup store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::billing::StripeEvent;
use crate::domain::foundation::DomainError;

/// Result of persisting a webhook event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// The record was inserted.
    Inserted,
    /// A record with this event id already exists.
    AlreadyExists,
}

/// A processed webhook event, kept for idempotency and audit.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Provider event id; the idempotency key.
    pub event_id: String,
    pub event_type: String,
    /// "processed", "ignored", or "failed".
    pub status: String,
    /// Skip reason or error message, when not processed.
    pub detail: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl WebhookEventRecord {
    pub fn success(event: &StripeEvent) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            status: "processed".to_string(),
            detail: None,
            processed_at: Utc::now(),
        }
    }

    pub fn ignored(event: &StripeEvent, reason: &str) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            status: "ignored".to_string(),
            detail: Some(reason.to_string()),
            processed_at: Utc::now(),
        }
    }

    pub fn failed(event: &StripeEvent, error: &str) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            status: "failed".to_string(),
            detail: Some(error.to_string()),
            processed_at: Utc::now(),
        }
    }
}

/// Store of processed webhook events.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Looks up a record by provider event id.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Persists a record, reporting whether an earlier record won the race.
    async fn save(&self, record: &WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Deletes records processed before the cutoff. Returns the number
    /// removed. Retention is bounded because the provider stops
    /// redelivering events after a few days.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
