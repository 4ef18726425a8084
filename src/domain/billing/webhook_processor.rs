//! Event routing and idempotent processing.
//!
//! The dispatcher owns the event-type table; the processor wraps it with
//! event-id deduplication so redelivered events are acknowledged without
//! re-running side effects.

use std::sync::Arc;

use tracing::{info, warn};

use super::stripe_event::{StripeEvent, StripeEventType};
use super::webhook_errors::ReconciliationError;
use crate::ports::webhook_event_repository::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// Outcome of a handler that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State was reconciled.
    Applied,
    /// The event was recognized but deliberately not acted on, with the
    /// reason recorded for the audit trail.
    Skipped(String),
}

/// Result of processing a webhook event end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was processed and state was updated.
    Processed,
    /// Event was recognized but produced no state change.
    Ignored(String),
    /// Event id was seen before; nothing re-ran.
    AlreadyProcessed,
    /// The handler failed; the failure was recorded and the event
    /// acknowledged so the provider stops redelivering it.
    FailedAcknowledged(String),
}

/// A handler for one or more webhook event types.
#[async_trait::async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// The event types this handler accepts.
    fn handles(&self) -> Vec<StripeEventType>;

    /// Reconciles local state from the event.
    async fn handle(&self, event: &StripeEvent) -> Result<Outcome, ReconciliationError>;
}

/// Routes events to their registered handler by exact event type.
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn WebhookEventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Registers a handler for the event types it declares.
    pub fn register(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Finds the handler for the given event type, if any.
    fn handler_for(&self, event_type: StripeEventType) -> Option<&Arc<dyn WebhookEventHandler>> {
        self.handlers
            .iter()
            .find(|h| h.handles().contains(&event_type))
    }

    /// Dispatches an event to its handler.
    ///
    /// Unrecognized event types are ignored, not errors: the intake accepts
    /// the full event stream and acts on the subset it understands.
    pub async fn dispatch(&self, event: &StripeEvent) -> Result<Outcome, ReconciliationError> {
        let event_type = event.parsed_type();

        match self.handler_for(event_type) {
            Some(handler) => handler.handle(event).await,
            None => {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "unhandled event type, acknowledging"
                );
                Ok(Outcome::Skipped(format!(
                    "unhandled event type: {}",
                    event.event_type
                )))
            }
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Processes webhook events exactly once by event id.
pub struct IdempotentWebhookProcessor {
    registry: HandlerRegistry,
    event_repository: Arc<dyn WebhookEventRepository>,
}

impl IdempotentWebhookProcessor {
    pub fn new(registry: HandlerRegistry, event_repository: Arc<dyn WebhookEventRepository>) -> Self {
        Self {
            registry,
            event_repository,
        }
    }

    /// Processes a verified event.
    ///
    /// Handler failures are recorded and acknowledged rather than propagated;
    /// redelivery cannot fix an event we could not resolve. Only failures of
    /// the dedup store itself escape, since without a record the event is
    /// safe to redeliver.
    pub async fn process(&self, event: &StripeEvent) -> Result<WebhookResult, ReconciliationError> {
        if self
            .event_repository
            .find_by_event_id(&event.id)
            .await
            .map_err(|e| ReconciliationError::StoreWriteFailed(e.to_string()))?
            .is_some()
        {
            info!(event_id = %event.id, "duplicate event, skipping");
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let (record, result) = match self.registry.dispatch(event).await {
            Ok(Outcome::Applied) => {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "event processed"
                );
                (WebhookEventRecord::success(event), WebhookResult::Processed)
            }
            Ok(Outcome::Skipped(reason)) => (
                WebhookEventRecord::ignored(event, &reason),
                WebhookResult::Ignored(reason),
            ),
            Err(err) => {
                warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %err,
                    "event handler failed, acknowledging"
                );
                let message = err.to_string();
                (
                    WebhookEventRecord::failed(event, &message),
                    WebhookResult::FailedAcknowledged(message),
                )
            }
        };

        match self
            .event_repository
            .save(&record)
            .await
            .map_err(|e| ReconciliationError::StoreWriteFailed(e.to_string()))?
        {
            SaveResult::Inserted => Ok(result),
            // Lost a race with a concurrent delivery of the same event.
            SaveResult::AlreadyExists => Ok(WebhookResult::AlreadyProcessed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryWebhookEventRepository;
    use crate::domain::billing::stripe_event::StripeEventBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        event_type: StripeEventType,
        calls: AtomicUsize,
        result: fn() -> Result<Outcome, ReconciliationError>,
    }

    impl CountingHandler {
        fn applied(event_type: StripeEventType) -> Self {
            Self {
                event_type,
                calls: AtomicUsize::new(0),
                result: || Ok(Outcome::Applied),
            }
        }

        fn failing(event_type: StripeEventType) -> Self {
            Self {
                event_type,
                calls: AtomicUsize::new(0),
                result: || Err(ReconciliationError::Unresolvable("no user".to_string())),
            }
        }
    }

    #[async_trait::async_trait]
    impl WebhookEventHandler for CountingHandler {
        fn handles(&self) -> Vec<StripeEventType> {
            vec![self.event_type]
        }

        async fn handle(&self, _event: &StripeEvent) -> Result<Outcome, ReconciliationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn processor_with(
        handler: Arc<dyn WebhookEventHandler>,
    ) -> (IdempotentWebhookProcessor, Arc<InMemoryWebhookEventRepository>) {
        let repo = Arc::new(InMemoryWebhookEventRepository::new());
        let registry = HandlerRegistry::new().register(handler);
        (
            IdempotentWebhookProcessor::new(registry, repo.clone()),
            repo,
        )
    }

    #[tokio::test]
    async fn processes_event_once() {
        let handler = Arc::new(CountingHandler::applied(
            StripeEventType::CheckoutSessionCompleted,
        ));
        let (processor, _repo) = processor_with(handler.clone());
        let event = StripeEventBuilder::new().id("evt_once").build();

        let first = processor.process(&event).await.unwrap();
        let second = processor.process(&event).await.unwrap();

        assert_eq!(first, WebhookResult::Processed);
        assert_eq!(second, WebhookResult::AlreadyProcessed);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unhandled_event_type_is_ignored() {
        let handler = Arc::new(CountingHandler::applied(
            StripeEventType::CheckoutSessionCompleted,
        ));
        let (processor, repo) = processor_with(handler.clone());
        let event = StripeEventBuilder::new()
            .id("evt_unknown")
            .event_type("payment_intent.created")
            .build();

        let result = processor.process(&event).await.unwrap();

        assert!(matches!(result, WebhookResult::Ignored(_)));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        // Still recorded for dedup.
        assert!(repo.find_by_event_id("evt_unknown").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn handler_failure_is_acknowledged_and_recorded() {
        let handler = Arc::new(CountingHandler::failing(
            StripeEventType::InvoicePaymentFailed,
        ));
        let (processor, repo) = processor_with(handler);
        let event = StripeEventBuilder::new()
            .id("evt_fail")
            .event_type("invoice.payment_failed")
            .build();

        let result = processor.process(&event).await.unwrap();

        assert!(matches!(result, WebhookResult::FailedAcknowledged(_)));
        let record = repo.find_by_event_id("evt_fail").await.unwrap().unwrap();
        assert_eq!(record.status, "failed");
    }

    #[tokio::test]
    async fn failed_event_is_not_retried_on_redelivery() {
        let handler = Arc::new(CountingHandler::failing(
            StripeEventType::InvoicePaymentFailed,
        ));
        let (processor, _repo) = processor_with(handler.clone());
        let event = StripeEventBuilder::new()
            .id("evt_fail_redelivered")
            .event_type("invoice.payment_failed")
            .build();

        processor.process(&event).await.unwrap();
        let second = processor.process(&event).await.unwrap();

        assert_eq!(second, WebhookResult::AlreadyProcessed);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }
}
