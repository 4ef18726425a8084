//! ProcessWebhookHandler - command handler for inbound billing webhooks.
//!
//! The full intake pipeline: verify the signature over the raw bytes,
//! apply the livemode guard, then hand the event to the idempotent
//! processor.

use std::sync::Arc;

use tracing::warn;

use crate::domain::billing::{
    IdempotentWebhookProcessor, ReconciliationError, StripeWebhookVerifier, WebhookResult,
};

/// Command to process one webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Value of the Stripe-Signature header.
    pub signature: String,
}

pub struct ProcessWebhookHandler {
    verifier: StripeWebhookVerifier,
    processor: Arc<IdempotentWebhookProcessor>,
    require_livemode: bool,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: StripeWebhookVerifier,
        processor: Arc<IdempotentWebhookProcessor>,
        require_livemode: bool,
    ) -> Self {
        Self {
            verifier,
            processor,
            require_livemode,
        }
    }

    /// # Errors
    ///
    /// Signature, timestamp, and payload-shape failures surface as errors
    /// so the transport can answer 400. Everything past verification is
    /// acknowledged; only a dedup-store failure escapes as
    /// `StoreWriteFailed`.
    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<WebhookResult, ReconciliationError> {
        let event = self.verifier.verify_and_parse(&cmd.payload, &cmd.signature)?;

        if self.require_livemode && !event.is_live() {
            warn!(event_id = %event.id, "test-mode event rejected in live configuration");
            return Ok(WebhookResult::Ignored("test-mode event".to_string()));
        }

        self.processor.process(&event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapters::memory::InMemoryWebhookEventRepository;
    use crate::domain::billing::webhook_verifier::compute_test_signature;
    use crate::domain::billing::HandlerRegistry;
    use crate::ports::WebhookEventRepository;

    const TEST_SECRET: &str = "whsec_app_test_secret";

    fn handler(
        require_livemode: bool,
    ) -> (ProcessWebhookHandler, Arc<InMemoryWebhookEventRepository>) {
        let events = Arc::new(InMemoryWebhookEventRepository::new());
        let processor = Arc::new(IdempotentWebhookProcessor::new(
            HandlerRegistry::new(),
            events.clone(),
        ));
        let handler = ProcessWebhookHandler::new(
            StripeWebhookVerifier::new(TEST_SECRET),
            processor,
            require_livemode,
        );
        (handler, events)
    }

    fn signed_command(payload: &str) -> ProcessWebhookCommand {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        ProcessWebhookCommand {
            payload: payload.as_bytes().to_vec(),
            signature: format!("t={},v1={}", timestamp, signature),
        }
    }

    const TEST_MODE_PAYLOAD: &str = r#"{"id":"evt_testmode","type":"invoice.payment_succeeded","created":1704067200,"data":{"object":{}},"livemode":false}"#;

    #[tokio::test]
    async fn test_mode_event_is_ignored_when_livemode_required() {
        let (handler, events) = handler(true);

        let result = handler.handle(signed_command(TEST_MODE_PAYLOAD)).await;

        assert!(matches!(result, Ok(WebhookResult::Ignored(_))));
        // Rejected before dispatch: nothing reaches the dedup store.
        assert!(events
            .find_by_event_id("evt_testmode")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_mode_event_is_processed_when_livemode_not_required() {
        let (handler, events) = handler(false);

        let result = handler.handle(signed_command(TEST_MODE_PAYLOAD)).await;

        assert!(matches!(result, Ok(_)));
        assert!(events
            .find_by_event_id("evt_testmode")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_before_livemode_guard() {
        let (handler, events) = handler(true);

        let cmd = ProcessWebhookCommand {
            payload: TEST_MODE_PAYLOAD.as_bytes().to_vec(),
            signature: format!("t={},v1={}", chrono::Utc::now().timestamp(), "a".repeat(64)),
        };
        let result = handler.handle(cmd).await;

        assert!(matches!(result, Err(ReconciliationError::SignatureInvalid)));
        assert!(events
            .find_by_event_id("evt_testmode")
            .await
            .unwrap()
            .is_none());
    }
}
