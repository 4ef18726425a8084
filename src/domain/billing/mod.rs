//! Billing domain: webhook intake, verification, and reconciliation.

pub mod payloads;
pub mod payment;
pub mod reconciliation;
pub mod status;
pub mod stripe_event;
pub mod subscription;
pub mod webhook_errors;
pub mod webhook_processor;
pub mod webhook_verifier;

pub use payment::{PaymentRecord, PaymentType};
pub use reconciliation::{
    CheckoutCompletedHandler, InvoiceHandler, SubscriptionLifecycleHandler, SubscriptionResolver,
};
pub use status::SubscriptionStatus;
pub use stripe_event::{StripeEvent, StripeEventType};
pub use subscription::SubscriptionRecord;
pub use webhook_errors::ReconciliationError;
pub use webhook_processor::{
    HandlerRegistry, IdempotentWebhookProcessor, Outcome, WebhookEventHandler, WebhookResult,
};
pub use webhook_verifier::StripeWebhookVerifier;
