//! Ports: async trait boundaries between the domain and its adapters.

pub mod billing_provider;
pub mod listing_repository;
pub mod payment_ledger;
pub mod subscription_repository;
pub mod user_repository;
pub mod webhook_event_repository;

pub use billing_provider::{BillingCustomer, BillingProvider, ProviderError, ProviderSubscription};
pub use listing_repository::ListingRepository;
pub use payment_ledger::PaymentLedger;
pub use subscription_repository::SubscriptionRepository;
pub use user_repository::UserRepository;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository,
};
