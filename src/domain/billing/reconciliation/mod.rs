//! State-transition handlers for billing webhook events.
//!
//! Each handler is a recipe against the entity store: resolve the affected
//! user and subscription record, apply the transition, persist. Resolution
//! is shared through [`SubscriptionResolver`] so the self-healing fallback
//! behaves identically no matter which event arrives first.

mod checkout;
mod invoice;
mod resolver;
mod subscription_lifecycle;

pub use checkout::CheckoutCompletedHandler;
pub use invoice::InvoiceHandler;
pub use resolver::{Resolution, SubscriptionResolver, SYNTHETIC_PERIOD_DAYS};
pub use subscription_lifecycle::SubscriptionLifecycleHandler;

/// Fixed featured-placement window for one-off feature purchases.
pub const FEATURE_WINDOW_DAYS: i64 = 30;
