//! Stripe adapter: live reads against the Stripe REST API.

mod client;

pub use client::{StripeClient, StripeClientConfig};
