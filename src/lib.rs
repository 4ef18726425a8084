//! Vital Market - Health and Wellness Marketplace Backend
//!
//! This crate implements the billing reconciliation core of the marketplace:
//! Stripe webhook intake, signature verification, idempotent dispatch, and
//! the per-event state transitions that keep user entitlement, subscription
//! mirrors, listing feature flags, and the payment ledger in sync.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
