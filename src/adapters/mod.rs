//! Adapters: concrete implementations of the port traits.

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
