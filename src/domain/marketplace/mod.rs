//! Marketplace entities touched by billing reconciliation.
//!
//! Only the billing-relevant slices of the user and listing records live
//! here. Registration, profile editing, and listing management are separate
//! surfaces that merely read the state these types carry.

mod listing;
mod user;

pub use listing::Listing;
pub use user::User;
