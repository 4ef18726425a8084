//! Domain layer: pure business logic, no I/O beyond port traits.

pub mod billing;
pub mod foundation;
pub mod marketplace;
