//! DEEDS: tamper-evident land-property registry and lifecycle ledger
//!
//! This crate re-exports all the components of the DEEDS system.

pub use deeds_core::*;
pub use deeds_history::*;
pub use deeds_ledger::*;
pub use deeds_store::*;
