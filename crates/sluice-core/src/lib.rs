//! # sluice-core
//! Foundation types and traits for the Sluice disbursement engine.

pub mod constants;
pub mod error;
pub mod events;
pub mod ledger;
pub mod types;
