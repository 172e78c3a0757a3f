//! Test support for the Sluice engine integration suites.

pub mod helpers;
