//! Messages exchanged between systems.
//!
//! Submodules:
//! - [`petcommand`] – commands parsed from network clients
pub mod petcommand;
