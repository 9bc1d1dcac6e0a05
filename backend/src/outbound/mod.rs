//! Outbound adapters: storage and catalog implementations of the domain's
//! driven ports.

pub mod catalog;
pub mod persistence;
