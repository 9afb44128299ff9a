//! Outbound adapters: infrastructure implementations of the domain ports.

pub mod feed;
pub mod notify;
pub mod persistence;
