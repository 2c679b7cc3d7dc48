//! KRXSCAN — daily KRX pattern scanner
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod provider;
pub mod analysis;
pub mod predicates;
pub mod engine;
pub mod report;
pub mod notify;
