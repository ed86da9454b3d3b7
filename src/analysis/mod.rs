//! Analysis modules.
//!
//! Aggregation of provider outcomes into bundles and status reports.

pub mod aggregator;

pub use aggregator::*;
