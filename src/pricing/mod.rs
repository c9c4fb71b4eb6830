//! Azure Retail Prices module
//!
//! Contains types, the pricing client, and the presentation and truncation
//! logic the tools render their results with.

pub mod client;
pub mod filter;
pub mod format;
pub mod report;
pub mod truncate;
pub mod types;
