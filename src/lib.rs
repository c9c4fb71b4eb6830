//! Azure Pricing MCP Server Library
//!
//! A Model Context Protocol (MCP) server for the Azure Retail Prices API.
//! Provides tools for looking up prices, comparing regions, searching SKUs,
//! listing service families and estimating savings plan benefits.

pub mod config;
pub mod error;
pub mod mcp;
pub mod pricing;

pub use config::Config;
pub use error::{PricingMcpError, Result};
