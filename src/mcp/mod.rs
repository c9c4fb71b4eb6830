//! MCP (Model Context Protocol) module
//!
//! Protocol types, tool schemas and registry, the pricing tools, transports,
//! the per-channel session and the connection manager.

pub mod registry;
pub mod schema;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;
