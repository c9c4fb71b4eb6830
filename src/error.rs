//! Error types for the Azure Pricing MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Azure Pricing MCP Server
#[derive(Error, Debug)]
pub enum PricingMcpError {
    /// Azure Retail Prices API errors
    #[error("Pricing API error: {0}")]
    Pricing(#[from] PricingApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Azure Retail Prices API errors
#[derive(Error, Debug)]
pub enum PricingApiError {
    #[error("Azure API returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Network error connecting to Azure API: {message}")]
    Network { message: String },

    #[error("Invalid response format from Azure API: {message}")]
    InvalidResponse { message: String },

    #[error("Azure API did not respond within {secs} seconds")]
    Timeout { secs: u64 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidEnvVar { var: String, value: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Validation errors
///
/// Every variant names the offending field so the protocol layer can
/// surface it to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    #[error("Invalid parameter: {name} - {message}")]
    InvalidParameter { name: String, message: String },
}

impl ValidationError {
    /// Name of the field the error refers to
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field } | ValidationError::UnknownField { field } => {
                field
            }
            ValidationError::InvalidParameter { name, .. } => name,
        }
    }
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Tool registered twice: {name}")]
    DuplicateTool { name: String },

    #[error("Tool execution timed out after {secs} seconds")]
    ToolTimeout { secs: u64 },

    #[error("Transport error: {message}")]
    TransportError { message: String },
}

/// Result type alias for Azure Pricing MCP operations
pub type Result<T> = std::result::Result<T, PricingMcpError>;

impl From<reqwest::Error> for PricingApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PricingApiError::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            PricingApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for PricingMcpError {
    fn from(err: reqwest::Error) -> Self {
        PricingMcpError::Pricing(PricingApiError::from(err))
    }
}
