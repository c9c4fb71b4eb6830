//! Azure Retail Prices API client
//!
//! The [`PricingSource`] trait is the seam the tools query through; the
//! [`AzurePricingClient`] implements it over HTTP.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{pricing::MAX_LIMIT, Config};
use crate::error::{PricingApiError, Result};
use crate::pricing::types::{Currency, PriceQuery, PriceResponse, PriceResultSet};

/// A source of retail price records
#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Run one query and return the resulting page of records
    async fn fetch(&self, query: &PriceQuery) -> Result<PriceResultSet>;
}

/// HTTP client for the Azure Retail Prices API
pub struct AzurePricingClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// API endpoint
    base_url: String,

    /// `api-version` query value
    api_version: String,

    /// Request timeout, kept for error reporting
    timeout_secs: u64,
}

impl AzurePricingClient {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(5)
            .user_agent(concat!("azure-pricing-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.api_base_url.clone(),
            api_version: config.api_version.clone(),
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    /// Query parameters for a request
    fn query_params(&self, query: &PriceQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("api-version", self.api_version.clone())];

        if query.currency != Currency::Usd {
            params.push(("currencyCode", format!("'{}'", query.currency.as_str())));
        }

        if let Some(filter) = &query.filter {
            params.push(("$filter", filter.clone()));
        }

        if let Some(top) = query.top {
            params.push(("$top", top.min(MAX_LIMIT).to_string()));
        }

        params
    }
}

#[async_trait]
impl PricingSource for AzurePricingClient {
    async fn fetch(&self, query: &PriceQuery) -> Result<PriceResultSet> {
        tracing::debug!(filter = ?query.filter, top = ?query.top, "querying retail prices");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PricingApiError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    PricingApiError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, "Azure API request failed");
            return Err(PricingApiError::RequestFailed { status, body }.into());
        }

        let body: Value = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "invalid JSON from Azure API");
            PricingApiError::InvalidResponse {
                message: e.to_string(),
            }
        })?;

        Ok(parse_price_response(body)?.into())
    }
}

/// Decode a response page, treating `null` record fields as absent
pub fn parse_price_response(mut body: Value) -> std::result::Result<PriceResponse, PricingApiError> {
    if let Some(items) = body.get_mut("Items").and_then(Value::as_array_mut) {
        for item in items.iter_mut() {
            if let Some(fields) = item.as_object_mut() {
                fields.retain(|_, v| !v.is_null());
            }
        }
    }

    serde_json::from_value(body).map_err(|e| PricingApiError::InvalidResponse {
        message: e.to_string(),
    })
}
