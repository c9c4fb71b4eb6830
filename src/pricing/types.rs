//! Azure Retail Prices type definitions
//!
//! These types mirror the Retail Prices API responses and the fixed
//! vocabularies the tools accept.

use serde::{Deserialize, Serialize};

/// A single retail price record
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceItem {
    /// Currency the prices are expressed in
    pub currency_code: String,

    /// Minimum units for tiered pricing
    pub tier_minimum_units: f64,

    /// Retail price per unit
    pub retail_price: f64,

    /// Unit price (before any discounts)
    pub unit_price: f64,

    /// Region code (e.g. `eastus`)
    pub arm_region_name: String,

    /// Human readable region (e.g. `US East`)
    pub location: String,

    /// Date from which the price is effective
    pub effective_start_date: String,

    /// Meter identifier
    pub meter_id: String,

    /// Meter name
    pub meter_name: String,

    /// Product identifier
    pub product_id: String,

    /// SKU identifier
    pub sku_id: String,

    /// Product name
    pub product_name: String,

    /// SKU name
    pub sku_name: String,

    /// Service name (e.g. `Virtual Machines`)
    pub service_name: String,

    /// Service identifier
    pub service_id: String,

    /// Service family (e.g. `Compute`)
    pub service_family: String,

    /// Unit of measure (e.g. `1 Hour`)
    pub unit_of_measure: String,

    /// Price type (`Consumption`, `Reservation`, ...)
    #[serde(rename = "type")]
    pub price_type: String,

    /// Whether this is the primary meter region
    pub is_primary_meter_region: bool,

    /// ARM SKU name
    pub arm_sku_name: String,

    /// Reservation term for reservation prices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_term: Option<String>,

    /// Savings plan prices, when the meter supports them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub savings_plan: Vec<SavingsPlanPrice>,
}

impl PriceItem {
    /// Whether any savings plan term is available for this meter
    pub fn has_savings_plan(&self) -> bool {
        !self.savings_plan.is_empty()
    }
}

/// Savings plan price for one commitment term
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SavingsPlanPrice {
    /// Unit price under the plan
    pub unit_price: f64,

    /// Retail price under the plan
    pub retail_price: f64,

    /// Commitment term (e.g. `1 Year`)
    pub term: String,
}

/// Raw response page from the Retail Prices API
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriceResponse {
    /// Billing currency reported by the API
    #[serde(rename = "BillingCurrency", default)]
    pub billing_currency: Option<String>,

    /// Records in this page
    #[serde(rename = "Items", default)]
    pub items: Vec<PriceItem>,

    /// Link to the next page, if any
    #[serde(rename = "NextPageLink", default)]
    pub next_page_link: Option<String>,

    /// Record count reported by the API
    #[serde(rename = "Count", default)]
    pub count: usize,
}

/// A query against the pricing data source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceQuery {
    /// OData filter expression
    pub filter: Option<String>,

    /// Maximum number of records (`$top`)
    pub top: Option<u32>,

    /// Currency to price in
    pub currency: Currency,
}

/// Records returned by the pricing data source plus the declared total
#[derive(Debug, Clone, Default)]
pub struct PriceResultSet {
    pub items: Vec<PriceItem>,
    pub count: usize,
}

impl From<PriceResponse> for PriceResultSet {
    fn from(response: PriceResponse) -> Self {
        let count = response.count.max(response.items.len());
        Self {
            items: response.items,
            count,
        }
    }
}

/// Declares a closed string vocabulary with its wire names.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Wire names accepted by the tool schemas
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            /// Wire name of this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Supported currency codes
    Currency, default = Usd {
        Usd => "USD",
        Eur => "EUR",
        Gbp => "GBP",
        Jpy => "JPY",
        Cad => "CAD",
        Aud => "AUD",
        Inr => "INR",
        Cny => "CNY",
        Brl => "BRL",
    }
}

vocabulary! {
    /// Azure pricing types
    PriceType, default = Consumption {
        Consumption => "Consumption",
        Reservation => "Reservation",
        DevTestConsumption => "DevTestConsumption",
    }
}

vocabulary! {
    /// Common Azure service families
    ServiceFamily, default = Compute {
        Compute => "Compute",
        Networking => "Networking",
        Storage => "Storage",
        Databases => "Databases",
        Analytics => "Analytics",
        AiMachineLearning => "AI + Machine Learning",
        Containers => "Containers",
        Security => "Security",
        Management => "Management and Governance",
        DeveloperTools => "Developer Tools",
    }
}

vocabulary! {
    /// Output format for tool responses
    ResponseFormat, default = Markdown {
        Markdown => "markdown",
        Json => "json",
    }
}

impl Currency {
    /// Display symbol for amounts in this currency
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy | Currency::Cny => "¥",
            Currency::Cad => "C$",
            Currency::Aud => "A$",
            Currency::Inr => "₹",
            Currency::Brl => "R$",
        }
    }

    /// Look up a currency by its ISO code
    pub fn from_code(code: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(code.to_string())).ok()
    }
}
