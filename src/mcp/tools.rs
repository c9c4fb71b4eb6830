//! MCP Tool definitions and handlers
//!
//! The five Azure pricing tools. Each one issues a single query against the
//! [`PricingSource`], shapes the records into rows and renders them within
//! the configured character budget.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{pricing, Config};
use crate::error::Result;
use crate::mcp::registry::{ToolHandler, ToolRegistry};
use crate::mcp::schema::{FieldSpec, ToolSchema, ValidInput};
use crate::pricing::client::PricingSource;
use crate::pricing::filter::ODataFilter;
use crate::pricing::format::render_price_list;
use crate::pricing::report::{
    compare_regions, render_comparison, render_families, render_savings, savings_rows,
    summarize_families, ComparisonContext, SavingsContext,
};
use crate::pricing::truncate::{render_within, RenderableResult};
use crate::pricing::types::{
    Currency, PriceQuery, PriceType, ResponseFormat, ServiceFamily,
};

/// Records requested per region when comparing prices
const RECORDS_PER_REGION: u32 = 100;

/// Records requested for a savings plan analysis
const SAVINGS_SAMPLE: u32 = 200;

/// Records sampled per requested family
const FAMILY_SAMPLE_FACTOR: u32 = 10;

/// Build the registry holding every pricing tool
pub fn pricing_registry(source: Arc<dyn PricingSource>, config: &Config) -> Result<ToolRegistry> {
    let shared = Shared {
        source,
        character_limit: config.character_limit,
    };

    Ok(ToolRegistry::builder()
        .register(ServicePrices::new(shared.clone()))?
        .register(CompareRegionPrices::new(shared.clone()))?
        .register(SearchSkuPrices::new(shared.clone()))?
        .register(ServiceFamilies::new(shared.clone()))?
        .register(SavingsPlanCalculator::new(shared))?
        .build())
}

/// State every tool needs
#[derive(Clone)]
struct Shared {
    source: Arc<dyn PricingSource>,
    character_limit: usize,
}

// ==================== Common fields ====================

fn service_name_field(description: &'static str) -> FieldSpec {
    FieldSpec::text("service_name", description, 100)
}

fn service_family_field(description: &'static str) -> FieldSpec {
    FieldSpec::choice("service_family", description, ServiceFamily::VALUES, None)
}

fn region_field(description: &'static str) -> FieldSpec {
    FieldSpec::identifier("region", description, 50)
}

fn sku_name_field(description: &'static str) -> FieldSpec {
    FieldSpec::text("sku_name", description, 100)
}

fn currency_field() -> FieldSpec {
    FieldSpec::choice(
        "currency",
        "Currency code for pricing (default: USD)",
        Currency::VALUES,
        Some(Currency::Usd.as_str()),
    )
}

fn limit_field(description: &'static str, max: u32) -> FieldSpec {
    FieldSpec::integer(
        "limit",
        description,
        1,
        i64::from(max),
        i64::from(pricing::DEFAULT_LIMIT),
    )
}

fn response_format_field() -> FieldSpec {
    FieldSpec::choice(
        "response_format",
        "Output format: 'markdown' for human-readable or 'json' for machine-readable",
        ResponseFormat::VALUES,
        Some(ResponseFormat::Markdown.as_str()),
    )
}

fn default_limit() -> u32 {
    pricing::DEFAULT_LIMIT
}

// ==================== azure_get_service_prices ====================

/// Price lookup with optional filters
pub struct ServicePrices {
    shared: Shared,
    schema: ToolSchema,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServicePricesArgs {
    service_name: Option<String>,
    service_family: Option<ServiceFamily>,
    region: Option<String>,
    sku_name: Option<String>,
    price_type: Option<PriceType>,
    #[serde(default)]
    currency: Currency,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    response_format: ResponseFormat,
}

impl ServicePrices {
    fn new(shared: Shared) -> Self {
        let schema = ToolSchema::new(vec![
            service_name_field(
                "Azure service name to filter by (e.g., 'Virtual Machines', 'Storage', 'Azure SQL Database')",
            ),
            service_family_field("Service family to filter by (e.g., 'Compute', 'Storage', 'Networking')"),
            region_field("Azure region name to filter by (e.g., 'eastus', 'westeurope', 'uksouth')"),
            sku_name_field("SKU name to filter by (e.g., 'Standard_D2s_v3', 'E4ds v5')"),
            FieldSpec::choice(
                "price_type",
                "Price type to filter by ('Consumption', 'Reservation', 'DevTestConsumption')",
                PriceType::VALUES,
                None,
            ),
            currency_field(),
            limit_field("Maximum number of results to return (1-1000)", pricing::MAX_LIMIT),
            response_format_field(),
        ]);
        Self { shared, schema }
    }
}

#[async_trait]
impl ToolHandler for ServicePrices {
    fn name(&self) -> &'static str {
        "azure_get_service_prices"
    }

    fn title(&self) -> &'static str {
        "Get Azure Service Prices"
    }

    fn description(&self) -> &'static str {
        "Get Azure retail prices for services with filtering by service name, service family, region, SKU and price type"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, input: ValidInput) -> Result<String> {
        let args: ServicePricesArgs = input.parse()?;

        let filter = ODataFilter::new()
            .eq_opt("serviceName", args.service_name.as_deref())
            .eq_opt("serviceFamily", args.service_family.map(|f| f.as_str()))
            .eq_opt("armRegionName", args.region.as_deref())
            .eq_opt("skuName", args.sku_name.as_deref())
            .eq_opt("priceType", args.price_type.map(|p| p.as_str()))
            .build();

        let page = self
            .shared
            .source
            .fetch(&PriceQuery {
                filter,
                top: Some(args.limit),
                currency: args.currency,
            })
            .await?;

        let title = format!("Azure Service Prices ({})", args.currency);
        let format = args.response_format;
        Ok(render_within(
            RenderableResult::new(page.items, page.count),
            |view| render_price_list(view, &title, format),
            self.shared.character_limit,
        ))
    }
}

// ==================== azure_compare_region_prices ====================

/// Side-by-side prices for one service across regions
pub struct CompareRegionPrices {
    shared: Shared,
    schema: ToolSchema,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompareRegionArgs {
    service_name: String,
    sku_name: Option<String>,
    regions: Vec<String>,
    price_type: Option<PriceType>,
    #[serde(default)]
    currency: Currency,
    #[serde(default)]
    response_format: ResponseFormat,
}

impl CompareRegionPrices {
    fn new(shared: Shared) -> Self {
        let schema = ToolSchema::new(vec![
            service_name_field("Azure service name to compare (e.g., 'Virtual Machines', 'Storage')")
                .required(),
            sku_name_field(
                "Specific SKU to compare (e.g., 'Standard_D2s_v3'). If not specified, compares all SKUs",
            ),
            FieldSpec::identifier_list(
                "regions",
                "List of Azure region names to compare (e.g., ['eastus', 'westeurope', 'uksouth'])",
                2,
                10,
                50,
            )
            .required(),
            FieldSpec::choice(
                "price_type",
                "Price type to compare ('Consumption', 'Reservation', 'DevTestConsumption')",
                PriceType::VALUES,
                Some(PriceType::Consumption.as_str()),
            ),
            currency_field(),
            response_format_field(),
        ]);
        Self { shared, schema }
    }
}

#[async_trait]
impl ToolHandler for CompareRegionPrices {
    fn name(&self) -> &'static str {
        "azure_compare_region_prices"
    }

    fn title(&self) -> &'static str {
        "Compare Azure Prices Across Regions"
    }

    fn description(&self) -> &'static str {
        "Compare Azure service prices across multiple regions to find the most cost-effective deployment location"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, input: ValidInput) -> Result<String> {
        let args: CompareRegionArgs = input.parse()?;
        let price_type = args.price_type.unwrap_or_default();

        let filter = ODataFilter::new()
            .eq("serviceName", &args.service_name)
            .any_of("armRegionName", args.regions.as_slice())
            .eq_opt("skuName", args.sku_name.as_deref())
            .eq("priceType", price_type.as_str())
            .build();

        let region_count = u32::try_from(args.regions.len()).unwrap_or(u32::MAX);
        let top = RECORDS_PER_REGION
            .saturating_mul(region_count)
            .min(pricing::MAX_LIMIT);

        let page = self
            .shared
            .source
            .fetch(&PriceQuery {
                filter,
                top: Some(top),
                currency: args.currency,
            })
            .await?;

        let (rows, regions_without_data) = compare_regions(&page.items, &args.regions);
        if !regions_without_data.is_empty() {
            tracing::debug!(regions = ?regions_without_data, "no prices returned for some regions");
        }

        let context = ComparisonContext {
            service_name: args.service_name,
            sku_name: args.sku_name,
            price_type: Some(price_type.as_str().to_string()),
            currency: args.currency,
            regions_without_data,
        };
        let format = args.response_format;
        Ok(render_within(
            RenderableResult::complete(rows),
            |view| render_comparison(view, &context, format),
            self.shared.character_limit,
        ))
    }
}

// ==================== azure_search_sku_prices ====================

/// Substring search over SKU names
pub struct SearchSkuPrices {
    shared: Shared,
    schema: ToolSchema,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchSkuArgs {
    search_term: String,
    service_family: Option<ServiceFamily>,
    region: Option<String>,
    #[serde(default = "default_true")]
    include_savings_plans: bool,
    #[serde(default)]
    currency: Currency,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    response_format: ResponseFormat,
}

fn default_true() -> bool {
    true
}

impl SearchSkuPrices {
    fn new(shared: Shared) -> Self {
        let schema = ToolSchema::new(vec![
            FieldSpec::text(
                "search_term",
                "Search term for SKU names (e.g., 'D2s', 'Standard_', 'v3')",
                100,
            )
            .required(),
            service_family_field("Filter by service family to narrow search"),
            region_field("Filter by specific region"),
            FieldSpec::flag(
                "include_savings_plans",
                "Include savings plan pricing information in results",
                true,
            ),
            currency_field(),
            limit_field("Maximum number of results to return (1-1000)", pricing::MAX_LIMIT),
            response_format_field(),
        ]);
        Self { shared, schema }
    }
}

#[async_trait]
impl ToolHandler for SearchSkuPrices {
    fn name(&self) -> &'static str {
        "azure_search_sku_prices"
    }

    fn title(&self) -> &'static str {
        "Search Azure SKU Prices"
    }

    fn description(&self) -> &'static str {
        "Search Azure SKUs whose name contains a term, optionally narrowed by service family and region"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, input: ValidInput) -> Result<String> {
        let args: SearchSkuArgs = input.parse()?;

        let filter = ODataFilter::new()
            .eq_opt("serviceFamily", args.service_family.map(|f| f.as_str()))
            .eq_opt("armRegionName", args.region.as_deref())
            .contains("skuName", &args.search_term)
            .build();

        let mut page = self
            .shared
            .source
            .fetch(&PriceQuery {
                filter,
                top: Some(args.limit),
                currency: args.currency,
            })
            .await?;

        if !args.include_savings_plans {
            for item in &mut page.items {
                item.savings_plan.clear();
            }
        }

        let title = format!("Azure SKU Search Results: '{}'", args.search_term);
        let format = args.response_format;
        Ok(render_within(
            RenderableResult::new(page.items, page.count),
            |view| render_price_list(view, &title, format),
            self.shared.character_limit,
        ))
    }
}

// ==================== azure_get_service_families ====================

/// Overview of service families found in a price sample
pub struct ServiceFamilies {
    shared: Shared,
    schema: ToolSchema,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceFamiliesArgs {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    response_format: ResponseFormat,
}

/// Largest number of families one call may ask for
const MAX_FAMILIES: u32 = 500;

impl ServiceFamilies {
    fn new(shared: Shared) -> Self {
        let schema = ToolSchema::new(vec![
            limit_field(
                "Maximum number of unique service families to return",
                MAX_FAMILIES,
            ),
            response_format_field(),
        ]);
        Self { shared, schema }
    }
}

#[async_trait]
impl ToolHandler for ServiceFamilies {
    fn name(&self) -> &'static str {
        "azure_get_service_families"
    }

    fn title(&self) -> &'static str {
        "List Azure Service Families"
    }

    fn description(&self) -> &'static str {
        "List Azure service families with their services, example SKUs and price ranges"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, input: ValidInput) -> Result<String> {
        let args: ServiceFamiliesArgs = input.parse()?;
        let top = args
            .limit
            .saturating_mul(FAMILY_SAMPLE_FACTOR)
            .min(pricing::MAX_LIMIT);

        let page = self
            .shared
            .source
            .fetch(&PriceQuery {
                filter: None,
                top: Some(top),
                currency: Currency::Usd,
            })
            .await?;

        let mut families = summarize_families(&page.items);
        let found = families.len();
        families.truncate(args.limit as usize);

        let format = args.response_format;
        Ok(render_within(
            RenderableResult::new(families, found),
            |view| render_families(view, format),
            self.shared.character_limit,
        ))
    }
}

// ==================== azure_calculate_savings_plan ====================

/// Savings plan analysis against pay-as-you-go prices
pub struct SavingsPlanCalculator {
    shared: Shared,
    schema: ToolSchema,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SavingsPlanArgs {
    service_name: String,
    sku_name: Option<String>,
    region: Option<String>,
    #[serde(default)]
    currency: Currency,
    #[serde(default)]
    response_format: ResponseFormat,
}

impl SavingsPlanCalculator {
    fn new(shared: Shared) -> Self {
        let schema = ToolSchema::new(vec![
            service_name_field("Azure service name to analyze (e.g., 'Virtual Machines')").required(),
            sku_name_field("Specific SKU to analyze (e.g., 'Standard_D2s_v3')"),
            region_field("Azure region to analyze"),
            currency_field(),
            response_format_field(),
        ]);
        Self { shared, schema }
    }
}

#[async_trait]
impl ToolHandler for SavingsPlanCalculator {
    fn name(&self) -> &'static str {
        "azure_calculate_savings_plan"
    }

    fn title(&self) -> &'static str {
        "Calculate Azure Savings Plans"
    }

    fn description(&self) -> &'static str {
        "Compare pay-as-you-go prices with 1-year and 3-year savings plan prices and recommend a commitment term"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, input: ValidInput) -> Result<String> {
        let args: SavingsPlanArgs = input.parse()?;

        let filter = ODataFilter::new()
            .eq("serviceName", &args.service_name)
            .eq_opt("skuName", args.sku_name.as_deref())
            .eq_opt("armRegionName", args.region.as_deref())
            .build();

        let page = self
            .shared
            .source
            .fetch(&PriceQuery {
                filter,
                top: Some(SAVINGS_SAMPLE),
                currency: args.currency,
            })
            .await?;

        let (rows, summary) = savings_rows(&page.items);
        let context = SavingsContext {
            service_name: args.service_name,
            sku_name: args.sku_name,
            region: args.region,
            currency: args.currency,
            summary,
        };
        let format = args.response_format;
        Ok(render_within(
            RenderableResult::complete(rows),
            |view| render_savings(view, &context, format),
            self.shared.character_limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PricingApiError, PricingMcpError};
    use crate::mcp::schema::validate;
    use crate::pricing::types::{PriceItem, PriceResultSet, SavingsPlanPrice};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records every query and answers with a fixed page
    struct Recorder {
        items: Vec<PriceItem>,
        queries: Mutex<Vec<PriceQuery>>,
    }

    impl Recorder {
        fn new(items: Vec<PriceItem>) -> Arc<Self> {
            Arc::new(Self {
                items,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<PriceQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PricingSource for Recorder {
        async fn fetch(&self, query: &PriceQuery) -> Result<PriceResultSet> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(PriceResultSet {
                items: self.items.clone(),
                count: self.items.len(),
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl PricingSource for Failing {
        async fn fetch(&self, _query: &PriceQuery) -> Result<PriceResultSet> {
            Err(PricingApiError::RequestFailed {
                status: 500,
                body: "boom".to_string(),
            }
            .into())
        }
    }

    fn vm(sku: &str, region: &str, price: f64) -> PriceItem {
        PriceItem {
            service_name: "Virtual Machines".to_string(),
            service_family: "Compute".to_string(),
            sku_name: sku.to_string(),
            arm_region_name: region.to_string(),
            location: region.to_string(),
            retail_price: price,
            currency_code: "USD".to_string(),
            unit_of_measure: "1 Hour".to_string(),
            price_type: "Consumption".to_string(),
            ..Default::default()
        }
    }

    fn registry_with(source: Arc<dyn PricingSource>, limit: usize) -> ToolRegistry {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.character_limit = limit;
        pricing_registry(source, &config).unwrap()
    }

    async fn call(registry: &ToolRegistry, name: &str, args: Value) -> Result<String> {
        let tool = registry.lookup(name).unwrap();
        let input = validate(tool.schema(), &args)?;
        tool.call(input).await
    }

    #[test]
    fn test_registry_contents() {
        let registry = registry_with(Recorder::new(vec![]), 25_000);
        assert_eq!(
            registry.names(),
            vec![
                "azure_get_service_prices",
                "azure_compare_region_prices",
                "azure_search_sku_prices",
                "azure_get_service_families",
                "azure_calculate_savings_plan",
            ]
        );
    }

    #[tokio::test]
    async fn test_service_prices_builds_filter() {
        let source = Recorder::new(vec![vm("D2s v3", "eastus", 0.096)]);
        let registry = registry_with(source.clone(), 25_000);

        let text = call(
            &registry,
            "azure_get_service_prices",
            json!({"service_name": "Virtual Machines", "region": "EastUS", "currency": "EUR", "limit": 5}),
        )
        .await
        .unwrap();

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(
            queries[0].filter.as_deref(),
            Some("serviceName eq 'Virtual Machines' and armRegionName eq 'eastus'")
        );
        assert_eq!(queries[0].top, Some(5));
        assert_eq!(queries[0].currency, Currency::Eur);
        assert!(text.starts_with("# Azure Service Prices (EUR)"));
    }

    #[tokio::test]
    async fn test_compare_regions_single_request() {
        let source = Recorder::new(vec![
            vm("D2s v3", "eastus", 0.10),
            vm("D2s v3", "westeurope", 0.12),
        ]);
        let registry = registry_with(source.clone(), 25_000);

        let text = call(
            &registry,
            "azure_compare_region_prices",
            json!({"service_name": "Virtual Machines", "regions": ["EastUS", "westeurope", "uksouth"]}),
        )
        .await
        .unwrap();

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].top, Some(300));
        assert_eq!(
            queries[0].filter.as_deref(),
            Some("serviceName eq 'Virtual Machines' and (armRegionName eq 'eastus' or armRegionName eq 'westeurope' or armRegionName eq 'uksouth') and priceType eq 'Consumption'")
        );
        assert!(text.contains("**CHEAPEST**"));
        assert!(text.contains("**Regions without pricing data**: uksouth"));
    }

    #[tokio::test]
    async fn test_search_without_savings_plans() {
        let mut item = vm("D2s v3", "eastus", 0.10);
        item.savings_plan = vec![SavingsPlanPrice {
            term: "1 Year".to_string(),
            retail_price: 0.07,
            unit_price: 0.07,
        }];
        let source = Recorder::new(vec![item]);
        let registry = registry_with(source.clone(), 25_000);

        let with = call(&registry, "azure_search_sku_prices", json!({"search_term": "D2s"}))
            .await
            .unwrap();
        assert!(with.contains("Savings Plans Available"));

        let without = call(
            &registry,
            "azure_search_sku_prices",
            json!({"search_term": "D2s", "include_savings_plans": false}),
        )
        .await
        .unwrap();
        assert!(!without.contains("Savings Plans Available"));
        assert!(without.contains("D2s v3"));

        assert_eq!(
            source.queries()[0].filter.as_deref(),
            Some("contains(skuName, 'D2s')")
        );
    }

    #[tokio::test]
    async fn test_service_families_sample_size() {
        let source = Recorder::new(vec![vm("D2s v3", "eastus", 0.10)]);
        let registry = registry_with(source.clone(), 25_000);

        call(&registry, "azure_get_service_families", json!({"limit": 150}))
            .await
            .unwrap();
        call(&registry, "azure_get_service_families", json!({}))
            .await
            .unwrap();

        let queries = source.queries();
        assert_eq!(queries[0].top, Some(1000));
        assert_eq!(queries[0].filter, None);
        assert_eq!(queries[1].top, Some(1000));
    }

    #[tokio::test]
    async fn test_savings_plan_without_eligible_items() {
        let source = Recorder::new(vec![vm("B1s", "eastus", 0.01)]);
        let registry = registry_with(source.clone(), 25_000);

        let text = call(
            &registry,
            "azure_calculate_savings_plan",
            json!({"service_name": "Virtual Machines"}),
        )
        .await
        .unwrap();

        assert!(text.contains("No savings plan eligible items found"));
        assert_eq!(source.queries()[0].top, Some(200));
    }

    #[tokio::test]
    async fn test_output_respects_character_limit() {
        let items: Vec<PriceItem> = (0..200)
            .map(|i| vm(&format!("Standard_D{}s_v5", i), "eastus", 0.05 * i as f64))
            .collect();
        let registry = registry_with(Recorder::new(items), 4_000);

        let text = call(&registry, "azure_get_service_prices", json!({}))
            .await
            .unwrap();

        assert!(text.chars().count() <= 4_000);
        assert!(text.contains("Response truncated from 200 to"));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let registry = registry_with(Arc::new(Failing), 25_000);
        let err = call(&registry, "azure_get_service_prices", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, PricingMcpError::Pricing(_)));
    }
}
