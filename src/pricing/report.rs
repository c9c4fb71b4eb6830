//! Aggregated pricing reports
//!
//! Region comparisons, savings plan analyses and service family overviews
//! are built from a page of price records, then rendered row by row so the
//! rows can go through truncation like any other result set.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::pricing::format::{format_currency, format_currency_code, or_na, JsonPage};
use crate::pricing::truncate::ResultView;
use crate::pricing::types::{Currency, PriceItem, ResponseFormat};

// ==================== Region comparison ====================

/// Price of one SKU in one region
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionPrice {
    pub region: String,
    pub location: String,
    pub price: f64,
    pub unit: String,
    pub product: String,
}

/// One SKU compared across regions, cheapest first
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkuComparison {
    pub sku: String,
    pub prices: Vec<RegionPrice>,
}

impl SkuComparison {
    /// Cheapest entry
    pub fn cheapest(&self) -> Option<&RegionPrice> {
        self.prices.first()
    }

    /// Most expensive entry
    pub fn most_expensive(&self) -> Option<&RegionPrice> {
        self.prices.last()
    }
}

/// Header information for a region comparison
#[derive(Debug, Clone)]
pub struct ComparisonContext {
    pub service_name: String,
    pub sku_name: Option<String>,
    pub price_type: Option<String>,
    pub currency: Currency,
    pub regions_without_data: Vec<String>,
}

/// Group records by SKU and keep, per region, the lowest price
///
/// SKUs keep first-appearance order; prices within a SKU are sorted ascending.
pub fn compare_regions(items: &[PriceItem], regions: &[String]) -> (Vec<SkuComparison>, Vec<String>) {
    let mut skus: Vec<SkuComparison> = Vec::new();
    let mut seen_regions: BTreeSet<&str> = BTreeSet::new();

    for item in items {
        let region = item.arm_region_name.to_lowercase();
        let Some(requested) = regions.iter().find(|r| **r == region) else {
            continue;
        };
        seen_regions.insert(requested.as_str());

        let sku_name = if item.sku_name.is_empty() {
            "Unknown SKU"
        } else {
            item.sku_name.as_str()
        };

        let entry = RegionPrice {
            region: region.clone(),
            location: if item.location.is_empty() {
                region.clone()
            } else {
                item.location.clone()
            },
            price: item.retail_price,
            unit: if item.unit_of_measure.is_empty() {
                "unit".to_string()
            } else {
                item.unit_of_measure.clone()
            },
            product: if item.product_name.is_empty() {
                "Unknown Product".to_string()
            } else {
                item.product_name.clone()
            },
        };

        let index = match skus.iter().position(|s| s.sku == sku_name) {
            Some(index) => index,
            None => {
                skus.push(SkuComparison {
                    sku: sku_name.to_string(),
                    prices: Vec::new(),
                });
                skus.len() - 1
            }
        };
        let comparison = &mut skus[index];

        match comparison.prices.iter_mut().find(|p| p.region == entry.region) {
            Some(existing) if entry.price < existing.price => *existing = entry,
            Some(_) => {}
            None => comparison.prices.push(entry),
        }
    }

    for comparison in &mut skus {
        comparison
            .prices
            .sort_by(|a, b| a.price.total_cmp(&b.price).then_with(|| a.region.cmp(&b.region)));
    }

    let missing = regions
        .iter()
        .filter(|r| !seen_regions.contains(r.as_str()))
        .cloned()
        .collect();

    (skus, missing)
}

/// Render a region comparison
pub fn render_comparison(
    view: &ResultView<'_, SkuComparison>,
    context: &ComparisonContext,
    format: ResponseFormat,
) -> String {
    let title = format!("Azure Price Comparison: {}", context.service_name);
    if format == ResponseFormat::Json {
        return JsonPage::from_view(&title, view).render();
    }

    let currency = context.currency;
    let mut text = format!("# {}\n\n", title);
    text.push_str(&format!("**Currency**: {}\n", currency));
    text.push_str(&format!(
        "**Price Type**: {}\n",
        context.price_type.as_deref().unwrap_or("All")
    ));
    if let Some(sku) = &context.sku_name {
        text.push_str(&format!("**SKU**: {}\n", sku));
    }
    text.push('\n');

    if let Some(notice) = view.truncation {
        text.push_str(&format!("**Warning: {}**\n\n", notice.message()));
    }

    if view.items.is_empty() {
        text.push_str("No pricing data found for the specified criteria.\n");
        return text;
    }

    for comparison in view.items {
        text.push_str(&format!("## {}\n\n", comparison.sku));

        let (Some(cheapest), Some(most_expensive)) =
            (comparison.cheapest(), comparison.most_expensive())
        else {
            continue;
        };

        text.push_str("| Region | Location | Price | Difference from Cheapest |\n");
        text.push_str("|--------|----------|-------|--------------------------|\n");

        for entry in &comparison.prices {
            let diff = if entry.price == cheapest.price {
                "**CHEAPEST**".to_string()
            } else {
                let amount = entry.price - cheapest.price;
                let percent = percent_of(amount, cheapest.price);
                format!("+{} (+{:.1}%)", format_currency(amount, currency), percent)
            };
            text.push_str(&format!(
                "| {} | {} | {}/{} | {} |\n",
                entry.region,
                entry.location,
                format_currency(entry.price, currency),
                entry.unit,
                diff
            ));
        }

        if comparison.prices.len() > 1 {
            let savings = most_expensive.price - cheapest.price;
            text.push_str(&format!(
                "\n**Maximum Savings**: {} ({:.1}%) by choosing {} over {}\n",
                format_currency(savings, currency),
                percent_of(savings, most_expensive.price),
                cheapest.region,
                most_expensive.region
            ));
        }
        text.push('\n');
    }

    if !context.regions_without_data.is_empty() {
        text.push_str(&format!(
            "**Regions without pricing data**: {}\n",
            context.regions_without_data.join(", ")
        ));
    }

    text
}

// ==================== Savings plans ====================

/// One savings plan term compared to pay-as-you-go
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TermSavings {
    pub term: String,
    pub price: f64,
    pub savings: f64,
    pub savings_percent: f64,
}

/// A meter with its savings plan options
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SavingsRow {
    pub sku: String,
    pub region: String,
    pub product: String,
    pub unit: String,
    pub pay_as_you_go: f64,
    pub terms: Vec<TermSavings>,
}

/// Totals across every eligible meter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SavingsSummary {
    pub total_regular_cost: f64,
    pub one_year_savings: f64,
    pub three_year_savings: f64,
}

impl SavingsSummary {
    /// Whether three-year commitments save markedly more than one-year ones
    pub fn favours_three_year(&self) -> bool {
        self.three_year_savings > self.one_year_savings * 1.5
    }
}

/// Header information for a savings analysis
#[derive(Debug, Clone)]
pub struct SavingsContext {
    pub service_name: String,
    pub sku_name: Option<String>,
    pub region: Option<String>,
    pub currency: Currency,
    pub summary: SavingsSummary,
}

/// Build savings rows for every record that offers a savings plan
pub fn savings_rows(items: &[PriceItem]) -> (Vec<SavingsRow>, SavingsSummary) {
    let mut summary = SavingsSummary::default();
    let mut rows = Vec::new();

    for item in items.iter().filter(|i| i.has_savings_plan()) {
        let regular = item.retail_price;
        let mut terms = Vec::with_capacity(item.savings_plan.len());

        for plan in &item.savings_plan {
            let savings = regular - plan.retail_price;
            let savings_percent = if regular > 0.0 {
                savings / regular * 100.0
            } else {
                0.0
            };

            summary.total_regular_cost += regular;
            if plan.term.contains("1 Year") {
                summary.one_year_savings += savings;
            } else if plan.term.contains("3 Year") {
                summary.three_year_savings += savings;
            }

            terms.push(TermSavings {
                term: if plan.term.is_empty() {
                    "Unknown".to_string()
                } else {
                    plan.term.clone()
                },
                price: plan.retail_price,
                savings,
                savings_percent,
            });
        }

        rows.push(SavingsRow {
            sku: or_na(&item.sku_name).to_string(),
            region: if item.location.is_empty() {
                "Unknown Region".to_string()
            } else {
                item.location.clone()
            },
            product: or_na(&item.product_name).to_string(),
            unit: if item.unit_of_measure.is_empty() {
                "unit".to_string()
            } else {
                item.unit_of_measure.clone()
            },
            pay_as_you_go: regular,
            terms,
        });
    }

    (rows, summary)
}

#[derive(Serialize)]
struct SavingsJson<'a> {
    #[serde(flatten)]
    page: JsonPage<'a, SavingsRow>,
    summary: SavingsSummary,
}

/// Render a savings plan analysis
pub fn render_savings(
    view: &ResultView<'_, SavingsRow>,
    context: &SavingsContext,
    format: ResponseFormat,
) -> String {
    let title = format!("Azure Savings Plan Analysis: {}", context.service_name);

    if view.items.is_empty() {
        return match format {
            ResponseFormat::Json => serde_json::json!({
                "error": "No savings plan eligible items found for the specified criteria"
            })
            .to_string(),
            ResponseFormat::Markdown => "**No savings plan eligible items found** for the specified criteria.\n\nTry searching for different services or regions, or remove specific SKU filters.".to_string(),
        };
    }

    if format == ResponseFormat::Json {
        let body = SavingsJson {
            page: JsonPage::from_view(&title, view),
            summary: context.summary,
        };
        return serde_json::to_string_pretty(&body).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize savings analysis");
            format!("{{\"error\": \"failed to serialize response: {}\"}}", e)
        });
    }

    let currency = context.currency;
    let mut text = format!("# {}\n\n", title);
    text.push_str(&format!("**Currency**: {}\n", currency));
    if let Some(sku) = &context.sku_name {
        text.push_str(&format!("**SKU**: {}\n", sku));
    }
    if let Some(region) = &context.region {
        text.push_str(&format!("**Region**: {}\n", region));
    }
    text.push_str(&format!(
        "**Items with Savings Plans**: {}\n\n",
        view.declared_total
    ));

    if let Some(notice) = view.truncation {
        text.push_str(&format!("**Warning: {}**\n\n", notice.message()));
    }

    for row in view.items {
        text.push_str(&format!("## {}\n", row.sku));
        text.push_str(&format!("**Region**: {}\n", row.region));
        text.push_str(&format!("**Product**: {}\n\n", row.product));
        text.push_str(&format!(
            "**Pay-as-you-go**: {}/{}\n\n",
            format_currency(row.pay_as_you_go, currency),
            row.unit
        ));

        if !row.terms.is_empty() {
            text.push_str("**Savings Plan Options**:\n\n");
            text.push_str("| Term | Price | Savings | Savings % |\n");
            text.push_str("|------|-------|---------|-----------|\n");
            for term in &row.terms {
                text.push_str(&format!(
                    "| {} | {}/{} | {} | {:.1}% |\n",
                    term.term,
                    format_currency(term.price, currency),
                    row.unit,
                    format_currency(term.savings, currency),
                    term.savings_percent
                ));
            }
            text.push('\n');
        }
    }

    let summary = context.summary;
    if summary.total_regular_cost > 0.0 {
        text.push_str("## Savings Summary\n\n");
        if summary.one_year_savings > 0.0 {
            text.push_str(&format!(
                "**1-Year Plans**: Save {} ({:.1}%) compared to pay-as-you-go\n",
                format_currency(summary.one_year_savings, currency),
                percent_of(summary.one_year_savings, summary.total_regular_cost)
            ));
        }
        if summary.three_year_savings > 0.0 {
            text.push_str(&format!(
                "**3-Year Plans**: Save {} ({:.1}%) compared to pay-as-you-go\n",
                format_currency(summary.three_year_savings, currency),
                percent_of(summary.three_year_savings, summary.total_regular_cost)
            ));
        }
        text.push_str("\n**Recommendation**: ");
        if summary.favours_three_year() {
            text.push_str("Consider 3-year plans for maximum savings if you can commit long-term.\n");
        } else {
            text.push_str("1-year plans offer good savings with more flexibility.\n");
        }
    }

    text
}

// ==================== Service families ====================

/// Example SKU shown for a family
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExampleSku {
    pub sku: String,
    pub service: String,
    pub price: f64,
    pub currency: String,
    pub unit: String,
}

/// Lowest and highest non-zero price seen in a family
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Overview of one service family
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FamilySummary {
    pub family: String,
    pub services: Vec<String>,
    pub example_skus: Vec<ExampleSku>,
    pub price_range: Option<PriceRange>,
}

/// Maximum example SKUs kept per family
const EXAMPLES_PER_FAMILY: usize = 3;

/// Group a sample of records by service family, sorted by family name
pub fn summarize_families(items: &[PriceItem]) -> Vec<FamilySummary> {
    struct Acc {
        services: BTreeSet<String>,
        examples: Vec<ExampleSku>,
        range: Option<PriceRange>,
    }

    let mut families: BTreeMap<String, Acc> = BTreeMap::new();

    for item in items {
        let family = if item.service_family.is_empty() {
            "Other"
        } else {
            item.service_family.as_str()
        };
        let service = if item.service_name.is_empty() {
            "Unknown Service"
        } else {
            item.service_name.as_str()
        };

        let acc = families.entry(family.to_string()).or_insert_with(|| Acc {
            services: BTreeSet::new(),
            examples: Vec::new(),
            range: None,
        });
        acc.services.insert(service.to_string());

        let price = item.retail_price;
        if price > 0.0 {
            acc.range = Some(match acc.range {
                Some(range) => PriceRange {
                    min: range.min.min(price),
                    max: range.max.max(price),
                },
                None => PriceRange {
                    min: price,
                    max: price,
                },
            });

            if acc.examples.len() < EXAMPLES_PER_FAMILY {
                acc.examples.push(ExampleSku {
                    sku: if item.sku_name.is_empty() {
                        "Unknown".to_string()
                    } else {
                        item.sku_name.clone()
                    },
                    service: service.to_string(),
                    price,
                    currency: if item.currency_code.is_empty() {
                        "USD".to_string()
                    } else {
                        item.currency_code.clone()
                    },
                    unit: if item.unit_of_measure.is_empty() {
                        "unit".to_string()
                    } else {
                        item.unit_of_measure.clone()
                    },
                });
            }
        }
    }

    families
        .into_iter()
        .map(|(family, acc)| FamilySummary {
            family,
            services: acc.services.into_iter().collect(),
            example_skus: acc.examples,
            price_range: acc.range,
        })
        .collect()
}

/// Render a service family overview
pub fn render_families(view: &ResultView<'_, FamilySummary>, format: ResponseFormat) -> String {
    let title = "Azure Service Families";
    if format == ResponseFormat::Json {
        return JsonPage::from_view(title, view).render();
    }

    let mut text = format!("# {}\n\n", title);
    text.push_str(&format!(
        "**Total Families Found**: {}\n\n",
        view.declared_total
    ));

    if let Some(notice) = view.truncation {
        text.push_str(&format!("**Warning: {}**\n\n", notice.message()));
    }

    for family in view.items {
        text.push_str(&format!("## {}\n", family.family));
        text.push_str(&format!("**Services** ({}):\n", family.services.len()));
        for service in &family.services {
            text.push_str(&format!("- {}\n", service));
        }
        text.push('\n');

        if !family.example_skus.is_empty() {
            text.push_str("**Example SKUs**:\n");
            for example in &family.example_skus {
                text.push_str(&format!(
                    "- **{}** ({}): {}/{}\n",
                    example.sku,
                    example.service,
                    format_currency_code(example.price, &example.currency),
                    example.unit
                ));
            }
            text.push('\n');
        }

        if let Some(range) = family.price_range {
            text.push_str(&format!(
                "**Price Range**: {} - {}\n\n",
                format_currency(range.min, Currency::Usd),
                format_currency(range.max, Currency::Usd)
            ));
        }
    }

    text
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}
