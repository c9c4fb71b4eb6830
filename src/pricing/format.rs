//! Presentation helpers for pricing data
//!
//! Currency formatting and the markdown/JSON renderings of price lists.

use serde::Serialize;

use crate::pricing::truncate::ResultView;
use crate::pricing::types::{Currency, PriceItem, ResponseFormat};

/// Format an amount with the currency's symbol
///
/// Yen amounts have no minor unit and are shown without decimals; everything
/// else gets four decimals, since many meters are priced in fractions of a cent.
pub fn format_currency(amount: f64, currency: Currency) -> String {
    let decimals = if currency == Currency::Jpy { 0 } else { 4 };
    with_symbol(currency.symbol(), amount, decimals)
}

/// Format an amount given a raw currency code from an API record
pub fn format_currency_code(amount: f64, code: &str) -> String {
    match Currency::from_code(code) {
        Some(currency) => format_currency(amount, currency),
        None => with_symbol(code, amount, 4),
    }
}

fn with_symbol(symbol: &str, amount: f64, decimals: usize) -> String {
    let digits = group_thousands(amount.abs(), decimals);
    if amount < 0.0 && digits.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}{}", symbol, digits)
    } else {
        format!("{}{}", symbol, digits)
    }
}

/// Fixed-point formatting of a non-negative amount with comma thousands separators
fn group_thousands(amount: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, amount);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    grouped
}

/// Fallback for empty text fields in records
pub(crate) fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

/// JSON envelope shared by every JSON rendering
#[derive(Serialize)]
pub(crate) struct JsonPage<'a, T: Serialize> {
    pub title: &'a str,
    pub count: usize,
    pub total: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation_message: Option<String>,
    pub items: &'a [T],
}

impl<'a, T: Serialize> JsonPage<'a, T> {
    pub fn from_view(title: &'a str, view: &ResultView<'a, T>) -> Self {
        Self {
            title,
            count: view.items.len(),
            total: view.declared_total,
            truncated: view.truncation.is_some(),
            original_count: view.truncation.map(|n| n.original_count),
            truncation_message: view.truncation.map(|n| n.message()),
            items: view.items,
        }
    }

    pub fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize JSON response");
            format!("{{\"error\": \"failed to serialize response: {}\"}}", e)
        })
    }
}

/// Render a price list in the requested format
pub fn render_price_list(
    view: &ResultView<'_, PriceItem>,
    title: &str,
    format: ResponseFormat,
) -> String {
    match format {
        ResponseFormat::Json => JsonPage::from_view(title, view).render(),
        ResponseFormat::Markdown => price_list_markdown(view, title),
    }
}

fn price_list_markdown(view: &ResultView<'_, PriceItem>, title: &str) -> String {
    let count = view.items.len();
    let mut text = format!("# {}\n\n", title);

    if let Some(notice) = view.truncation {
        text.push_str(&format!("**Warning: {}**\n\n", notice.message()));
    }

    text.push_str(&format!("**Results**: {} items", count));
    if view.declared_total > count {
        text.push_str(&format!(" (showing {} of {} total)", count, view.declared_total));
    }
    text.push_str("\n\n");

    if view.items.is_empty() {
        text.push_str("No pricing data found for the specified criteria.\n");
        return text;
    }

    // Group by service, keeping first-appearance order
    let mut services: Vec<(&str, Vec<&PriceItem>)> = Vec::new();
    for item in view.items {
        let service = if item.service_name.is_empty() {
            "Unknown Service"
        } else {
            item.service_name.as_str()
        };
        match services.iter_mut().find(|(name, _)| *name == service) {
            Some((_, group)) => group.push(item),
            None => services.push((service, vec![item])),
        }
    }

    for (service, items) in services {
        text.push_str(&format!("## {}\n\n", service));
        for item in items {
            push_price_item(&mut text, item);
        }
    }

    text
}

fn push_price_item(text: &mut String, item: &PriceItem) {
    let unit = if item.unit_of_measure.is_empty() {
        "unit"
    } else {
        item.unit_of_measure.as_str()
    };
    let code = if item.currency_code.is_empty() {
        "USD"
    } else {
        item.currency_code.as_str()
    };

    let sku = if item.sku_name.is_empty() {
        "Unknown SKU"
    } else {
        item.sku_name.as_str()
    };
    text.push_str(&format!("### {}\n", sku));
    text.push_str(&format!("- **Product**: {}\n", or_na(&item.product_name)));
    text.push_str(&format!(
        "- **Region**: {} ({})\n",
        or_na(&item.location),
        or_na(&item.arm_region_name)
    ));
    text.push_str(&format!(
        "- **Price**: {} per {}\n",
        format_currency_code(item.retail_price, code),
        unit
    ));
    text.push_str(&format!("- **Type**: {}\n", or_na(&item.price_type)));

    if item.has_savings_plan() {
        text.push_str("- **Savings Plans Available**:\n");
        for plan in &item.savings_plan {
            text.push_str(&format!(
                "  - {}: {} per {}\n",
                or_na(&plan.term),
                format_currency_code(plan.retail_price, code),
                unit
            ));
        }
    }

    text.push_str(&format!("- **Meter ID**: `{}`\n", or_na(&item.meter_id)));
    text.push_str(&format!(
        "- **Effective Date**: {}\n\n",
        or_na(&item.effective_start_date)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::truncate::TruncationNotice;

    fn item(service: &str, sku: &str, price: f64) -> PriceItem {
        PriceItem {
            service_name: service.to_string(),
            sku_name: sku.to_string(),
            retail_price: price,
            currency_code: "USD".to_string(),
            unit_of_measure: "1 Hour".to_string(),
            location: "US East".to_string(),
            arm_region_name: "eastus".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.096, Currency::Usd), "$0.0960");
        assert_eq!(format_currency(1234.5, Currency::Eur), "€1,234.5000");
        assert_eq!(format_currency(1234567.4, Currency::Jpy), "¥1,234,567");
        assert_eq!(format_currency(12.0, Currency::Cad), "C$12.0000");
    }

    #[test]
    fn test_format_currency_negative_and_unknown() {
        assert_eq!(format_currency(-1500.25, Currency::Usd), "-$1,500.2500");
        assert_eq!(format_currency(-0.00001, Currency::Usd), "$0.0000");
        assert_eq!(format_currency_code(2.5, "CHF"), "CHF2.5000");
    }

    #[test]
    fn test_markdown_groups_by_service() {
        let items = vec![
            item("Virtual Machines", "D2s v3", 0.096),
            item("Storage", "Hot LRS", 0.0184),
            item("Virtual Machines", "D4s v3", 0.192),
        ];
        let view = ResultView {
            items: &items,
            declared_total: 10,
            truncation: None,
        };
        let text = render_price_list(&view, "Azure Service Prices (USD)", ResponseFormat::Markdown);

        assert!(text.starts_with("# Azure Service Prices (USD)"));
        assert!(text.contains("(showing 3 of 10 total)"));
        assert_eq!(text.matches("## Virtual Machines").count(), 1);
        assert!(text.find("D4s v3").unwrap() < text.find("## Storage").unwrap());
        assert!(text.contains("- **Price**: $0.0960 per 1 Hour"));
    }

    #[test]
    fn test_markdown_empty() {
        let view: ResultView<'_, PriceItem> = ResultView {
            items: &[],
            declared_total: 0,
            truncation: None,
        };
        let text = render_price_list(&view, "Prices", ResponseFormat::Markdown);
        assert!(text.contains("No pricing data found"));
    }

    #[test]
    fn test_json_includes_truncation_metadata() {
        let items = vec![item("Storage", "Hot LRS", 0.0184)];
        let view = ResultView {
            items: &items,
            declared_total: 4,
            truncation: Some(TruncationNotice {
                original_count: 4,
                kept_count: 1,
            }),
        };
        let text = render_price_list(&view, "Prices", ResponseFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["truncated"], true);
        assert_eq!(value["original_count"], 4);
        assert_eq!(value["items"][0]["skuName"], "Hot LRS");
    }
}
