//! OData filter construction for the Retail Prices API
//!
//! Builds `$filter` expressions such as
//! `serviceName eq 'Virtual Machines' and (armRegionName eq 'eastus' or armRegionName eq 'westus')`.

/// Builder for an OData `$filter` expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataFilter {
    clauses: Vec<String>,
}

impl ODataFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field eq 'value'` clause
    pub fn eq(mut self, field: &str, value: &str) -> Self {
        self.clauses.push(eq_clause(field, value));
        self
    }

    /// Add an equality clause only when a value is present
    pub fn eq_opt(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    /// Add a clause matching any of `values`
    ///
    /// A single value collapses to a plain equality; an empty slice adds nothing.
    pub fn any_of<S: AsRef<str>>(mut self, field: &str, values: &[S]) -> Self {
        match values {
            [] => {}
            [only] => self.clauses.push(eq_clause(field, only.as_ref())),
            _ => {
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| eq_clause(field, v.as_ref()))
                    .collect();
                self.clauses.push(format!("({})", parts.join(" or ")));
            }
        }
        self
    }

    /// Add a `contains(field, 'term')` clause
    pub fn contains(mut self, field: &str, term: &str) -> Self {
        self.clauses
            .push(format!("contains({}, '{}')", field, escape(term)));
        self
    }

    /// Render the expression, or `None` when there is nothing to filter on
    pub fn build(self) -> Option<String> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(self.clauses.join(" and "))
        }
    }
}

fn eq_clause(field: &str, value: &str) -> String {
    format!("{} eq '{}'", field, escape(value))
}

/// OData string literals escape a single quote by doubling it
fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter() {
        assert_eq!(ODataFilter::new().build(), None);
    }

    #[test]
    fn test_eq_clauses_joined_with_and() {
        let filter = ODataFilter::new()
            .eq("serviceName", "Virtual Machines")
            .eq_opt("armRegionName", Some("eastus"))
            .eq_opt("skuName", None)
            .build();
        assert_eq!(
            filter.as_deref(),
            Some("serviceName eq 'Virtual Machines' and armRegionName eq 'eastus'")
        );
    }

    #[test]
    fn test_any_of_groups_with_or() {
        let filter = ODataFilter::new()
            .any_of("armRegionName", &["eastus", "westeurope"])
            .build();
        assert_eq!(
            filter.as_deref(),
            Some("(armRegionName eq 'eastus' or armRegionName eq 'westeurope')")
        );
    }

    #[test]
    fn test_contains_and_escaping() {
        let filter = ODataFilter::new()
            .contains("skuName", "D2s")
            .eq("productName", "O'Brien")
            .build();
        assert_eq!(
            filter.as_deref(),
            Some("contains(skuName, 'D2s') and productName eq 'O''Brien'")
        );
    }
}
