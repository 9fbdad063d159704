//! Line-item naming table.
//!
//! Data-source versions rename line items ("Total Stockholder Equity" vs
//! "Stockholders Equity"). The catalog maps each canonical name used by the
//! ratio table to the aliases it may appear under.

use serde::{Deserialize, Serialize};
use statement_core::{normalize_label, LineItemValue, RawStatement};
use std::collections::HashMap;

pub const NET_INCOME: &str = "Net Income";
pub const GROSS_PROFIT: &str = "Gross Profit";
pub const TOTAL_REVENUE: &str = "Total Revenue";
pub const EBITDA: &str = "EBITDA";
pub const EBIT: &str = "EBIT";
pub const INTEREST_EXPENSE: &str = "Interest Expense";
pub const STOCKHOLDERS_EQUITY: &str = "Stockholders Equity";
pub const TOTAL_ASSETS: &str = "Total Assets";
pub const TOTAL_LIABILITIES: &str = "Total Liabilities";
pub const CASH_AND_EQUIVALENTS: &str = "Cash And Cash Equivalents";
pub const SHORT_LONG_TERM_DEBT: &str = "Short Long Term Debt";
pub const LONG_TERM_DEBT: &str = "Long Term Debt";
pub const INVESTED_CAPITAL: &str = "Invested Capital";
pub const CURRENT_ASSETS: &str = "Current Assets";
pub const CURRENT_LIABILITIES: &str = "Current Liabilities";
pub const INVENTORY: &str = "Inventory";
pub const CASH_DIVIDENDS_PAID: &str = "Cash Dividends Paid";
pub const FREE_CASH_FLOW: &str = "Free Cash Flow";
pub const OPERATING_CASH_FLOW: &str = "Operating Cash Flow";

/// Renames observed across statement-source versions
const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    (NET_INCOME, &["Net Income Common Stockholders"]),
    (GROSS_PROFIT, &[]),
    (TOTAL_REVENUE, &["Revenue", "Operating Revenue"]),
    (EBITDA, &["Normalized EBITDA"]),
    (EBIT, &[]),
    (INTEREST_EXPENSE, &[]),
    (
        STOCKHOLDERS_EQUITY,
        &["Total Stockholder Equity", "Stockholders' Equity", "Common Stock Equity"],
    ),
    (TOTAL_ASSETS, &[]),
    (TOTAL_LIABILITIES, &["Total Liabilities Net Minority Interest"]),
    (CASH_AND_EQUIVALENTS, &["Cash"]),
    (SHORT_LONG_TERM_DEBT, &["Current Debt"]),
    (LONG_TERM_DEBT, &[]),
    (INVESTED_CAPITAL, &[]),
    (CURRENT_ASSETS, &["Total Current Assets"]),
    (CURRENT_LIABILITIES, &["Total Current Liabilities"]),
    (INVENTORY, &[]),
    (CASH_DIVIDENDS_PAID, &["Dividends Paid", "Common Stock Dividend Paid"]),
    (FREE_CASH_FLOW, &[]),
    (
        OPERATING_CASH_FLOW,
        &["Total Cash From Operating Activities", "Cash Flow From Continuing Operating Activities"],
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub canonical: String,
    pub aliases: Vec<String>,
}

/// Where a looked-up value came from
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub value: LineItemValue,
    /// The label that supplied the value, if any candidate did
    pub matched_label: Option<String>,
}

impl Observation {
    pub fn is_observed(&self) -> bool {
        self.value.is_observed()
    }

    pub fn or_zero(&self) -> f64 {
        self.value.or_zero()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItemCatalog {
    entries: Vec<CatalogEntry>,
    /// normalized canonical name -> entry
    by_canonical: HashMap<String, usize>,
}

impl Default for LineItemCatalog {
    fn default() -> Self {
        let entries = DEFAULT_ALIASES
            .iter()
            .map(|(canonical, aliases)| CatalogEntry {
                canonical: canonical.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            })
            .collect();
        Self::from_entries(entries)
    }
}

impl LineItemCatalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(entries.len()),
            by_canonical: HashMap::new(),
        };
        for entry in entries {
            catalog.add_aliases(&entry.canonical, entry.aliases);
        }
        catalog
    }

    /// Catalog with canonical names only; lookups are exact (after normalization)
    pub fn without_aliases() -> Self {
        let entries = DEFAULT_ALIASES
            .iter()
            .map(|(canonical, _)| CatalogEntry {
                canonical: canonical.to_string(),
                aliases: Vec::new(),
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Append aliases to a canonical name, creating the entry if needed.
    /// Duplicates (after normalization) are dropped.
    pub fn add_aliases(&mut self, canonical: &str, aliases: Vec<String>) {
        let key = normalize_label(canonical);
        let idx = match self.by_canonical.get(&key) {
            Some(&idx) => idx,
            None => {
                self.entries.push(CatalogEntry {
                    canonical: canonical.to_string(),
                    aliases: Vec::new(),
                });
                self.by_canonical.insert(key.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[idx];
        for alias in aliases {
            let alias_key = normalize_label(&alias);
            let duplicate = alias_key == key
                || entry.aliases.iter().any(|a| normalize_label(a) == alias_key);
            if !duplicate && !alias_key.is_empty() {
                entry.aliases.push(alias);
            }
        }
    }

    /// Merge a `{canonical: [alias, ...]}` JSON object over this catalog
    pub fn merge_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let extra: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        let mut canonicals: Vec<_> = extra.into_iter().collect();
        // HashMap order is random; keep merges reproducible
        canonicals.sort_by(|a, b| a.0.cmp(&b.0));
        for (canonical, aliases) in canonicals {
            self.add_aliases(&canonical, aliases);
        }
        Ok(())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Labels to try for `name`, canonical first
    pub fn candidates<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        match self.by_canonical.get(&normalize_label(name)) {
            Some(&idx) => {
                let entry = &self.entries[idx];
                std::iter::once(entry.canonical.as_str())
                    .chain(entry.aliases.iter().map(String::as_str))
                    .collect()
            }
            None => vec![name],
        }
    }

    /// Whether a source label is any known canonical name or alias
    pub fn recognizes(&self, label: &str) -> bool {
        let key = normalize_label(label);
        if key.is_empty() {
            return false;
        }
        self.entries.iter().any(|e| {
            normalize_label(&e.canonical) == key
                || e.aliases.iter().any(|a| normalize_label(a) == key)
        })
    }

    /// Look `name` up in the most recent period, trying aliases in order.
    ///
    /// The first candidate holding a finite value wins. Non-finite values
    /// count as absent.
    pub fn resolve(&self, statement: &RawStatement, name: &str) -> Observation {
        for candidate in self.candidates(name) {
            if let Some(v) = statement.latest(candidate).as_option() {
                if v.is_finite() {
                    return Observation {
                        value: LineItemValue::Value(v),
                        matched_label: Some(candidate.to_string()),
                    };
                }
            }
        }
        Observation {
            value: LineItemValue::Missing,
            matched_label: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_core::StatementKind;

    #[test]
    fn test_candidates_canonical_first() {
        let catalog = LineItemCatalog::default();
        let c = catalog.candidates("stockholders equity");
        assert_eq!(c[0], STOCKHOLDERS_EQUITY);
        assert!(c.contains(&"Total Stockholder Equity"));

        assert_eq!(catalog.candidates("Deferred Revenue"), vec!["Deferred Revenue"]);
    }

    #[test]
    fn test_resolve_prefers_canonical_then_alias() {
        let catalog = LineItemCatalog::default();
        let st = RawStatement::single_period(
            StatementKind::Balance,
            "2024-06-30",
            &[("Total Stockholder Equity", 900.0), ("Stockholders Equity", 1000.0)],
        );
        let obs = catalog.resolve(&st, STOCKHOLDERS_EQUITY);
        assert_eq!(obs.value, LineItemValue::Value(1000.0));
        assert_eq!(obs.matched_label.as_deref(), Some(STOCKHOLDERS_EQUITY));

        let legacy = RawStatement::single_period(
            StatementKind::Balance,
            "2024-06-30",
            &[("total stockholder equity", 900.0)],
        );
        assert_eq!(catalog.resolve(&legacy, STOCKHOLDERS_EQUITY).or_zero(), 900.0);
    }

    #[test]
    fn test_resolve_skips_unusable_values() {
        let catalog = LineItemCatalog::default();
        let st = RawStatement::single_period(
            StatementKind::CashFlow,
            "2024-06-30",
            &[("Cash Dividends Paid", f64::NAN), ("Dividends Paid", -20.0)],
        );
        assert_eq!(catalog.resolve(&st, CASH_DIVIDENDS_PAID).or_zero(), -20.0);

        let inf = RawStatement::single_period(
            StatementKind::CashFlow,
            "2024-06-30",
            &[("Free Cash Flow", f64::INFINITY)],
        );
        assert!(!catalog.resolve(&inf, FREE_CASH_FLOW).is_observed());
    }

    #[test]
    fn test_merge_json_adds_aliases() {
        let mut catalog = LineItemCatalog::without_aliases();
        catalog
            .merge_json(r#"{"Inventory": ["Inventories", "inventory"], "Capital Expenditure": ["Capex"]}"#)
            .unwrap();

        let inv = catalog.candidates(INVENTORY);
        assert_eq!(inv, vec![INVENTORY, "Inventories"]);
        assert!(catalog.recognizes("capex"));
        assert!(catalog.merge_json("[1]").is_err());
    }

    #[test]
    fn test_recognizes_aliases_and_canonicals() {
        let catalog = LineItemCatalog::default();
        assert!(catalog.recognizes("short/long term debt"));
        assert!(catalog.recognizes("Dividends Paid"));
        assert!(!catalog.recognizes("2024-06-30"));
        assert!(!catalog.recognizes("--"));
    }
}
