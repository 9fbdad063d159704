//! Ratio extraction and feature building.
//!
//! Turns a company's quarterly income statement, balance sheet and cash-flow
//! statement into the ordered, finite ratio record the dividend classifiers
//! expect. Missing line items become zeros; only empty statements are an error.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod extract;
pub mod ratios;

pub use builder::{FieldRef, RatioBuilder, RatioReport};
pub use catalog::{CatalogEntry, LineItemCatalog, Observation};
pub use config::FeatureConfig;
pub use extract::{
    compute_total_debt, compute_total_debt_with, extract_field, extract_field_with, observe_field,
    observe_total_debt, safe_divide, safe_divide_opt, total_debt_from, TOTAL_DEBT_COMPONENTS,
};
pub use ratios::{Operand, RatioSet, RatioSpec, COMPACT_RATIOS, STANDARD_RATIOS};

use statement_core::{MissingDataError, RatioRecord, RawStatement, StatementKind};

/// Reject the request if any statement has no periods or no line items.
pub fn validate_statements(
    income: &RawStatement,
    balance: &RawStatement,
    cashflow: &RawStatement,
) -> Result<(), MissingDataError> {
    let missing: Vec<StatementKind> = [income, balance, cashflow]
        .iter()
        .filter(|s| s.is_empty())
        .map(|s| s.kind())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        tracing::warn!(
            "Financial statements unavailable: {}",
            missing.iter().map(|k| k.label()).collect::<Vec<_>>().join(", ")
        );
        Err(MissingDataError::new(missing))
    }
}

/// Build the standard sixteen-ratio record with the built-in alias table.
pub fn build_ratio_record(
    income: &RawStatement,
    balance: &RawStatement,
    cashflow: &RawStatement,
) -> Result<RatioRecord, MissingDataError> {
    RatioBuilder::default().build(income, balance, cashflow)
}
