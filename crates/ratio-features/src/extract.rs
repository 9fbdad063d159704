use statement_core::RawStatement;
use std::sync::OnceLock;

use crate::catalog::{LineItemCatalog, Observation, LONG_TERM_DEBT, SHORT_LONG_TERM_DEBT};

/// Balance-sheet items summed into total debt
pub const TOTAL_DEBT_COMPONENTS: [&str; 2] = [SHORT_LONG_TERM_DEBT, LONG_TERM_DEBT];

fn default_catalog() -> &'static LineItemCatalog {
    static CATALOG: OnceLock<LineItemCatalog> = OnceLock::new();
    CATALOG.get_or_init(LineItemCatalog::default)
}

/// Most recent value of a line item, or 0.0 when it is absent, null or NaN.
///
/// Uses the built-in alias table. Never fails: a missing item is a silent zero.
pub fn extract_field(statement: &RawStatement, line_item: &str) -> f64 {
    extract_field_with(default_catalog(), statement, line_item)
}

pub fn extract_field_with(
    catalog: &LineItemCatalog,
    statement: &RawStatement,
    line_item: &str,
) -> f64 {
    observe_field(catalog, statement, line_item).or_zero()
}

/// Like [`extract_field_with`], but keeps whether the item was reported.
pub fn observe_field(catalog: &LineItemCatalog, statement: &RawStatement, line_item: &str) -> Observation {
    catalog.resolve(statement, line_item)
}

/// Guarded division used for every ratio.
///
/// Returns 0.0 when either operand is zero or non-finite, or when the
/// quotient is not finite.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if numerator == 0.0 || denominator == 0.0 {
        return 0.0;
    }
    if !numerator.is_finite() || !denominator.is_finite() {
        return 0.0;
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        0.0
    }
}

/// [`safe_divide`] for operands that may be null
pub fn safe_divide_opt(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    match (numerator, denominator) {
        (Some(n), Some(d)) => safe_divide(n, d),
        _ => 0.0,
    }
}

/// Short/long-term debt plus long-term debt, each zero-defaulted
pub fn compute_total_debt(balance: &RawStatement) -> f64 {
    compute_total_debt_with(default_catalog(), balance)
}

pub fn compute_total_debt_with(catalog: &LineItemCatalog, balance: &RawStatement) -> f64 {
    total_debt_from(&observe_total_debt(catalog, balance))
}

/// Observations of [`TOTAL_DEBT_COMPONENTS`], in that order
pub fn observe_total_debt(catalog: &LineItemCatalog, balance: &RawStatement) -> [Observation; 2] {
    TOTAL_DEBT_COMPONENTS.map(|item| observe_field(catalog, balance, item))
}

pub fn total_debt_from(parts: &[Observation; 2]) -> f64 {
    parts[0].or_zero() + parts[1].or_zero()
}
