use serde::Serialize;
use statement_core::{MissingDataError, RatioName, RatioRecord, RawStatement, StatementKind, StatementSet};

use crate::catalog::{LineItemCatalog, Observation};
use crate::config::FeatureConfig;
use crate::extract::{observe_field, observe_total_debt, safe_divide, total_debt_from, TOTAL_DEBT_COMPONENTS};
use crate::ratios::{Operand, RatioSet};
use crate::validate_statements;

/// A line item referenced by the active ratio set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FieldRef {
    pub statement: StatementKind,
    pub line_item: &'static str,
}

/// Ratio record plus provenance: which inputs were defaulted and which
/// outputs had to be zeroed.
#[derive(Debug, Clone, Serialize)]
pub struct RatioReport {
    pub record: RatioRecord,
    pub ratio_set: RatioSet,
    /// Referenced line items that were absent and defaulted to 0.0
    pub defaulted_fields: Vec<FieldRef>,
    /// Ratios whose computed value was non-finite and replaced with 0.0
    pub sanitized: Vec<RatioName>,
    /// Observed referenced fields / all referenced fields
    pub coverage: f64,
}

impl RatioReport {
    pub fn has_advisories(&self) -> bool {
        !self.defaulted_fields.is_empty() || !self.sanitized.is_empty()
    }

    /// Human-readable notes for the caller; never errors
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if !self.sanitized.is_empty() {
            let names: Vec<&str> = self.sanitized.iter().map(|n| n.as_str()).collect();
            notes.push(format!("NaN detected in input, filled with 0: {}", names.join(", ")));
        }
        if !self.defaulted_fields.is_empty() {
            let fields: Vec<String> = self
                .defaulted_fields
                .iter()
                .map(|f| format!("{} ({})", f.line_item, f.statement.file_stem()))
                .collect();
            notes.push(format!("Missing line items defaulted to 0: {}", fields.join(", ")));
        }
        notes
    }
}

/// Walks the ratio table over one set of statements, remembering which
/// referenced fields were actually present.
struct Evaluation<'a> {
    catalog: &'a LineItemCatalog,
    income: &'a RawStatement,
    balance: &'a RawStatement,
    cashflow: &'a RawStatement,
    seen: Vec<(FieldRef, bool)>,
}

impl<'a> Evaluation<'a> {
    fn statement(&self, kind: StatementKind) -> &'a RawStatement {
        match kind {
            StatementKind::Income => self.income,
            StatementKind::Balance => self.balance,
            StatementKind::CashFlow => self.cashflow,
        }
    }

    fn note(&mut self, statement: StatementKind, line_item: &'static str, obs: &Observation) {
        let field = FieldRef {
            statement,
            line_item,
        };
        if !self.seen.iter().any(|(f, _)| *f == field) {
            self.seen.push((field, obs.is_observed()));
        }
    }

    fn field(&mut self, statement: StatementKind, line_item: &'static str) -> f64 {
        let obs = observe_field(self.catalog, self.statement(statement), line_item);
        self.note(statement, line_item, &obs);
        obs.or_zero()
    }

    fn operand(&mut self, operand: Operand) -> f64 {
        match operand {
            Operand::Field(statement, item) => self.field(statement, item),
            Operand::TotalDebt => {
                let parts = observe_total_debt(self.catalog, self.balance);
                for (item, obs) in TOTAL_DEBT_COMPONENTS.iter().zip(&parts) {
                    self.note(StatementKind::Balance, *item, obs);
                }
                total_debt_from(&parts)
            }
            Operand::Difference(statement, minuend, subtrahend) => {
                self.field(statement, minuend) - self.field(statement, subtrahend)
            }
        }
    }
}

/// Turns three quarterly statements into a classifier-ready ratio record
#[derive(Debug, Clone, Default)]
pub struct RatioBuilder {
    config: FeatureConfig,
}

impl RatioBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn ratio_set(&self) -> RatioSet {
        self.config.ratio_set
    }

    pub fn build(
        &self,
        income: &RawStatement,
        balance: &RawStatement,
        cashflow: &RawStatement,
    ) -> Result<RatioRecord, MissingDataError> {
        self.build_report(income, balance, cashflow).map(|r| r.record)
    }

    /// Validate, extract, divide, sanitize.
    ///
    /// Fails only when a statement is empty; every other irregularity is
    /// absorbed as a zero and listed in the report.
    pub fn build_report(
        &self,
        income: &RawStatement,
        balance: &RawStatement,
        cashflow: &RawStatement,
    ) -> Result<RatioReport, MissingDataError> {
        validate_statements(income, balance, cashflow)?;

        let mut eval = Evaluation {
            catalog: &self.config.catalog,
            income,
            balance,
            cashflow,
            seen: Vec::new(),
        };

        let raw: Vec<(RatioName, f64)> = self
            .config
            .ratio_set
            .specs()
            .iter()
            .map(|spec| {
                let numerator = eval.operand(spec.numerator);
                let denominator = eval.operand(spec.denominator);
                (spec.name, safe_divide(numerator, denominator))
            })
            .collect();

        let (record, sanitized) = RatioRecord::sanitized(raw);
        if !sanitized.is_empty() {
            tracing::warn!(
                ratios = ?sanitized,
                "NaN detected in ratio input, filling with 0"
            );
        }

        let referenced = eval.seen.len();
        let observed = eval.seen.iter().filter(|(_, present)| *present).count();
        let defaulted_fields: Vec<FieldRef> = eval
            .seen
            .iter()
            .filter(|(_, present)| !*present)
            .map(|(f, _)| *f)
            .collect();
        let coverage = if referenced == 0 {
            1.0
        } else {
            observed as f64 / referenced as f64
        };

        if !defaulted_fields.is_empty() {
            tracing::debug!(
                defaulted = defaulted_fields.len(),
                referenced,
                "line items missing from statements, defaulted to 0"
            );
        }

        Ok(RatioReport {
            record,
            ratio_set: self.config.ratio_set,
            defaulted_fields,
            sanitized,
            coverage,
        })
    }

    pub fn build_report_for(&self, statements: &StatementSet) -> Result<RatioReport, MissingDataError> {
        self.build_report(&statements.income, &statements.balance, &statements.cashflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_ratio_record;
    use approx::assert_relative_eq;
    use statement_core::LineItemValue;

    const PERIOD: &str = "2024-06-30";

    fn scenario() -> (RawStatement, RawStatement, RawStatement) {
        let income = RawStatement::single_period(
            StatementKind::Income,
            PERIOD,
            &[("Net Income", 100.0), ("Total Revenue", 500.0), ("Gross Profit", 200.0)],
        );
        let balance = RawStatement::single_period(
            StatementKind::Balance,
            PERIOD,
            &[
                ("Stockholders Equity", 1000.0),
                ("Total Assets", 2000.0),
                ("Short Long Term Debt", 50.0),
                ("Long Term Debt", 150.0),
                ("Current Assets", 300.0),
                ("Current Liabilities", 100.0),
                ("Inventory", 50.0),
                ("Cash And Cash Equivalents", 80.0),
            ],
        );
        let cashflow = RawStatement::single_period(
            StatementKind::CashFlow,
            PERIOD,
            &[
                ("Cash Dividends Paid", 20.0),
                ("Operating Cash Flow", 120.0),
                ("Free Cash Flow", 90.0),
            ],
        );
        (income, balance, cashflow)
    }

    /// Non-empty statements that carry no referenced line item
    fn placeholders() -> (RawStatement, RawStatement, RawStatement) {
        let unrelated = |kind| RawStatement::single_period(kind, PERIOD, &[("Unrelated Item", 1.0)]);
        (
            unrelated(StatementKind::Income),
            unrelated(StatementKind::Balance),
            unrelated(StatementKind::CashFlow),
        )
    }

    #[test]
    fn test_concrete_scenario() {
        let (income, balance, cashflow) = scenario();
        let record = build_ratio_record(&income, &balance, &cashflow).unwrap();

        let get = |name| record.get(name).unwrap();
        assert_relative_eq!(get(RatioName::Roe), 0.1);
        assert_relative_eq!(get(RatioName::Roa), 0.05);
        assert_relative_eq!(get(RatioName::Npm), 0.2);
        assert_relative_eq!(get(RatioName::GProf), 0.4);
        assert_relative_eq!(get(RatioName::Dpr), 0.2);
        assert_relative_eq!(get(RatioName::DeRatio), 0.2);
        assert_relative_eq!(get(RatioName::CurrRatio), 3.0);
        assert_relative_eq!(get(RatioName::QuickRatio), 2.5);
        assert_relative_eq!(get(RatioName::CashRatio), 0.8);
        assert_relative_eq!(get(RatioName::CashDebt), 0.4);
        assert_relative_eq!(get(RatioName::CashLt), 80.0 / 150.0);
        assert_relative_eq!(get(RatioName::OcfLct), 0.6);
        assert_relative_eq!(get(RatioName::FcfOcf), 0.75);

        // Inputs absent from the scenario
        assert_eq!(get(RatioName::TotDebtInvCap), 0.0);
        assert_eq!(get(RatioName::DebtEbitda), 0.0);
        assert_eq!(get(RatioName::IntCovRatio), 0.0);

        assert_eq!(record.names(), RatioName::ALL.to_vec());
    }

    #[test]
    fn test_all_fields_absent_gives_zeros() {
        let (income, balance, cashflow) = placeholders();
        let report = RatioBuilder::default()
            .build_report(&income, &balance, &cashflow)
            .unwrap();

        assert_eq!(report.record.len(), 16);
        assert!(report.record.values().iter().all(|v| *v == 0.0));
        assert_eq!(report.coverage, 0.0);
        assert!(report.sanitized.is_empty());
        assert!(report.has_advisories());
    }

    #[test]
    fn test_explicit_zeros_give_zeros() {
        let zeros = |kind, items: &[&str]| {
            let pairs: Vec<(&str, f64)> = items.iter().map(|i| (*i, 0.0)).collect();
            RawStatement::single_period(kind, PERIOD, &pairs)
        };
        let income = zeros(
            StatementKind::Income,
            &["Net Income", "Total Revenue", "Gross Profit", "EBITDA", "EBIT", "Interest Expense"],
        );
        let balance = zeros(
            StatementKind::Balance,
            &[
                "Stockholders Equity",
                "Total Assets",
                "Short Long Term Debt",
                "Long Term Debt",
                "Invested Capital",
                "Current Assets",
                "Current Liabilities",
                "Inventory",
                "Cash And Cash Equivalents",
            ],
        );
        let cashflow = zeros(
            StatementKind::CashFlow,
            &["Cash Dividends Paid", "Operating Cash Flow", "Free Cash Flow"],
        );

        let report = RatioBuilder::default()
            .build_report(&income, &balance, &cashflow)
            .unwrap();
        assert!(report.record.values().iter().all(|v| *v == 0.0));
        // Zero is an observed value, not a default
        assert_eq!(report.coverage, 1.0);
        assert!(report.defaulted_fields.is_empty());
    }

    #[test]
    fn test_every_empty_combination_is_rejected() {
        let (income, balance, cashflow) = scenario();
        let empty = |kind| RawStatement::empty(kind);

        for mask in 1u8..8 {
            let inc = if mask & 1 != 0 { empty(StatementKind::Income) } else { income.clone() };
            let bal = if mask & 2 != 0 { empty(StatementKind::Balance) } else { balance.clone() };
            let cf = if mask & 4 != 0 { empty(StatementKind::CashFlow) } else { cashflow.clone() };

            let err = build_ratio_record(&inc, &bal, &cf).unwrap_err();
            assert_eq!(err.contains(StatementKind::Income), mask & 1 != 0);
            assert_eq!(err.contains(StatementKind::Balance), mask & 2 != 0);
            assert_eq!(err.contains(StatementKind::CashFlow), mask & 4 != 0);
        }
    }

    #[test]
    fn test_periods_without_items_is_empty() {
        let (income, balance, _) = scenario();
        let cashflow = RawStatement::from_rows(StatementKind::CashFlow, vec![PERIOD.into()], vec![]);
        assert!(build_ratio_record(&income, &balance, &cashflow).is_err());
    }

    #[test]
    fn test_build_is_idempotent() {
        let (income, balance, cashflow) = scenario();
        let builder = RatioBuilder::default();
        let a = builder.build(&income, &balance, &cashflow).unwrap();
        let b = builder.build(&income, &balance, &cashflow).unwrap();

        let bits = |r: &RatioRecord| r.values().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.names(), b.names());
    }

    fn rand_like(seed: &mut u64) -> u64 {
        *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        *seed >> 33
    }

    #[test]
    fn test_randomized_inputs_stay_finite() {
        let specials = [0.0, -0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, f64::MAX, f64::MIN, 1e-308];
        let items = [
            "Net Income", "Total Revenue", "Gross Profit", "EBITDA", "EBIT", "Interest Expense",
            "Stockholders Equity", "Total Assets", "Short Long Term Debt", "Long Term Debt",
            "Invested Capital", "Current Assets", "Current Liabilities", "Inventory",
            "Cash And Cash Equivalents", "Cash Dividends Paid", "Operating Cash Flow", "Free Cash Flow",
        ];
        let mut seed = 42u64;

        for _ in 0..200 {
            let mut make = |kind| {
                let rows = items
                    .iter()
                    .filter_map(|item| {
                        let roll = rand_like(&mut seed) % 10;
                        let value = match roll {
                            0 => return None,
                            1 => LineItemValue::Missing,
                            2 => LineItemValue::Value(specials[(rand_like(&mut seed) % 8) as usize]),
                            _ => LineItemValue::Value((rand_like(&mut seed) % 2_000_000) as f64 - 1_000_000.0),
                        };
                        Some((item.to_string(), vec![value]))
                    })
                    .chain(std::iter::once(("Filler".to_string(), vec![LineItemValue::Value(1.0)])))
                    .collect();
                RawStatement::from_rows(kind, vec![PERIOD.into()], rows)
            };
            let income = make(StatementKind::Income);
            let balance = make(StatementKind::Balance);
            let cashflow = make(StatementKind::CashFlow);

            for set in [RatioSet::Standard, RatioSet::Compact] {
                let builder = RatioBuilder::new(FeatureConfig::default().with_ratio_set(set));
                let report = builder.build_report(&income, &balance, &cashflow).unwrap();
                assert!(report.record.values().iter().all(|v| v.is_finite()));
                assert!((0.0..=1.0).contains(&report.coverage));
            }
        }
    }

    #[test]
    fn test_compact_set_uses_total_liabilities() {
        let (income, mut balance, cashflow) = scenario();
        balance = RawStatement::from_rows(
            StatementKind::Balance,
            vec![PERIOD.into()],
            balance
                .line_items()
                .iter()
                .map(|l| (l.clone(), vec![balance.latest(l)]))
                .chain(std::iter::once(("Total Liabilities".to_string(), vec![LineItemValue::Value(500.0)])))
                .collect(),
        );

        let builder = RatioBuilder::new(FeatureConfig::default().with_ratio_set(RatioSet::Compact));
        let record = builder.build(&income, &balance, &cashflow).unwrap();
        assert_eq!(record.len(), 8);
        assert_relative_eq!(record.get(RatioName::DeRatio).unwrap(), 0.5);
        assert!(record.get(RatioName::QuickRatio).is_none());
    }

    #[test]
    fn test_renamed_line_items_resolve_through_aliases() {
        let income = RawStatement::single_period(StatementKind::Income, PERIOD, &[("Net Income", 100.0)]);
        let balance = RawStatement::single_period(
            StatementKind::Balance,
            PERIOD,
            &[
                ("total stockholder equity", 1000.0),
                ("short/long term debt", 50.0),
                ("long term debt", 150.0),
                ("cash", 80.0),
            ],
        );
        let cashflow = RawStatement::single_period(
            StatementKind::CashFlow,
            PERIOD,
            &[("dividends paid", 20.0), ("total cash from operating activities", 120.0)],
        );

        let record = build_ratio_record(&income, &balance, &cashflow).unwrap();
        assert_relative_eq!(record.get(RatioName::Roe).unwrap(), 0.1);
        assert_relative_eq!(record.get(RatioName::Dpr).unwrap(), 0.2);
        assert_relative_eq!(record.get(RatioName::CashDebt).unwrap(), 0.4);
        assert_relative_eq!(record.get(RatioName::OcfLct).unwrap(), 0.6);
    }

    #[test]
    fn test_strict_catalog_ignores_aliases() {
        let (income, _, cashflow) = scenario();
        let balance = RawStatement::single_period(
            StatementKind::Balance,
            PERIOD,
            &[("Total Stockholder Equity", 1000.0)],
        );
        let builder = RatioBuilder::new(
            FeatureConfig::default().with_catalog(LineItemCatalog::without_aliases()),
        );
        let report = builder.build_report(&income, &balance, &cashflow).unwrap();
        assert_eq!(report.record.get(RatioName::Roe), Some(0.0));
        assert!(report.defaulted_fields.contains(&FieldRef {
            statement: StatementKind::Balance,
            line_item: crate::catalog::STOCKHOLDERS_EQUITY,
        }));
    }

    #[test]
    fn test_report_coverage_for_scenario() {
        let (income, balance, cashflow) = scenario();
        let report = RatioBuilder::default()
            .build_report(&income, &balance, &cashflow)
            .unwrap();

        // 18 referenced fields; EBITDA, EBIT, Interest Expense, Invested Capital are absent
        assert_eq!(report.defaulted_fields.len(), 4);
        assert_relative_eq!(report.coverage, 14.0 / 18.0);
        assert_eq!(report.advisories().len(), 1);
    }

    #[test]
    fn test_debt_ratios_agree_with_total_debt() {
        let (income, _, cashflow) = scenario();
        let balance = RawStatement::single_period(
            StatementKind::Balance,
            PERIOD,
            &[("Stockholders Equity", 1000.0), ("Current Debt", 30.0), ("Cash", 60.0)],
        );
        let report = RatioBuilder::default()
            .build_report(&income, &balance, &cashflow)
            .unwrap();

        let debt = crate::extract::compute_total_debt(&balance);
        assert_eq!(debt, 30.0);
        assert_eq!(report.record.get(RatioName::DeRatio), Some(safe_divide(debt, 1000.0)));
        assert_eq!(report.record.get(RatioName::CashDebt), Some(safe_divide(60.0, debt)));

        let long_term = FieldRef {
            statement: StatementKind::Balance,
            line_item: "Long Term Debt",
        };
        let short_term = FieldRef {
            statement: StatementKind::Balance,
            line_item: "Short Long Term Debt",
        };
        assert!(report.defaulted_fields.contains(&long_term));
        assert!(!report.defaulted_fields.contains(&short_term));
    }
}
