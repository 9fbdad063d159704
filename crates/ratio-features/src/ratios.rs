//! Ratio definitions: which line items feed each model input.

use serde::{Deserialize, Serialize};
use statement_core::{RatioName, StatementKind};
use std::fmt;
use std::str::FromStr;

use crate::catalog::*;

/// One side of a ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Field(StatementKind, &'static str),
    /// Short/long-term debt + long-term debt from the balance sheet
    TotalDebt,
    /// `minuend - subtrahend`, both from the same statement
    Difference(StatementKind, &'static str, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioSpec {
    pub name: RatioName,
    pub numerator: Operand,
    pub denominator: Operand,
}

const fn ratio(name: RatioName, numerator: Operand, denominator: Operand) -> RatioSpec {
    RatioSpec {
        name,
        numerator,
        denominator,
    }
}

const fn income(item: &'static str) -> Operand {
    Operand::Field(StatementKind::Income, item)
}

const fn balance(item: &'static str) -> Operand {
    Operand::Field(StatementKind::Balance, item)
}

const fn cashflow(item: &'static str) -> Operand {
    Operand::Field(StatementKind::CashFlow, item)
}

pub const STANDARD_RATIOS: [RatioSpec; 16] = [
    ratio(RatioName::Dpr, cashflow(CASH_DIVIDENDS_PAID), income(NET_INCOME)),
    ratio(RatioName::Roe, income(NET_INCOME), balance(STOCKHOLDERS_EQUITY)),
    ratio(RatioName::Roa, income(NET_INCOME), balance(TOTAL_ASSETS)),
    ratio(RatioName::GProf, income(GROSS_PROFIT), income(TOTAL_REVENUE)),
    ratio(RatioName::Npm, income(NET_INCOME), income(TOTAL_REVENUE)),
    ratio(RatioName::FcfOcf, cashflow(FREE_CASH_FLOW), cashflow(OPERATING_CASH_FLOW)),
    ratio(RatioName::CashDebt, balance(CASH_AND_EQUIVALENTS), Operand::TotalDebt),
    ratio(RatioName::CashLt, balance(CASH_AND_EQUIVALENTS), balance(LONG_TERM_DEBT)),
    ratio(RatioName::OcfLct, cashflow(OPERATING_CASH_FLOW), Operand::TotalDebt),
    ratio(RatioName::TotDebtInvCap, Operand::TotalDebt, balance(INVESTED_CAPITAL)),
    ratio(RatioName::DeRatio, Operand::TotalDebt, balance(STOCKHOLDERS_EQUITY)),
    ratio(RatioName::DebtEbitda, Operand::TotalDebt, income(EBITDA)),
    ratio(RatioName::IntCovRatio, income(EBIT), income(INTEREST_EXPENSE)),
    ratio(RatioName::CurrRatio, balance(CURRENT_ASSETS), balance(CURRENT_LIABILITIES)),
    ratio(RatioName::CashRatio, balance(CASH_AND_EQUIVALENTS), balance(CURRENT_LIABILITIES)),
    ratio(
        RatioName::QuickRatio,
        Operand::Difference(StatementKind::Balance, CURRENT_ASSETS, INVENTORY),
        balance(CURRENT_LIABILITIES),
    ),
];

/// Eight-ratio set of the older statement source; leverage there is
/// total liabilities over equity.
pub const COMPACT_RATIOS: [RatioSpec; 8] = [
    ratio(RatioName::Dpr, cashflow(CASH_DIVIDENDS_PAID), income(NET_INCOME)),
    ratio(RatioName::Roe, income(NET_INCOME), balance(STOCKHOLDERS_EQUITY)),
    ratio(RatioName::Roa, income(NET_INCOME), balance(TOTAL_ASSETS)),
    ratio(RatioName::GProf, income(GROSS_PROFIT), income(TOTAL_REVENUE)),
    ratio(RatioName::Npm, income(NET_INCOME), income(TOTAL_REVENUE)),
    ratio(RatioName::FcfOcf, cashflow(FREE_CASH_FLOW), cashflow(OPERATING_CASH_FLOW)),
    ratio(RatioName::CashDebt, balance(CASH_AND_EQUIVALENTS), Operand::TotalDebt),
    ratio(RatioName::DeRatio, balance(TOTAL_LIABILITIES), balance(STOCKHOLDERS_EQUITY)),
];

/// Which ratio vocabulary the active models were trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioSet {
    #[default]
    Standard,
    Compact,
}

impl RatioSet {
    pub fn specs(&self) -> &'static [RatioSpec] {
        match self {
            RatioSet::Standard => &STANDARD_RATIOS,
            RatioSet::Compact => &COMPACT_RATIOS,
        }
    }

    pub fn names(&self) -> Vec<RatioName> {
        self.specs().iter().map(|s| s.name).collect()
    }

    pub fn key(&self) -> &'static str {
        match self {
            RatioSet::Standard => "standard",
            RatioSet::Compact => "compact",
        }
    }
}

impl fmt::Display for RatioSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RatioSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "full" => Ok(RatioSet::Standard),
            "compact" | "legacy" => Ok(RatioSet::Compact),
            other => Err(format!("unknown ratio set '{}'", other)),
        }
    }
}
