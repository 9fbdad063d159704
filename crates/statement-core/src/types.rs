use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::RawStatement;

/// Which of the three quarterly statements a table represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Income,
    Balance,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::Income,
        StatementKind::Balance,
        StatementKind::CashFlow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::Income => "income statement",
            StatementKind::Balance => "balance sheet",
            StatementKind::CashFlow => "cash flow statement",
        }
    }

    /// File stem used by on-disk statement dumps
    pub fn file_stem(&self) -> &'static str {
        match self {
            StatementKind::Income => "income",
            StatementKind::Balance => "balance",
            StatementKind::CashFlow => "cashflow",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single cell of a statement: an observed number or an explicit absence.
///
/// Absence and zero are different things here. Both become 0.0 once a ratio
/// is computed, but provenance reporting needs to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LineItemValue {
    Value(f64),
    #[default]
    Missing,
}

impl LineItemValue {
    /// NaN is folded into `Missing`; infinities are kept as observed values
    /// and left for the divide guard to reject.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            LineItemValue::Missing
        } else {
            LineItemValue::Value(value)
        }
    }

    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(LineItemValue::Missing, Self::from_f64)
    }

    /// Convert a raw JSON cell. Anything that is not a usable number is `Missing`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(LineItemValue::Missing, Self::from_f64),
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Bool(_)
            | serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => LineItemValue::Missing,
        }
    }

    /// Parse a textual cell such as `"1,234.5"`, `"NaN"` or `"None"`.
    pub fn parse(raw: &str) -> Self {
        let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
        match cleaned.to_ascii_lowercase().as_str() {
            "" | "nan" | "none" | "null" | "-" | "n/a" => LineItemValue::Missing,
            _ => cleaned
                .parse::<f64>()
                .map_or(LineItemValue::Missing, Self::from_f64),
        }
    }

    pub fn as_option(&self) -> Option<f64> {
        match self {
            LineItemValue::Value(v) => Some(*v),
            LineItemValue::Missing => None,
        }
    }

    pub fn is_observed(&self) -> bool {
        matches!(self, LineItemValue::Value(_))
    }

    pub fn or_zero(&self) -> f64 {
        self.as_option().unwrap_or(0.0)
    }
}

impl From<f64> for LineItemValue {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<Option<f64>> for LineItemValue {
    fn from(value: Option<f64>) -> Self {
        Self::from_option(value)
    }
}

/// The three statements for one entity, most recent period first
#[derive(Debug, Clone)]
pub struct StatementSet {
    pub income: RawStatement,
    pub balance: RawStatement,
    pub cashflow: RawStatement,
}

impl StatementSet {
    pub fn new(income: RawStatement, balance: RawStatement, cashflow: RawStatement) -> Self {
        Self {
            income,
            balance,
            cashflow,
        }
    }

    pub fn get(&self, kind: StatementKind) -> &RawStatement {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Balance => &self.balance,
            StatementKind::CashFlow => &self.cashflow,
        }
    }
}

/// Fixed ratio vocabulary fed to the dividend classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RatioName {
    Dpr,
    Roe,
    Roa,
    GProf,
    Npm,
    FcfOcf,
    CashDebt,
    CashLt,
    OcfLct,
    TotDebtInvCap,
    DeRatio,
    DebtEbitda,
    IntCovRatio,
    CurrRatio,
    CashRatio,
    QuickRatio,
}

impl RatioName {
    /// Model input order. Classifiers were trained on columns in this order.
    pub const ALL: [RatioName; 16] = [
        RatioName::Dpr,
        RatioName::Roe,
        RatioName::Roa,
        RatioName::GProf,
        RatioName::Npm,
        RatioName::FcfOcf,
        RatioName::CashDebt,
        RatioName::CashLt,
        RatioName::OcfLct,
        RatioName::TotDebtInvCap,
        RatioName::DeRatio,
        RatioName::DebtEbitda,
        RatioName::IntCovRatio,
        RatioName::CurrRatio,
        RatioName::CashRatio,
        RatioName::QuickRatio,
    ];

    /// Column name as the trained models know it
    pub fn as_str(&self) -> &'static str {
        match self {
            RatioName::Dpr => "dpr",
            RatioName::Roe => "roe",
            RatioName::Roa => "roa",
            RatioName::GProf => "GProf",
            RatioName::Npm => "npm",
            RatioName::FcfOcf => "fcf_ocf",
            RatioName::CashDebt => "cash_debt",
            RatioName::CashLt => "cash_lt",
            RatioName::OcfLct => "ocf_lct",
            RatioName::TotDebtInvCap => "totdebt_invcap",
            RatioName::DeRatio => "de_ratio",
            RatioName::DebtEbitda => "debt_ebitda",
            RatioName::IntCovRatio => "intcov_ratio",
            RatioName::CurrRatio => "curr_ratio",
            RatioName::CashRatio => "cash_ratio",
            RatioName::QuickRatio => "quick_ratio",
        }
    }
}

impl fmt::Display for RatioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatioName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RatioName::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown ratio '{}'", s))
    }
}

impl Serialize for RatioName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Ordered ratio-name → value record handed to a classifier.
///
/// Every value is finite. The only way to build one is [`RatioRecord::sanitized`],
/// which zeroes non-finite inputs and reports which names it touched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatioRecord {
    entries: Vec<(RatioName, f64)>,
}

impl RatioRecord {
    /// Build a record, replacing NaN and infinities with 0.0.
    ///
    /// Returns the record and the names whose values were replaced. A name
    /// listed twice keeps its first position and last value.
    pub fn sanitized(raw: Vec<(RatioName, f64)>) -> (Self, Vec<RatioName>) {
        let mut entries: Vec<(RatioName, f64)> = Vec::with_capacity(raw.len());
        let mut replaced = Vec::new();

        for (name, value) in raw {
            let value = if value.is_finite() {
                value
            } else {
                replaced.push(name);
                0.0
            };
            match entries.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => entries.push((name, value)),
            }
        }

        (Self { entries }, replaced)
    }

    pub fn get(&self, name: RatioName) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Lookup by model column name (e.g. `"GProf"`)
    pub fn get_by_str(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RatioName, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn names(&self) -> Vec<RatioName> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unordered feature map for inference services
    pub fn to_feature_map(&self) -> HashMap<String, f64> {
        self.entries
            .iter()
            .map(|(n, v)| (n.as_str().to_string(), *v))
            .collect()
    }
}

impl Serialize for RatioRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

/// Direction of the next dividend change, as the classifiers label it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum DividendChange {
    Decrease,
    NoChange,
    Increase,
}

impl DividendChange {
    pub const ALL: [DividendChange; 3] = [
        DividendChange::Decrease,
        DividendChange::NoChange,
        DividendChange::Increase,
    ];

    pub fn class_label(&self) -> i64 {
        match self {
            DividendChange::Decrease => -1,
            DividendChange::NoChange => 0,
            DividendChange::Increase => 1,
        }
    }

    pub fn from_class_label(label: i64) -> Option<Self> {
        match label {
            -1 => Some(DividendChange::Decrease),
            0 => Some(DividendChange::NoChange),
            1 => Some(DividendChange::Increase),
            _ => None,
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            DividendChange::Decrease => "Decrease",
            DividendChange::NoChange => "No Change",
            DividendChange::Increase => "Increase",
        }
    }
}

impl TryFrom<i64> for DividendChange {
    type Error = String;

    fn try_from(label: i64) -> Result<Self, Self::Error> {
        Self::from_class_label(label).ok_or_else(|| format!("invalid class label {}", label))
    }
}

impl From<DividendChange> for i64 {
    fn from(change: DividendChange) -> Self {
        change.class_label()
    }
}

impl fmt::Display for DividendChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Per-class probabilities, addressed by class rather than array position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub decrease: f64,
    pub no_change: f64,
    pub increase: f64,
}

impl ClassProbabilities {
    pub fn new(decrease: f64, no_change: f64, increase: f64) -> Self {
        Self {
            decrease,
            no_change,
            increase,
        }
    }

    /// Pair a model's class order with its probability vector.
    ///
    /// Returns `None` if lengths differ, a label is outside {-1, 0, 1},
    /// or a class is missing.
    pub fn from_ordered(classes: &[i64], probabilities: &[f64]) -> Option<Self> {
        if classes.len() != probabilities.len() {
            return None;
        }
        let mut slots: [Option<f64>; 3] = [None; 3];
        for (&label, &p) in classes.iter().zip(probabilities) {
            let change = DividendChange::from_class_label(label)?;
            slots[Self::slot(change)] = Some(p);
        }
        Some(Self::new(slots[0]?, slots[1]?, slots[2]?))
    }

    fn slot(change: DividendChange) -> usize {
        match change {
            DividendChange::Decrease => 0,
            DividendChange::NoChange => 1,
            DividendChange::Increase => 2,
        }
    }

    pub fn get(&self, change: DividendChange) -> f64 {
        match change {
            DividendChange::Decrease => self.decrease,
            DividendChange::NoChange => self.no_change,
            DividendChange::Increase => self.increase,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DividendChange, f64)> + '_ {
        DividendChange::ALL.iter().map(move |c| (*c, self.get(*c)))
    }

    pub fn total(&self) -> f64 {
        self.decrease + self.no_change + self.increase
    }

    /// Class with the highest probability; ties resolve toward `Decrease`.
    pub fn most_likely(&self) -> DividendChange {
        let mut best = DividendChange::Decrease;
        for change in DividendChange::ALL {
            if self.get(change) > self.get(best) {
                best = change;
            }
        }
        best
    }
}

/// Industry tag used to pick a sector-specific model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Consumer,
    Financials,
    Energy,
    Other,
}

impl Industry {
    pub const ALL: [Industry; 4] = [
        Industry::Consumer,
        Industry::Financials,
        Industry::Energy,
        Industry::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Industry::Consumer => "consumer",
            Industry::Financials => "financials",
            Industry::Energy => "energy",
            Industry::Other => "other",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Industry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Industry::ALL
            .iter()
            .copied()
            .find(|i| i.key() == wanted)
            .ok_or_else(|| format!("unknown industry '{}'", s))
    }
}

/// Gradient-boosting family the classifier was trained with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    CatBoost,
    XGBoost,
    LightGBM,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::CatBoost, ModelKind::XGBoost, ModelKind::LightGBM];

    pub fn key(&self) -> &'static str {
        match self {
            ModelKind::CatBoost => "catboost",
            ModelKind::XGBoost => "xgboost",
            ModelKind::LightGBM => "lightgbm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::CatBoost => "CatBoost",
            ModelKind::XGBoost => "XGBoost",
            ModelKind::LightGBM => "LightGBM",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ModelKind::ALL
            .iter()
            .copied()
            .find(|m| m.key() == wanted)
            .ok_or_else(|| format!("unknown model '{}'", s))
    }
}
