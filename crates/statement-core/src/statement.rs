//! Raw financial statements and orientation normalization.
//!
//! Upstream sources hand over statements either as line items × periods or
//! transposed. A [`RawStatement`] is always stored line items × periods, most
//! recent period first; the orientation of the source table is resolved once,
//! when the statement is built.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::{FeatureError, LineItemValue, StatementKind};

/// Which axis of a source table holds the line items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    ItemsAsRows,
    ItemsAsColumns,
}

/// A statement exactly as the source shaped it: labelled rows, labelled
/// columns, and a row-major cell grid. Short rows are padded with `Missing`.
#[derive(Debug, Clone, Default)]
pub struct StatementTable {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub cells: Vec<Vec<LineItemValue>>,
}

impl StatementTable {
    pub fn new(
        row_labels: Vec<String>,
        column_labels: Vec<String>,
        cells: Vec<Vec<LineItemValue>>,
    ) -> Self {
        Self {
            row_labels,
            column_labels,
            cells,
        }
    }

    /// Parse a nested JSON object `{outer: {inner: cell}}`.
    ///
    /// This is the shape pandas writes with `to_json()`: outer keys are the
    /// frame's columns and inner keys its index. An empty object or array is
    /// an empty table.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, FeatureError> {
        let outer = match value {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Array(items) if items.is_empty() => return Ok(Self::default()),
            serde_json::Value::Null => return Ok(Self::default()),
            other => {
                return Err(FeatureError::InvalidStatement(format!(
                    "expected a nested object, found {}",
                    json_type_name(other)
                )))
            }
        };

        let mut row_labels: Vec<String> = Vec::new();
        let mut row_index: HashMap<String, usize> = HashMap::new();
        let mut column_labels = Vec::with_capacity(outer.len());
        let mut columns: Vec<&serde_json::Map<String, serde_json::Value>> =
            Vec::with_capacity(outer.len());

        for (column, inner) in outer {
            let inner = inner.as_object().ok_or_else(|| {
                FeatureError::InvalidStatement(format!(
                    "column '{}' is {}, expected an object",
                    column,
                    json_type_name(inner)
                ))
            })?;
            for row in inner.keys() {
                if !row_index.contains_key(row) {
                    row_index.insert(row.clone(), row_labels.len());
                    row_labels.push(row.clone());
                }
            }
            column_labels.push(column.clone());
            columns.push(inner);
        }

        let cells = row_labels
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| {
                        col.get(row)
                            .map_or(LineItemValue::Missing, LineItemValue::from_json)
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            row_labels,
            column_labels,
            cells,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, FeatureError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| FeatureError::InvalidStatement(e.to_string()))?;
        Self::from_json(&value)
    }

    fn cell(&self, row: usize, column: usize) -> LineItemValue {
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or_default()
    }

    /// Decide which axis holds line items.
    ///
    /// Date-like labels mark the period axis. Without dates, the axis with
    /// more recognised line-item names wins; ties keep items as rows.
    pub fn detect_orientation(&self, is_line_item: impl Fn(&str) -> bool) -> Orientation {
        if all_periods(&self.column_labels) {
            return Orientation::ItemsAsRows;
        }
        if all_periods(&self.row_labels) {
            return Orientation::ItemsAsColumns;
        }
        let row_hits = self.row_labels.iter().filter(|l| is_line_item(l)).count();
        let column_hits = self.column_labels.iter().filter(|l| is_line_item(l)).count();
        if column_hits > row_hits {
            Orientation::ItemsAsColumns
        } else {
            Orientation::ItemsAsRows
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn all_periods(labels: &[String]) -> bool {
    !labels.is_empty() && labels.iter().all(|l| parse_period_label(l).is_some())
}

/// Parse a reporting-period label.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, ISO/RFC 3339 timestamps and
/// epoch milliseconds (pandas' default JSON date encoding).
pub fn parse_period_label(label: &str) -> Option<NaiveDateTime> {
    let label = label.trim();
    if let Ok(date) = NaiveDate::parse_from_str(label, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(label, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(label) {
        return Some(dt.naive_utc());
    }
    if label.len() >= 9 && label.chars().all(|c| c.is_ascii_digit()) {
        return label
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc());
    }
    None
}

/// Normalized lookup key for a line-item label.
///
/// Lowercases and keeps ASCII alphanumerics only, so "Short Long Term Debt"
/// and "short/long term debt" produce the same key.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// One financial statement, line items × periods, most recent period first
#[derive(Debug, Clone)]
pub struct RawStatement {
    kind: StatementKind,
    periods: Vec<String>,
    line_items: Vec<String>,
    /// `values[item][period]`
    values: Vec<Vec<LineItemValue>>,
    index: HashMap<String, usize>,
    source_orientation: Orientation,
}

impl RawStatement {
    pub fn empty(kind: StatementKind) -> Self {
        Self {
            kind,
            periods: Vec::new(),
            line_items: Vec::new(),
            values: Vec::new(),
            index: HashMap::new(),
            source_orientation: Orientation::ItemsAsRows,
        }
    }

    /// Build from canonical rows: `(line item, values per period)`.
    ///
    /// `periods` must already be most recent first.
    pub fn from_rows(
        kind: StatementKind,
        periods: Vec<String>,
        rows: Vec<(String, Vec<LineItemValue>)>,
    ) -> Self {
        let width = periods.len();
        let mut line_items = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        let mut index = HashMap::with_capacity(rows.len());

        for (label, mut cells) in rows {
            cells.resize(width, LineItemValue::Missing);
            // First occurrence of a normalized key wins
            index.entry(normalize_label(&label)).or_insert(line_items.len());
            line_items.push(label);
            values.push(cells);
        }

        Self {
            kind,
            periods,
            line_items,
            values,
            index,
            source_orientation: Orientation::ItemsAsRows,
        }
    }

    /// Single-period statement, handy for callers holding one quarter.
    pub fn single_period(kind: StatementKind, period: &str, items: &[(&str, f64)]) -> Self {
        let rows = items
            .iter()
            .map(|(label, value)| (label.to_string(), vec![LineItemValue::from_f64(*value)]))
            .collect();
        Self::from_rows(kind, vec![period.to_string()], rows)
    }

    /// Normalize a source table of either orientation.
    ///
    /// `is_line_item` recognises known line-item labels; it only matters when
    /// neither axis carries date labels.
    pub fn from_table(
        kind: StatementKind,
        table: &StatementTable,
        is_line_item: impl Fn(&str) -> bool,
    ) -> Self {
        let orientation = table.detect_orientation(is_line_item);

        let (item_labels, period_labels) = match orientation {
            Orientation::ItemsAsRows => (&table.row_labels, &table.column_labels),
            Orientation::ItemsAsColumns => (&table.column_labels, &table.row_labels),
        };

        let cell = |item: usize, period: usize| match orientation {
            Orientation::ItemsAsRows => table.cell(item, period),
            Orientation::ItemsAsColumns => table.cell(period, item),
        };

        let mut period_order: Vec<usize> = (0..period_labels.len()).collect();
        if all_periods(period_labels) {
            // Most recent first; stable for equal dates
            period_order.sort_by(|a, b| {
                let da = parse_period_label(&period_labels[*a]);
                let db = parse_period_label(&period_labels[*b]);
                db.cmp(&da)
            });
        }

        let periods = period_order
            .iter()
            .map(|&p| period_labels[p].clone())
            .collect();
        let rows = item_labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let cells = period_order.iter().map(|&p| cell(i, p)).collect();
                (label.clone(), cells)
            })
            .collect();

        let mut statement = Self::from_rows(kind, periods, rows);
        statement.source_orientation = orientation;
        tracing::trace!(
            kind = kind.file_stem(),
            ?orientation,
            items = statement.line_items.len(),
            periods = statement.periods.len(),
            "normalized statement table"
        );
        statement
    }

    pub fn from_json_str(
        kind: StatementKind,
        json: &str,
        is_line_item: impl Fn(&str) -> bool,
    ) -> Result<Self, FeatureError> {
        let table = StatementTable::from_json_str(json)?;
        Ok(Self::from_table(kind, &table, is_line_item))
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn line_items(&self) -> &[String] {
        &self.line_items
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn line_item_count(&self) -> usize {
        self.line_items.len()
    }

    /// Zero periods or zero line items
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty() || self.line_items.is_empty()
    }

    pub fn source_orientation(&self) -> Orientation {
        self.source_orientation
    }

    pub fn most_recent_period(&self) -> Option<&str> {
        self.periods.first().map(String::as_str)
    }

    /// Whether a label (after normalization) exists, regardless of its value
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(&normalize_label(label))
    }

    /// Value of a line item in a given period (0 = most recent)
    pub fn value_at(&self, label: &str, period: usize) -> LineItemValue {
        self.index
            .get(&normalize_label(label))
            .and_then(|&i| self.values[i].get(period))
            .copied()
            .unwrap_or_default()
    }

    /// Value of a line item in the most recent period
    pub fn latest(&self, label: &str) -> LineItemValue {
        self.value_at(label, 0)
    }
}
