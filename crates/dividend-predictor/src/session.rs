use statement_core::RatioRecord;

use crate::PredictionOutcome;

/// Per-user interaction context.
///
/// Holds the outcomes produced so far so a follow-up interaction can show the
/// previous ratios and prediction without recomputing them.
#[derive(Debug, Clone, Default)]
pub struct PredictionSession {
    history: Vec<PredictionOutcome>,
}

impl PredictionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: PredictionOutcome) -> &PredictionOutcome {
        self.history.push(outcome);
        &self.history[self.history.len() - 1]
    }

    pub fn last(&self) -> Option<&PredictionOutcome> {
        self.history.last()
    }

    /// Most recent outcome for a ticker, case-insensitive
    pub fn last_for(&self, ticker: &str) -> Option<&PredictionOutcome> {
        self.history
            .iter()
            .rev()
            .find(|o| o.ticker.eq_ignore_ascii_case(ticker.trim()))
    }

    /// Ratios behind the latest prediction
    pub fn last_ratios(&self) -> Option<&RatioRecord> {
        self.last().map(|o| &o.ratios)
    }

    pub fn history(&self) -> &[PredictionOutcome] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
