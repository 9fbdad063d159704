use crate::StatementKind;
use thiserror::Error;

/// One or more input statements had no periods or no line items.
///
/// Fatal to the current prediction, never to the process. Retrying with the
/// same data fails the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("One or more financial statements are unavailable: {}", join_kinds(.statements))]
pub struct MissingDataError {
    pub statements: Vec<StatementKind>,
}

impl MissingDataError {
    pub fn new(statements: Vec<StatementKind>) -> Self {
        Self { statements }
    }

    pub fn contains(&self, kind: StatementKind) -> bool {
        self.statements.contains(&kind)
    }
}

fn join_kinds(kinds: &[StatementKind]) -> String {
    kinds
        .iter()
        .map(|k| k.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error(transparent)]
    MissingData(#[from] MissingDataError),

    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Statement source error: {0}")]
    Source(String),
}
