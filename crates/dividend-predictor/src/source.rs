use async_trait::async_trait;
use ratio_features::LineItemCatalog;
use statement_core::{FeatureError, RawStatement, StatementKind, StatementSet, StatementSource};
use std::path::{Path, PathBuf};

/// Reads `{root}/{TICKER}/{income,balance,cashflow}.json`.
///
/// Each file is a JSON object of objects in either orientation (periods as
/// outer keys or line items as outer keys). A missing file becomes an empty
/// statement so the feature builder reports it.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    root: PathBuf,
    catalog: LineItemCatalog,
}

impl JsonFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            catalog: LineItemCatalog::default(),
        }
    }

    /// Catalog used to tell line-item labels from period labels
    pub fn with_catalog(mut self, catalog: LineItemCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn statement_path(&self, ticker: &str, kind: StatementKind) -> PathBuf {
        self.root
            .join(ticker.trim().to_uppercase())
            .join(format!("{}.json", kind.file_stem()))
    }

    async fn load(&self, ticker: &str, kind: StatementKind) -> Result<RawStatement, FeatureError> {
        let path = self.statement_path(ticker, kind);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {} for {} at {}", kind, ticker, path.display());
                return Ok(RawStatement::empty(kind));
            }
            Err(e) => {
                return Err(FeatureError::Source(format!("cannot read {}: {}", path.display(), e)));
            }
        };

        let statement = RawStatement::from_json_str(kind, &json, |label| self.catalog.recognizes(label))
            .map_err(|e| FeatureError::Source(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            "Loaded {} for {}: {} periods, {} line items ({:?})",
            kind,
            ticker,
            statement.period_count(),
            statement.line_item_count(),
            statement.source_orientation()
        );
        Ok(statement)
    }
}

#[async_trait]
impl StatementSource for JsonFileSource {
    async fn fetch(&self, ticker: &str) -> Result<StatementSet, FeatureError> {
        let (income, balance, cashflow) = tokio::try_join!(
            self.load(ticker, StatementKind::Income),
            self.load(ticker, StatementKind::Balance),
            self.load(ticker, StatementKind::CashFlow),
        )?;
        Ok(StatementSet::new(income, balance, cashflow))
    }

    fn source_name(&self) -> &'static str {
        "json-files"
    }
}
