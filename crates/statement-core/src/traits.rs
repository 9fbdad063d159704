use async_trait::async_trait;
use crate::{FeatureError, StatementSet};

/// Supplier of quarterly statements for a ticker.
///
/// Implementations may return empty or partial statements; rejecting them is
/// the feature builder's job, not the source's.
#[async_trait]
pub trait StatementSource: Send + Sync {
    async fn fetch(&self, ticker: &str) -> Result<StatementSet, FeatureError>;

    fn source_name(&self) -> &'static str;
}
