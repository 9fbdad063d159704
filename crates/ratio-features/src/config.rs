use statement_core::FeatureError;

use crate::catalog::LineItemCatalog;
use crate::ratios::RatioSet;

pub const RATIO_SET_VAR: &str = "DIVIDEND_RATIO_SET";
pub const ALIASES_PATH_VAR: &str = "DIVIDEND_LINE_ITEM_ALIASES";

/// Feature-building configuration
#[derive(Debug, Clone, Default)]
pub struct FeatureConfig {
    pub ratio_set: RatioSet,
    pub catalog: LineItemCatalog,
}

impl FeatureConfig {
    /// Read `DIVIDEND_RATIO_SET` and `DIVIDEND_LINE_ITEM_ALIASES` from the environment.
    pub fn from_env() -> Result<Self, FeatureError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`FeatureConfig::from_env`] with an injectable variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, FeatureError> {
        let ratio_set = match var(RATIO_SET_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw
                .parse::<RatioSet>()
                .map_err(|e| FeatureError::Config(format!("{}: {}", RATIO_SET_VAR, e)))?,
            _ => RatioSet::default(),
        };

        let mut catalog = LineItemCatalog::default();
        if let Some(path) = var(ALIASES_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            let json = std::fs::read_to_string(&path).map_err(|e| {
                FeatureError::Config(format!("{}: cannot read {}: {}", ALIASES_PATH_VAR, path, e))
            })?;
            catalog.merge_json(&json).map_err(|e| {
                FeatureError::Config(format!("{}: invalid alias table {}: {}", ALIASES_PATH_VAR, path, e))
            })?;
            tracing::info!("Loaded line-item aliases from {}", path);
        }

        Ok(Self { ratio_set, catalog })
    }

    pub fn with_ratio_set(mut self, ratio_set: RatioSet) -> Self {
        self.ratio_set = ratio_set;
        self
    }

    pub fn with_catalog(mut self, catalog: LineItemCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = FeatureConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.ratio_set, RatioSet::Standard);
        assert_eq!(config.catalog, LineItemCatalog::default());
    }

    #[test]
    fn test_ratio_set_from_env() {
        let config = FeatureConfig::from_vars(vars(&[(RATIO_SET_VAR, "compact")])).unwrap();
        assert_eq!(config.ratio_set, RatioSet::Compact);

        let err = FeatureConfig::from_vars(vars(&[(RATIO_SET_VAR, "bogus")])).unwrap_err();
        assert!(matches!(err, FeatureError::Config(_)));
    }

    #[test]
    fn test_alias_file_from_env() {
        let path = std::env::temp_dir().join(format!("ratio-aliases-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"Inventory": ["Inventories"]}"#).unwrap();

        let config =
            FeatureConfig::from_vars(vars(&[(ALIASES_PATH_VAR, path.to_str().unwrap())])).unwrap();
        assert!(config.catalog.recognizes("Inventories"));

        std::fs::write(&path, "not json").unwrap();
        let err = FeatureConfig::from_vars(vars(&[(ALIASES_PATH_VAR, path.to_str().unwrap())]));
        assert!(err.is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_alias_file_is_config_error() {
        let err = FeatureConfig::from_vars(vars(&[(ALIASES_PATH_VAR, "/nonexistent/aliases.json")]))
            .unwrap_err();
        assert!(err.to_string().contains(ALIASES_PATH_VAR));
    }
}
