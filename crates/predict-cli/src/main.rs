//! predict-cli: compute dividend ratios for a ticker and run a dividend-change classifier.
//!
//! Statements are read from `{data}/{TICKER}/{income,balance,cashflow}.json`,
//! models from `{models}/{model}_model_{industry}.json` (or the service at
//! `DIVIDEND_CLASSIFIER_URL`).
//!
//! Usage:
//!   cargo run -p predict-cli -- --ticker KO --industry consumer --model catboost
//!   cargo run -p predict-cli -- --ticker XOM --industry energy --model xgboost --json
//!   cargo run -p predict-cli -- --ticker JPM --industry financials --model lightgbm --ratios-only

use anyhow::Context;
use dividend_classifier::{ClassifierConfig, ClassifierRegistry};
use dividend_predictor::{DividendPredictor, JsonFileSource, PredictionOutcome, PredictionRequest};
use ratio_features::{FeatureConfig, RatioBuilder, RatioReport};
use statement_core::{Industry, ModelKind, RatioRecord};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq)]
struct Options {
    ticker: String,
    industry: Industry,
    model: ModelKind,
    data_dir: PathBuf,
    models_dir: Option<PathBuf>,
    ratios_only: bool,
    json: bool,
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let ticker = flag_value(args, "--ticker").context("--ticker is required")?;
    let industry = flag_value(args, "--industry")
        .context("--industry is required")?
        .parse::<Industry>()
        .map_err(anyhow::Error::msg)?;
    let model = flag_value(args, "--model")
        .context("--model is required")?
        .parse::<ModelKind>()
        .map_err(anyhow::Error::msg)?;

    Ok(Options {
        ticker: ticker.trim().to_uppercase(),
        industry,
        model,
        data_dir: PathBuf::from(flag_value(args, "--data").unwrap_or(DEFAULT_DATA_DIR)),
        models_dir: flag_value(args, "--models").map(PathBuf::from),
        ratios_only: args.iter().any(|a| a == "--ratios-only"),
        json: args.iter().any(|a| a == "--json"),
    })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  predict-cli --ticker SYMBOL --industry INDUSTRY --model MODEL [options]");
    eprintln!();
    eprintln!("  INDUSTRY   consumer | financials | energy | other");
    eprintln!("  MODEL      catboost | xgboost | lightgbm");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --data DIR       Statement directory (default: {})", DEFAULT_DATA_DIR);
    eprintln!("  --models DIR     Model directory (default: $DIVIDEND_MODELS_DIR or ./models)");
    eprintln!("  --ratios-only    Print the ratio table without running a classifier");
    eprintln!("  --json           Print JSON instead of a table");
}

fn print_ratios(record: &RatioRecord) {
    println!("{:<16} {:>14}", "Ratio", "Value");
    println!("{}", "-".repeat(31));
    for (name, value) in record.iter() {
        println!("{:<16} {:>14.4}", name.as_str(), value);
    }
}

fn print_report(ticker: &str, report: &RatioReport) {
    println!("{} ({} ratios, coverage {:.0}%)", ticker, report.ratio_set.key(), report.coverage * 100.0);
    print_ratios(&report.record);
    for note in report.advisories() {
        println!("note: {}", note);
    }
}

fn print_outcome(outcome: &PredictionOutcome) {
    println!(
        "{} [{} / {}] coverage {:.0}%",
        outcome.ticker,
        outcome.industry,
        outcome.model,
        outcome.coverage * 100.0
    );
    print_ratios(&outcome.ratios);
    println!();
    println!("Predicted dividend change: {}", outcome.label_text());
    for (change, p) in outcome.probabilities.iter() {
        println!("  {:<10} {:>6.1}%", change.to_label(), p * 100.0);
    }
    for note in &outcome.advisories {
        println!("note: {}", note);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "predict_cli=info,dividend_predictor=info,ratio_features=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    let feature_config = FeatureConfig::from_env().context("invalid feature configuration")?;
    let mut classifier_config = ClassifierConfig::default();
    if let Some(dir) = &options.models_dir {
        classifier_config = classifier_config.with_models_dir(dir);
    }

    let source = JsonFileSource::new(&options.data_dir).with_catalog(feature_config.catalog.clone());
    let predictor = DividendPredictor::new(
        RatioBuilder::new(feature_config),
        Arc::new(ClassifierRegistry::new(classifier_config)),
    )
    .with_source(Arc::new(source));

    tracing::info!(
        "predict-cli: {} industry={} model={} data={}",
        options.ticker,
        options.industry,
        options.model,
        options.data_dir.display()
    );

    let request = PredictionRequest::new(&options.ticker, options.industry, options.model);

    let result = async {
        let statements = predictor.fetch(&request.ticker).await?;
        if options.ratios_only {
            let report = predictor.ratios(&statements)?;
            if options.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&request.ticker, &report);
            }
        } else {
            let outcome = predictor.predict(&request, &statements).await?;
            if options.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = result {
        if let Some(err) = e.downcast_ref::<dividend_predictor::PredictionError>() {
            if err.is_missing_data() {
                eprintln!("{}", err);
                std::process::exit(2);
            }
        }
        return Err(e.context(format!("prediction failed for {}", request.ticker)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        std::iter::once("predict-cli")
            .chain(line.split_whitespace())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_full_command_line() {
        let options = parse_args(&args(
            "--ticker ko --industry Consumer --model catboost --data /tmp/d --models /tmp/m --json",
        ))
        .unwrap();

        assert_eq!(options.ticker, "KO");
        assert_eq!(options.industry, Industry::Consumer);
        assert_eq!(options.model, ModelKind::CatBoost);
        assert_eq!(options.data_dir, PathBuf::from("/tmp/d"));
        assert_eq!(options.models_dir, Some(PathBuf::from("/tmp/m")));
        assert!(options.json);
        assert!(!options.ratios_only);
    }

    #[test]
    fn test_defaults_and_errors() {
        let options = parse_args(&args("--ticker XOM --industry energy --model lightgbm --ratios-only")).unwrap();
        assert_eq!(options.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(options.models_dir, None);
        assert!(options.ratios_only);

        assert!(parse_args(&args("--industry energy --model lightgbm")).is_err());
        assert!(parse_args(&args("--ticker XOM --industry mining --model lightgbm")).is_err());
        assert!(parse_args(&args("--ticker XOM --industry energy --model forest")).is_err());
    }
}
