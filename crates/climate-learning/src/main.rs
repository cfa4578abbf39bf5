//! CLI entry point for climate data exploration, model training and
//! sentiment classification.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use climate_learning::evaluation::{actual_vs_predicted, evaluate_regression};
use climate_learning::{
    LearningConfig, LearningError, ModelKind, ModelSpec, ModelStore, RandomForestParams,
    TrainedModel, sentiment, trainer,
};
use climate_processing::explore::{basic_stats, correlation_matrix, missing_counts};
use climate_processing::{
    ConfigValidationError, DatasetLoader, FeatureStep, ImputeStrategy, PreparedData,
    ProcessingConfig, ProcessingError, SplitSettings, apply_steps, prepare_with_config,
};
use dotenv::dotenv;
use polars::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// CLI-compatible imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImputeStrategy {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use the most frequent non-null value
    MostFrequent,
}

impl From<CliImputeStrategy> for ImputeStrategy {
    fn from(cli: CliImputeStrategy) -> Self {
        match cli {
            CliImputeStrategy::Mean => ImputeStrategy::Mean,
            CliImputeStrategy::Median => ImputeStrategy::Median,
            CliImputeStrategy::MostFrequent => ImputeStrategy::MostFrequent,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Climate data exploration, regression training and sentiment analysis",
    long_about = "Explore a climate dataset, engineer features, train and evaluate \
                  regression models, and classify climate statements by sentiment.\n\n\
                  EXAMPLES:\n  \
                  # Summary statistics and correlations\n  \
                  climate-insights explore --data data/processed_data.csv\n\n  \
                  # Train a random forest with 50 trees\n  \
                  climate-insights train --model \"Random Forest\" --trees 50\n\n  \
                  # Evaluate the saved model on the held-out rows\n  \
                  climate-insights evaluate --model \"Random Forest\"\n\n  \
                  # Classify a statement\n  \
                  climate-insights sentiment predict --text \"solar power is growing\""
)]
struct Args {
    /// Path to the climate dataset (CSV)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Directory where trained models are stored
    #[arg(long, global = true, default_value = "models")]
    models_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs so stdout only carries JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summary statistics, missing values and correlations of the dataset
    Explore,

    /// Apply feature engineering steps and write the result to CSV
    ///
    /// Steps run in this order: impute, interactions, bins, transforms, encode.
    Engineer {
        /// Fill missing numeric values
        #[arg(long, value_enum)]
        impute: Option<CliImputeStrategy>,

        /// One-hot encode categorical columns (including new binned columns)
        #[arg(long)]
        encode: bool,

        /// Add an interaction term, as `a,b`
        #[arg(long = "interact", value_name = "A,B")]
        interactions: Vec<String>,

        /// Bin a numeric column, as `column:bins`
        #[arg(long = "bin", value_name = "COLUMN:BINS")]
        bins: Vec<String>,

        /// Transform a numeric column, as `column:log` or `column:sqrt`
        #[arg(long = "transform", value_name = "COLUMN:KIND")]
        transforms: Vec<String>,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Train a regression model, evaluate it on held-out rows and save it
    Train {
        #[command(flatten)]
        model: ModelArgs,

        /// Number of trees (Random Forest)
        #[arg(long, value_parser = clap::value_parser!(u64).range(10..=100))]
        trees: Option<u64>,

        /// Maximum tree depth (Random Forest)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=20))]
        max_depth: Option<u64>,
    },

    /// Reload a saved model and evaluate it on the same held-out rows
    Evaluate {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Train or use the text sentiment classifier
    Sentiment {
        #[command(subcommand)]
        action: SentimentAction,
    },

    /// List saved models
    Models,
}

#[derive(clap::Args, Debug, Clone)]
struct ModelArgs {
    /// Model type ("Linear Regression" or "Random Forest")
    #[arg(short, long, default_value = "Linear Regression")]
    model: String,

    /// Target column (defaults to avg_max_temp)
    #[arg(short, long)]
    target: Option<String>,

    /// Strategy used to fill missing numeric values before training
    #[arg(long, value_enum, default_value = "mean")]
    impute: CliImputeStrategy,

    /// Seed for the train/test split (evaluate reuses the seed stored with the model)
    #[arg(long, default_value = "42")]
    seed: u64,
}

#[derive(Subcommand, Debug)]
enum SentimentAction {
    /// Train on the positive/negative word lists and save the model
    Train {
        /// Directory containing positive.csv and negative.csv
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Classify a statement with the saved model
    Predict {
        /// Text to classify
        #[arg(long)]
        text: String,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {:#}", error_code(&e), e);
            ExitCode::FAILURE
        }
    }
}

/// Stable error code for an action failure.
fn error_code(error: &anyhow::Error) -> &'static str {
    if let Some(e) = error.downcast_ref::<LearningError>() {
        e.error_code()
    } else if let Some(e) = error.downcast_ref::<ProcessingError>() {
        e.error_code()
    } else if error.is::<ConfigValidationError>() {
        "INVALID_CONFIG"
    } else {
        "ERROR"
    }
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Explore => run_explore(args),
        Command::Engineer {
            impute,
            encode,
            interactions,
            bins,
            transforms,
            output,
        } => {
            let mut steps: Vec<FeatureStep> = Vec::new();
            if let Some(strategy) = impute {
                steps.push(FeatureStep::Impute {
                    strategy: (*strategy).into(),
                });
            }
            for spec in interactions {
                steps.push(format!("interact:{spec}").parse::<FeatureStep>()?);
            }
            for spec in bins {
                steps.push(format!("bin:{spec}").parse::<FeatureStep>()?);
            }
            for spec in transforms {
                steps.push(format!("transform:{spec}").parse::<FeatureStep>()?);
            }
            if *encode {
                steps.push(FeatureStep::Encode);
            }
            run_engineer(args, &steps, output)
        }
        Command::Train {
            model,
            trees,
            max_depth,
        } => run_train(args, model, *trees, *max_depth),
        Command::Evaluate { model } => run_evaluate(args, model),
        Command::Sentiment { action } => match action {
            SentimentAction::Train { data_dir } => run_sentiment_train(args, data_dir.as_deref()),
            SentimentAction::Predict { text } => run_sentiment_predict(args, text),
        },
        Command::Models => run_models(args),
    }
}

fn processing_config(
    args: &Args,
    target: Option<&str>,
    split: Option<SplitSettings>,
) -> Result<ProcessingConfig> {
    let mut builder = ProcessingConfig::builder();
    if let Some(ref path) = args.data {
        builder = builder.data_path(path);
    }
    if let Some(target) = target {
        builder = builder.target_column(target);
    }
    if let Some(split) = split {
        builder = builder.test_size(split.test_size).random_seed(split.seed);
    }
    Ok(builder.build()?)
}

fn load_dataset(config: &ProcessingConfig) -> Result<DataFrame> {
    let df = DatasetLoader::new(config).load(None)?;
    info!("Dataset loaded: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

fn run_explore(args: &Args) -> Result<()> {
    let config = processing_config(args, None, None)?;
    let df = load_dataset(&config)?;

    let stats = basic_stats(&df)?;
    let missing = missing_counts(&df);
    let correlations = correlation_matrix(&df)?;

    if args.json {
        let report = json!({
            "rows": df.height(),
            "columns": df.width(),
            "stats": stats,
            "missing": missing,
            "correlations": correlations,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("DATASET OVERVIEW");
    println!("{}", "=".repeat(80));
    println!("  File: {}", config.data_path.display());
    println!("  Rows: {}", df.height());
    println!("  Columns: {}", df.width());
    println!();

    println!("SUMMARY STATISTICS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Column", "Count", "Mean", "Std", "Min", "Median", "Max"
    );
    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
    for s in &stats {
        println!(
            "{:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10}",
            truncate_str(&s.column, 19),
            s.count,
            fmt(s.mean),
            fmt(s.std),
            fmt(s.min),
            fmt(s.median),
            fmt(s.max)
        );
    }
    println!();

    println!("MISSING VALUES");
    println!("{}", "-".repeat(40));
    let with_missing: Vec<_> = missing.iter().filter(|(_, n)| *n > 0).collect();
    if with_missing.is_empty() {
        println!("  No missing values");
    } else {
        for (column, count) in with_missing {
            println!("  {column}: {count}");
        }
    }
    println!();

    println!("CORRELATIONS");
    println!("{}", "-".repeat(40));
    print!("{:<20}", "");
    for column in &correlations.columns {
        print!(" {:>10}", truncate_str(column, 10));
    }
    println!();
    for (column, row) in correlations.columns.iter().zip(&correlations.values) {
        print!("{:<20}", truncate_str(column, 19));
        for value in row {
            print!(" {:>10.3}", value);
        }
        println!();
    }
    println!("{}", "=".repeat(80));
    Ok(())
}

fn run_engineer(args: &Args, steps: &[FeatureStep], output: &Path) -> Result<()> {
    if steps.is_empty() {
        return Err(anyhow!(
            "no feature steps given (use --impute, --encode, --interact, --bin or --transform)"
        ));
    }

    let config = processing_config(args, None, None)?;
    let df = load_dataset(&config)?;
    let mut engineered = apply_steps(&df, steps)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(output)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut engineered)?;
    info!("Wrote engineered dataset to {}", output.display());

    if args.json {
        let report = json!({
            "output": output.display().to_string(),
            "steps": steps,
            "rows": engineered.height(),
            "columns": engineered
                .get_column_names()
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Wrote {} rows x {} columns to {}",
            engineered.height(),
            engineered.width(),
            output.display()
        );
        for step in steps {
            println!("  - {}", step.describe());
        }
    }
    Ok(())
}

/// Load, impute, encode and split the dataset the same way for training and
/// evaluation.
///
/// Without `split`, the configured test size is used with `--seed`.
fn prepare_dataset(
    args: &Args,
    model_args: &ModelArgs,
    split: Option<SplitSettings>,
) -> Result<PreparedData> {
    let split = split.unwrap_or(SplitSettings {
        test_size: ProcessingConfig::default().test_size,
        seed: model_args.seed,
    });
    let config = processing_config(args, model_args.target.as_deref(), Some(split))?;
    let df = load_dataset(&config)?;
    let steps = [
        FeatureStep::Impute {
            strategy: model_args.impute.into(),
        },
        FeatureStep::Encode,
    ];
    let df = apply_steps(&df, &steps)?;
    Ok(prepare_with_config(&df, &config)?)
}

fn run_train(
    args: &Args,
    model_args: &ModelArgs,
    trees: Option<u64>,
    max_depth: Option<u64>,
) -> Result<()> {
    let kind: ModelKind = model_args.model.parse()?;
    let spec = match kind {
        ModelKind::RandomForest => {
            let defaults = RandomForestParams::default();
            ModelSpec::RandomForest(RandomForestParams {
                n_estimators: trees.map_or(defaults.n_estimators, |t| t as usize),
                max_depth: max_depth.map(|d| d as usize),
                random_state: model_args.seed,
                ..defaults
            })
        }
        ModelKind::LinearRegression => ModelSpec::from_kind(kind),
    };

    let prepared = prepare_dataset(args, model_args, None)?;
    let model = trainer::train_prepared(&prepared, &spec)?;
    let (predictions, metrics) = evaluate_regression(&model, &prepared.x_test, &prepared.y_test)?;

    // Only a fully trained and evaluated model replaces the stored one.
    let store = ModelStore::new(&args.models_dir);
    let path = store.save(kind.artifact_name(), &model)?;

    if args.json {
        let report = json!({
            "model": kind.to_string(),
            "saved_to": path.display().to_string(),
            "metrics": metrics,
            "hyperparameters": model.hyperparameters,
            "feature_importance": model.feature_importance(),
            "predictions": predictions,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("TRAINING COMPLETE: {}", kind);
    println!("{}", "=".repeat(80));
    println!("  Target: {}", model.target_column);
    println!(
        "  Rows: {} train, {} test",
        prepared.y_train.len(),
        prepared.y_test.len()
    );
    println!("  {}", metrics);
    println!("  Saved to: {}", path.display());
    println!();
    println!("Top features:");
    for (feature, importance) in model.feature_importance().iter().take(10) {
        println!("  {:<30} {:.4}", truncate_str(feature, 29), importance);
    }
    println!("{}", "=".repeat(80));
    Ok(())
}

fn run_evaluate(args: &Args, model_args: &ModelArgs) -> Result<()> {
    let kind: ModelKind = model_args.model.parse()?;
    let store = ModelStore::new(&args.models_dir);
    let model: TrainedModel = store.load(kind.artifact_name())?;

    // Recreate the split the model was trained on.
    let mut model_args = model_args.clone();
    model_args
        .target
        .get_or_insert_with(|| model.target_column.clone());
    if let Some(split) = model.split {
        info!(
            "Holding out the training split: test size {}, seed {}",
            split.test_size, split.seed
        );
    }

    let prepared = prepare_dataset(args, &model_args, model.split)?;
    let (predictions, metrics) = evaluate_regression(&model, &prepared.x_test, &prepared.y_test)?;
    let plot = actual_vs_predicted(&prepared.y_test, &predictions)?;

    if args.json {
        let report = json!({
            "model": kind.to_string(),
            "info": model.info(kind.artifact_name()),
            "metrics": metrics,
            "actual_vs_predicted": plot,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("EVALUATION: {}", kind);
    println!("{}", "=".repeat(80));
    println!("  Trained at: {}", model.trained_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Target: {}", model.target_column);
    println!("  {}", metrics);
    println!();
    println!("{:>12} {:>12}", "Actual", "Predicted");
    for (actual, predicted) in &plot.points {
        println!("{:>12.3} {:>12.3}", actual, predicted);
    }
    println!("{}", "=".repeat(80));
    Ok(())
}

fn learning_config(args: &Args, data_dir: Option<&Path>) -> Result<LearningConfig> {
    let mut builder = LearningConfig::builder().models_dir(&args.models_dir);
    if let Some(dir) = data_dir {
        builder = builder.sentiment_data_dir(dir);
    }
    Ok(builder.build()?)
}

fn run_sentiment_train(args: &Args, data_dir: Option<&Path>) -> Result<()> {
    let config = learning_config(args, data_dir)?;
    let corpus = sentiment::load_corpus(&config)?;
    let training = sentiment::train(&corpus, &config)?;
    let path = sentiment::save(&training.model, &config)?;

    if args.json {
        let report = json!({
            "saved_to": path.display().to_string(),
            "accuracy": training.accuracy,
            "report": training.report,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sentiment model accuracy: {:.4}", training.accuracy);
        println!();
        print!("{}", training.report);
        println!();
        println!("Saved to: {}", path.display());
    }
    Ok(())
}

fn run_sentiment_predict(args: &Args, text: &str) -> Result<()> {
    let config = learning_config(args, None)?;
    let model = sentiment::load(&config)?;
    let label = model.predict(text)?;
    let probability = model.predict_proba(text)?;

    if args.json {
        let report = json!({
            "text": text,
            "sentiment": label.to_string(),
            "positive_probability": probability,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{label} (positive probability {probability:.3})");
    }
    Ok(())
}

fn run_models(args: &Args) -> Result<()> {
    let store = ModelStore::new(&args.models_dir);
    let names = store.list()?;

    let infos: Vec<_> = names
        .iter()
        .map(|name| {
            let info = store
                .load::<TrainedModel>(name)
                .ok()
                .map(|model| model.info(name));
            (name, info)
        })
        .collect();

    if args.json {
        let report: Vec<_> = infos
            .iter()
            .map(|(name, info)| json!({ "name": name, "info": info }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if infos.is_empty() {
        println!("No saved models in {}", store.dir().display());
        return Ok(());
    }
    println!("Saved models in {}:", store.dir().display());
    for (name, info) in infos {
        match info {
            Some(info) => println!(
                "  {:<20} {} -> {} ({} features, trained {})",
                name,
                info.model_type,
                info.target_column,
                info.n_features,
                info.trained_at.format("%Y-%m-%d %H:%M")
            ),
            None => println!("  {name}"),
        }
    }
    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
