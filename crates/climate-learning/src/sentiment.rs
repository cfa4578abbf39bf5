//! Text sentiment pipeline.
//!
//! Classifies short climate-related statements as positive or negative:
//!
//! 1. [`load_corpus`] reads the positive and negative word lists, labels them
//!    by file and drops blank rows
//! 2. [`train`] cleans the text, makes a stratified split, fits a
//!    [`SentimentModel`] (TF-IDF + logistic regression) and evaluates it
//! 3. [`SentimentModel::predict`] classifies raw text
//!
//! The model owns its vectorizer, so a stored model needs nothing else to
//! classify new text.
//!
//! # Example
//!
//! ```rust,ignore
//! use climate_learning::{LearningConfig, sentiment};
//!
//! let config = LearningConfig::default();
//! let corpus = sentiment::load_corpus(&config)?;
//! let training = sentiment::train(&corpus, &config)?;
//! println!("{}", training.report);
//!
//! sentiment::save(&training.model, &config)?;
//! let model = sentiment::load(&config)?;
//! println!("{}", model.predict("renewable energy is growing")?);
//! ```

use crate::config::LearningConfig;
use crate::error::{LearningError, Result};
use crate::estimators::LogisticRegression;
use crate::evaluation::classification_report;
use crate::store::ModelStore;
use crate::text::{TfidfVectorizer, clean_text};
use crate::types::ClassificationReport;
use climate_processing::ProcessingError;
use climate_processing::preprocess::stratified_split;
use climate_processing::read_csv;
use climate_processing::utils::string_values;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Predicted sentiment of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    /// Numeric label: 0 for negative, 1 for positive.
    pub fn label(&self) -> u8 {
        match self {
            Sentiment::Negative => 0,
            Sentiment::Positive => 1,
        }
    }

    pub fn from_label(label: u8) -> Self {
        if label == 0 {
            Sentiment::Negative
        } else {
            Sentiment::Positive
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Positive => write!(f, "Positive"),
        }
    }
}

/// One labelled statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRow {
    pub text: String,
    /// 1 for positive, 0 for negative.
    pub label: u8,
}

/// Read one word list and label every non-blank row with `label`.
fn read_labelled(path: &Path, text_column: &str, label: u8) -> Result<Vec<CorpusRow>> {
    if !path.exists() {
        return Err(ProcessingError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let df = read_csv(path)?;
    let column = df.column(text_column).map_err(|_| {
        let available: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        LearningError::InvalidData(format!(
            "{} has no '{}' column (found: {})",
            path.display(),
            text_column,
            available.join(", ")
        ))
    })?;

    let texts = string_values(column.as_materialized_series())?;
    Ok(texts
        .into_iter()
        .flatten()
        .filter(|text| !text.trim().is_empty())
        .map(|text| CorpusRow { text, label })
        .collect())
}

/// Load the positive and negative word lists named by `config`.
///
/// Positive rows come first. Null and blank rows are dropped.
///
/// # Errors
///
/// - `NOT_FOUND` if either file is missing
/// - [`LearningError::InvalidData`] if the text column is absent or no
///   usable rows remain
pub fn load_corpus(config: &LearningConfig) -> Result<Vec<CorpusRow>> {
    let mut corpus = read_labelled(&config.positive_path(), &config.text_column, 1)?;
    let positives = corpus.len();
    corpus.extend(read_labelled(
        &config.negative_path(),
        &config.text_column,
        0,
    )?);

    if corpus.is_empty() {
        return Err(LearningError::InvalidData(
            "sentiment corpus is empty".to_string(),
        ));
    }

    info!(
        "Loaded sentiment corpus: {} positive, {} negative",
        positives,
        corpus.len() - positives
    );
    Ok(corpus)
}

/// TF-IDF vectorizer and logistic regression bundled into one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentModel {
    vectorizer: TfidfVectorizer,
    classifier: LogisticRegression,
}

impl SentimentModel {
    /// Fit on already-cleaned `texts` with labels in {0, 1}.
    pub fn fit<S: AsRef<str>>(texts: &[S], labels: &[u8]) -> Result<Self> {
        let mut vectorizer = TfidfVectorizer::new();
        let rows = vectorizer.fit_transform(texts)?;
        let mut classifier = LogisticRegression::new();
        classifier.fit(&rows, labels, vectorizer.n_features())?;
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Classify raw text.
    pub fn predict(&self, text: &str) -> Result<Sentiment> {
        let row = self.vectorize(text)?;
        Ok(Sentiment::from_label(self.classifier.predict(&row)?))
    }

    /// Probability that raw text is positive.
    pub fn predict_proba(&self, text: &str) -> Result<f64> {
        let row = self.vectorize(text)?;
        self.classifier.predict_proba(&row)
    }

    fn vectorize(&self, text: &str) -> Result<Vec<(usize, f64)>> {
        let cleaned = clean_text(text);
        let mut rows = self.vectorizer.transform(&[cleaned])?;
        Ok(rows.pop().unwrap_or_default())
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }
}

/// Result of [`train`].
#[derive(Debug, Clone)]
pub struct SentimentTraining {
    pub model: SentimentModel,
    /// Report on the held-out partition.
    pub report: ClassificationReport,
    /// Held-out accuracy.
    pub accuracy: f64,
}

/// Clean `corpus`, split it stratified by label, fit and evaluate.
///
/// # Errors
///
/// Returns a validation error if either class has fewer than two rows, since
/// the split needs one of each class on both sides.
pub fn train(corpus: &[CorpusRow], config: &LearningConfig) -> Result<SentimentTraining> {
    config.validate()?;

    let texts: Vec<String> = corpus.iter().map(|row| clean_text(&row.text)).collect();
    let labels: Vec<u8> = corpus.iter().map(|row| row.label).collect();
    if labels.iter().any(|&label| label > 1) {
        return Err(LearningError::InvalidData(
            "sentiment labels must be 0 or 1".to_string(),
        ));
    }

    let split = stratified_split(&labels, config.test_size, config.random_seed)?;
    let pick = |rows: &[usize]| -> (Vec<String>, Vec<u8>) {
        rows.iter()
            .map(|&i| (texts[i].clone(), labels[i]))
            .unzip()
    };
    let (train_texts, train_labels) = pick(&split.train);
    let (test_texts, test_labels) = pick(&split.test);

    info!(
        "Training sentiment model on {} statements ({} held out)",
        train_texts.len(),
        test_texts.len()
    );
    let model = SentimentModel::fit(&train_texts, &train_labels)?;

    let predictions = model
        .vectorizer
        .transform(&test_texts)?
        .iter()
        .map(|row| model.classifier.predict(row))
        .collect::<Result<Vec<u8>>>()?;
    let actual: Vec<String> = test_labels.iter().map(u8::to_string).collect();
    let predicted: Vec<String> = predictions.iter().map(u8::to_string).collect();
    let report = classification_report(&actual, &predicted, &["0".to_string(), "1".to_string()])?;

    info!("Sentiment model accuracy: {:.4}", report.accuracy);
    Ok(SentimentTraining {
        accuracy: report.accuracy,
        model,
        report,
    })
}

/// Save `model` under the configured sentiment model name.
pub fn save(model: &SentimentModel, config: &LearningConfig) -> Result<std::path::PathBuf> {
    ModelStore::new(&config.models_dir).save(&config.sentiment_model_name, model)
}

/// Load the model stored under the configured sentiment model name.
pub fn load(config: &LearningConfig) -> Result<SentimentModel> {
    ModelStore::new(&config.models_dir).load(&config.sentiment_model_name)
}
