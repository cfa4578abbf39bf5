//! Dataset loading and the per-path dataset cache.
//!
//! [`DatasetLoader`] reads a CSV file into a [`DataFrame`] and normalises the
//! year column. [`DatasetCache`] is owned by whoever orchestrates a session
//! and guarantees each path is read at most once until it is invalidated.
//!
//! Frames handed out by the cache are clones of the cached frame. Polars
//! columns are reference counted, so a clone shares storage with the cached
//! copy while any modification produces new columns.

use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, Result, ResultExt};
use crate::utils::require_column;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads climate datasets from disk.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    default_path: PathBuf,
    year_column: String,
}

impl DatasetLoader {
    /// Create a loader using the dataset path and year column from `config`.
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            default_path: config.data_path.clone(),
            year_column: config.year_column.clone(),
        }
    }

    /// The path used when no explicit path is supplied.
    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Resolve an optional explicit path against the default.
    pub fn resolve(&self, path: Option<&Path>) -> PathBuf {
        path.map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_path.clone())
    }

    /// Load a dataset, falling back to the default path.
    pub fn load(&self, path: Option<&Path>) -> Result<DataFrame> {
        let path = self.resolve(path);
        self.load_path(&path)
    }

    /// Load the dataset at `path`.
    pub fn load_path(&self, path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(ProcessingError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        info!("Loading dataset from: {}", path.display());
        let df = read_csv(path)?;
        let df = self.normalize_year(df)?;
        info!("Dataset loaded successfully: {:?}", df.shape());
        Ok(df)
    }

    /// Cast the year column to `Int64` when the frame has one.
    fn normalize_year(&self, mut df: DataFrame) -> Result<DataFrame> {
        if df.column(&self.year_column).is_err() {
            debug!("No '{}' column to normalise", self.year_column);
            return Ok(df);
        }

        let series = require_column(&df, &self.year_column)?;
        let casted = series
            .cast(&DataType::Int64)
            .context(format!("Casting '{}' to integer", self.year_column))?;

        if casted.null_count() > series.null_count() {
            return Err(ProcessingError::InvalidData(format!(
                "column '{}' contains values that are not whole years",
                self.year_column
            )));
        }

        df.replace(&self.year_column, casted)?;
        Ok(df)
    }
}

/// Read a headered CSV file with schema inference over the first rows.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .context(format!("Reading CSV file {}", path.display()))
}

/// Session-owned cache of loaded datasets keyed by canonical path.
#[derive(Debug)]
pub struct DatasetCache {
    loader: DatasetLoader,
    entries: HashMap<PathBuf, DataFrame>,
}

impl DatasetCache {
    /// Create an empty cache around `loader`.
    pub fn new(loader: DatasetLoader) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    /// The loader used on cache misses.
    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    /// Return the cached dataset for `path`, loading it on first use.
    ///
    /// `None` selects the loader's default path.
    pub fn get_or_load(&mut self, path: Option<&Path>) -> Result<DataFrame> {
        let requested = self.loader.resolve(path);
        if !requested.exists() {
            return Err(ProcessingError::FileNotFound { path: requested });
        }
        let key = std::fs::canonicalize(&requested)?;

        if let Some(df) = self.entries.get(&key) {
            debug!("Dataset cache hit: {}", key.display());
            return Ok(df.clone());
        }

        let df = self.loader.load_path(&key)?;
        self.entries.insert(key, df.clone());
        Ok(df)
    }

    /// Forget the cached dataset for `path`. Returns whether it was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let removed = self.entries.remove(&key).is_some();
        if removed {
            debug!("Invalidated cached dataset: {}", key.display());
        }
        removed
    }

    /// Whether `path` is currently cached.
    pub fn contains(&self, path: &Path) -> bool {
        std::fs::canonicalize(path)
            .map(|key| self.entries.contains_key(&key))
            .unwrap_or(false)
    }

    /// Drop every cached dataset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached datasets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn loader() -> DatasetLoader {
        DatasetLoader::new(&ProcessingConfig::default())
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let result = loader().load(Some(Path::new("does/not/exist.csv")));
        let err = result.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(err.to_string().contains("does/not/exist.csv"));
    }

    #[test]
    fn test_load_normalises_year_to_integer() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "climate.csv",
            "year,avg_max_temp\n2000.0,21.5\n2001.0,22.1\n",
        );

        let df = loader().load(Some(&path)).unwrap();
        let year = df.column("year").unwrap();
        assert_eq!(year.dtype(), &DataType::Int64);
        assert_eq!(year.get(1).unwrap().try_extract::<i64>().unwrap(), 2001);
    }

    #[test]
    fn test_load_rejects_non_year_values() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "bad.csv", "year,temp\nabc,1.0\n2001,2.0\n");

        let result = loader().load(Some(&path));
        assert!(matches!(result, Err(ProcessingError::InvalidData(_))));
    }

    #[test]
    fn test_load_without_year_column() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "no_year.csv", "temp,rain\n1.0,2.0\n");

        let df = loader().load(Some(&path)).unwrap();
        assert_eq!(df.shape(), (1, 2));
    }

    #[test]
    fn test_cache_loads_once_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "climate.csv", "year,temp\n2000,1.0\n2001,2.0\n");
        let mut cache = DatasetCache::new(loader());

        let first = cache.get_or_load(Some(&path)).unwrap();
        assert_eq!(first.height(), 2);
        assert!(cache.contains(&path));

        // Changing the file is invisible until the entry is invalidated.
        write_csv(&dir, "climate.csv", "year,temp\n2000,1.0\n2001,2.0\n2002,3.0\n");
        assert_eq!(cache.get_or_load(Some(&path)).unwrap().height(), 2);
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));
        assert_eq!(cache.get_or_load(Some(&path)).unwrap().height(), 3);
    }

    #[test]
    fn test_cache_hands_out_independent_frames() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "climate.csv", "year,temp\n2000,1.0\n");
        let mut cache = DatasetCache::new(loader());

        let mut mine = cache.get_or_load(Some(&path)).unwrap();
        mine.drop_in_place("temp").unwrap();

        let again = cache.get_or_load(Some(&path)).unwrap();
        assert!(again.column("temp").is_ok());
    }

    #[test]
    fn test_cache_missing_file() {
        let mut cache = DatasetCache::new(loader());
        let result = cache.get_or_load(Some(Path::new("nope.csv")));
        assert!(matches!(result, Err(ProcessingError::FileNotFound { .. })));
        assert!(cache.is_empty());
    }
}
