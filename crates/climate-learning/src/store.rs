//! On-disk store for model artifacts.
//!
//! Each artifact is one JSON file, `{dir}/{name}.json`. Saving the same name
//! again overwrites the previous artifact. The store does no locking;
//! concurrent writers to the same name are not supported.

use crate::error::{LearningError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const EXTENSION: &str = "json";

/// Directory-backed store of named model artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the artifact `name` is stored at.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{EXTENSION}")))
    }

    /// Persist `artifact` under `name`, replacing any previous artifact.
    ///
    /// The artifact is written to a temporary file and renamed into place, so
    /// a failed write leaves the previous artifact intact.
    pub fn save<T: Serialize>(&self, name: &str, artifact: &T) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;

        let tmp_path = self.dir.join(format!(".{name}.{EXTENSION}.tmp"));
        let written = (|| -> Result<()> {
            let mut writer = BufWriter::new(fs::File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, artifact)?;
            writer.flush()?;
            Ok(())
        })();
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, &path)?;

        info!("Saved model '{}' to {}", name, path.display());
        Ok(path)
    }

    /// Load the artifact stored under `name`.
    ///
    /// # Errors
    ///
    /// - [`LearningError::ModelNotFound`] (with the checked path) if nothing
    ///   is stored under `name`
    /// - [`LearningError::Serialization`] if the file is not a valid artifact
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(LearningError::ModelNotFound {
                name: name.to_string(),
                path: path.display().to_string(),
            });
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        let artifact = serde_json::from_reader(reader)?;
        info!("Loaded model '{}' from {}", name, path.display());
        Ok(artifact)
    }

    /// Whether an artifact is stored under `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Names of all stored artifacts, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        debug!("Found {} stored model(s) in {}", names.len(), self.dir.display());
        Ok(names)
    }

    /// Delete the artifact stored under `name`. Returns whether it existed.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!("Removed model '{}'", name);
        Ok(true)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(LearningError::InvalidConfig(format!(
            "invalid model name '{name}': use letters, digits, '_' or '-'"
        )))
    }
}
