//! Persistence for trained models.
//!
//! Models are stored as JSON. A missing file is reported as
//! [`ClassifierError::ModelNotFound`] so callers can decide whether to
//! bootstrap a model from the fallback corpus.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{fallback_corpus, train, ClassifierError, Result, TrainedModel};

/// File name of the persisted model inside the data directory.
pub const MODEL_FILE_NAME: &str = "classifier_model.json";

/// Reads and writes a [`TrainedModel`] at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    /// Creates a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the platform data directory, or the current
    /// directory if none can be determined.
    pub fn at_default_location() -> Self {
        Self::new(crate::config::data_dir().join(MODEL_FILE_NAME))
    }

    /// Path of the persisted model.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted model.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ModelNotFound`] if nothing has been saved
    /// at this path yet, an I/O or serialization error if the file cannot
    /// be read, or [`ClassifierError::InvalidModel`] if it parses but is not
    /// a usable model.
    pub fn load(&self) -> Result<TrainedModel> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ClassifierError::ModelNotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let model: TrainedModel = serde_json::from_slice(&bytes)?;
        model.validate()?;
        Ok(model)
    }

    /// Saves `model`, creating parent directories as needed.
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(model)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Loads the persisted model, training and saving one from the fallback
    /// corpus if none exists yet.
    ///
    /// # Errors
    ///
    /// Errors other than a missing model are returned unchanged.
    pub fn load_or_bootstrap(&self) -> Result<TrainedModel> {
        match self.load() {
            Ok(model) => Ok(model),
            Err(ClassifierError::ModelNotFound(path)) => {
                tracing::info!(path = %path.display(), "no persisted model, training fallback model");
                let model = train(&fallback_corpus())?;
                self.save(&model)?;
                Ok(model)
            }
            Err(e) => Err(e),
        }
    }

    /// Retrains from the fallback corpus and overwrites the persisted model.
    pub fn rebuild_default(&self) -> Result<TrainedModel> {
        let model = train(&fallback_corpus())?;
        self.save(&model)?;
        tracing::info!(path = %self.path.display(), "saved fallback model");
        Ok(model)
    }
}
