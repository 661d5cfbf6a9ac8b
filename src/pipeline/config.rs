//! Pipeline configuration

use crate::error::Result;
use crate::preprocessing::{DEFAULT_RANDOM_STATE, DEFAULT_TEST_SIZE, TARGET_COLUMN};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Random forest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestSettings {
    /// Number of trees
    pub n_estimators: usize,
    /// Base seed for bootstrap sampling (None = fixed default seed)
    pub random_state: Option<u64>,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_state: None,
        }
    }
}

/// Neural network settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of training rows held out inside `fit`
    pub validation_split: f64,
    /// Adam step size
    pub learning_rate: f64,
    /// Seed for weight initialisation, shuffling and dropout
    pub random_state: Option<u64>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            validation_split: 0.1,
            learning_rate: 0.001,
            random_state: Some(42),
        }
    }
}

/// Where trained models would be saved. Nothing is written to these paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    pub random_forest: PathBuf,
    pub neural_network: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            random_forest: PathBuf::from("models/random_forest_model.pkl"),
            neural_network: PathBuf::from("models/neural_network_model.h5"),
        }
    }
}

/// Configuration for a full pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV file with a header row
    pub dataset_path: PathBuf,
    /// Label column name
    pub target_column: String,
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed for the train/test shuffle
    pub random_state: u64,
    pub forest: ForestSettings,
    pub network: NetworkSettings,
    pub model_paths: ModelPaths,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/sample_dataset.csv"),
            target_column: TARGET_COLUMN.to_string(),
            test_size: DEFAULT_TEST_SIZE,
            random_state: DEFAULT_RANDOM_STATE,
            forest: ForestSettings::default(),
            network: NetworkSettings::default(),
            model_paths: ModelPaths::default(),
        }
    }
}

impl PipelineConfig {
    /// Builder method to set the dataset path
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    /// Builder method to set the label column
    pub fn with_target_column(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    /// Builder method to set the split seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to set the network epochs
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.network.epochs = epochs;
        self
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
