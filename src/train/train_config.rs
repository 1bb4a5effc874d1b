use std::sync::mpsc;

use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};
use crate::optim::optimizer::{LearningSettings, OptimizerType};
use crate::train::epoch_stats::EpochStats;

/// Hyperparameters and stopping criteria for a `BackpropagationTrainer` run.
///
/// # Fields
/// - `learning_rate` — step size applied to every gradient
/// - `momentum`      — weight of the previous delta (`Momentum` optimizer only)
/// - `batch_mode`    — accumulate over `batch_size` items before applying
/// - `max_error`     — stop once the epoch loss drops to this value
/// - `max_epochs`    — stop after this many epochs regardless of loss
/// - `shuffle`       — reorder items every epoch with the network's seed
/// - `progress_tx`   — optional channel sender; one `EpochStats` is sent per
///                     completed epoch. If the receiver is dropped the run
///                     stops after the current epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub learning_rate: f32,
    pub momentum: f32,
    pub optimizer: OptimizerType,
    pub batch_mode: bool,
    pub batch_size: usize,
    pub max_error: f32,
    pub max_epochs: usize,
    pub shuffle: bool,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainerConfig {
    pub fn new(learning_rate: f32, max_error: f32, max_epochs: usize) -> TrainerConfig {
        TrainerConfig { learning_rate, max_error, max_epochs, ..Default::default() }
    }

    /// Settings handed to every layer during backward and apply.
    pub fn learning_settings(&self) -> LearningSettings {
        LearningSettings {
            learning_rate: self.learning_rate,
            momentum: self.momentum,
            optimizer: self.optimizer,
            batch_mode: self.batch_mode,
            batch_size: self.batch_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate >= 0.0) {
            return Err(NetworkError::Config(format!(
                "learning rate must be non-negative, got {}",
                self.learning_rate
            )));
        }
        if !(self.momentum >= 0.0) {
            return Err(NetworkError::Config(format!("momentum must be non-negative, got {}", self.momentum)));
        }
        if self.max_epochs == 0 {
            return Err(NetworkError::Config("max_epochs must be at least 1".into()));
        }
        Ok(())
    }

    /// Serializes the config (without the progress channel) to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads and validates a config; missing fields take their defaults.
    pub fn load_json(path: &str) -> Result<TrainerConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainerConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            learning_rate: 0.01,
            momentum: 0.0,
            optimizer: OptimizerType::Sgd,
            batch_mode: false,
            batch_size: 1,
            max_error: 0.03,
            max_epochs: 100_000,
            shuffle: false,
            progress_tx: None,
        }
    }
}
