use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Immutable configuration for one pipeline run.
///
/// Every stage receives this struct explicitly; nothing reads ambient
/// tuning state. The defaults deliberately trade training time for raw
/// capacity (a 10-layer, 5000-unit network).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seed for parameter initialization and the shuffle buffer.
    pub seed: u64,
    /// Fraction of the nominal train split reserved for validation.
    pub validation_fraction: f64,
    /// Capacity of the bounded shuffle buffer.
    pub shuffle_buffer: usize,
    /// Training mini-batch size.
    pub batch_size: usize,
    /// Number of hidden layers.
    pub hidden_layers: usize,
    /// Units per hidden layer.
    pub hidden_dim: usize,
    /// Output classes.
    pub num_classes: usize,
    /// Full passes over the training data.
    pub epochs: usize,
    /// Adam learning rate.
    pub learning_rate: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            validation_fraction: 0.1,
            shuffle_buffer: 10_000,
            batch_size: 150,
            hidden_layers: 10,
            hidden_dim: 5000,
            num_classes: 10,
            epochs: 10,
            learning_rate: 1e-3,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be positive");
        ensure!(self.shuffle_buffer > 0, "shuffle_buffer must be positive");
        ensure!(self.hidden_dim > 0, "hidden_dim must be positive");
        ensure!(self.num_classes > 1, "num_classes must be at least 2");
        ensure!(self.epochs > 0, "epochs must be positive");
        ensure!(
            (0.0..1.0).contains(&self.validation_fraction),
            "validation_fraction must be in [0, 1), got {}",
            self.validation_fraction
        );
        ensure!(self.learning_rate > 0.0, "learning_rate must be positive");
        Ok(())
    }

    /// Number of examples reserved for validation out of `total` training
    /// examples: floor(fraction * total).
    pub fn validation_count(&self, total: usize) -> usize {
        (total as f64 * self.validation_fraction).floor() as usize
    }
}
