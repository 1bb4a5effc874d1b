use serde::{Serialize, Deserialize};

use crate::optim::{momentum::momentum, sgd::sgd};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerType {
    #[default]
    Sgd,
    Momentum,
}

/// The per-step hyperparameters every parameterized layer needs during
/// `backward()` and `apply_weight_changes()`.
///
/// Built by the trainer from its configuration and applied uniformly to every
/// weight and bias in the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningSettings {
    pub learning_rate: f32,
    pub momentum: f32,
    pub optimizer: OptimizerType,
    pub batch_mode: bool,
    pub batch_size: usize,
}

impl LearningSettings {
    /// Weight delta for one parameter given its gradient and previous delta.
    #[inline]
    pub fn delta(&self, gradient: f32, prior_delta: f32) -> f32 {
        match self.optimizer {
            OptimizerType::Sgd => sgd(self.learning_rate, gradient),
            OptimizerType::Momentum => momentum(self.learning_rate, gradient, prior_delta, self.momentum),
        }
    }
}

impl Default for LearningSettings {
    fn default() -> Self {
        LearningSettings {
            learning_rate: 0.01,
            momentum: 0.0,
            optimizer: OptimizerType::Sgd,
            batch_mode: false,
            batch_size: 1,
        }
    }
}
