use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::loss_type::LossType;
use crate::loss::mse::MseLoss;

/// The loss accumulator a network trains against, chosen from its `LossType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LossFunction {
    Mse(MseLoss),
    CrossEntropy(CrossEntropyLoss),
}

impl LossFunction {
    /// Cross-entropy picks the binary form for Sigmoid outputs.
    pub fn new(loss_type: LossType, output_activation: ActivationFunction) -> LossFunction {
        match loss_type {
            LossType::Mse => LossFunction::Mse(MseLoss::new()),
            LossType::CrossEntropy => LossFunction::CrossEntropy(CrossEntropyLoss::new(
                output_activation == ActivationFunction::Sigmoid,
            )),
        }
    }

    pub fn loss_type(&self) -> LossType {
        match self {
            LossFunction::Mse(_) => LossType::Mse,
            LossFunction::CrossEntropy(_) => LossType::CrossEntropy,
        }
    }

    /// Accumulates one pattern; the returned vector is the output layer's error.
    pub fn add_pattern_error(&mut self, predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        match self {
            LossFunction::Mse(l) => l.add_pattern_error(predicted, expected),
            LossFunction::CrossEntropy(l) => l.add_pattern_error(predicted, expected),
        }
    }

    /// Mean loss over the patterns added since the last reset.
    pub fn total(&self) -> f32 {
        match self {
            LossFunction::Mse(l) => l.total(),
            LossFunction::CrossEntropy(l) => l.total(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            LossFunction::Mse(l) => l.reset(),
            LossFunction::CrossEntropy(l) => l.reset(),
        }
    }
}
