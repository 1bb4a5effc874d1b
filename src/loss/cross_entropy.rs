use serde::{Serialize, Deserialize};

/// Running cross-entropy accumulator.
///
/// With `binary` set (Sigmoid outputs) every output is scored independently:
///   L = -Σ (t·ln p + (1 - t)·ln(1 - p))
/// otherwise the categorical form for Softmax outputs is used:
///   L = -Σ t·ln p
///
/// Both forms have `p - t` as their gradient w.r.t. the pre-activation of the
/// paired output activation.  No epsilon is added inside `ln`; a saturated
/// prediction yields an infinite loss.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossEntropyLoss {
    binary: bool,
    total: f32,
    patterns: usize,
}

impl CrossEntropyLoss {
    pub fn new(binary: bool) -> CrossEntropyLoss {
        CrossEntropyLoss { binary, total: 0.0, patterns: 0 }
    }

    /// Adds one pattern and returns its per-output error `predicted - expected`.
    pub fn add_pattern_error(&mut self, predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        self.total += if self.binary {
            predicted.iter().zip(expected.iter())
                .map(|(p, t)| -(t * p.ln() + (1.0 - t) * (1.0 - p).ln()))
                .sum::<f32>()
        } else {
            predicted.iter().zip(expected.iter())
                .map(|(p, t)| -t * p.ln())
                .sum::<f32>()
        };
        self.patterns += 1;

        predicted.iter().zip(expected.iter())
            .map(|(p, t)| p - t)
            .collect()
    }

    /// Mean loss per pattern.
    pub fn total(&self) -> f32 {
        self.total / self.patterns as f32
    }

    pub fn patterns(&self) -> usize {
        self.patterns
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn reset(&mut self) {
        self.total = 0.0;
        self.patterns = 0;
    }
}
