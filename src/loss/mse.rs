use serde::{Serialize, Deserialize};

/// Running mean-squared-error accumulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MseLoss {
    squared_sum: f32,
    patterns: usize,
}

impl MseLoss {
    pub fn new() -> MseLoss {
        MseLoss::default()
    }

    /// Adds one pattern and returns its per-output error `predicted - expected`.
    pub fn add_pattern_error(&mut self, predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        let errors: Vec<f32> = predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect();
        self.squared_sum += errors.iter().map(|e| e * e).sum::<f32>();
        self.patterns += 1;
        errors
    }

    /// Adds one pattern without producing the error vector.
    pub fn add(&mut self, predicted: &[f32], expected: &[f32]) {
        self.squared_sum += predicted.iter().zip(expected.iter())
            .map(|(p, e)| (p - e) * (p - e))
            .sum::<f32>();
        self.patterns += 1;
    }

    /// Σ(predicted - expected)² over every pattern so far.
    pub fn squared_sum(&self) -> f32 {
        self.squared_sum
    }

    /// `squared_sum / patterns`.
    pub fn mean_squared_sum(&self) -> f32 {
        self.squared_sum / self.patterns as f32
    }

    /// The minimized objective, `½ · squared_sum / patterns`.
    ///
    /// The ½ makes `predicted - expected` its exact gradient.
    pub fn total(&self) -> f32 {
        0.5 * self.squared_sum / self.patterns as f32
    }

    pub fn patterns(&self) -> usize {
        self.patterns
    }

    pub fn reset(&mut self) {
        self.squared_sum = 0.0;
        self.patterns = 0;
    }
}
