use serde::{Serialize, Deserialize};

use crate::data::dataset::DataSet;
use crate::error::{NetworkError, Result};
use crate::eval::evaluator::Evaluator;
use crate::loss::mse::MseLoss;
use crate::network::network::Network;

/// Goodness-of-fit statistics for a single-output regressor.
///
/// Degenerate inputs are not guarded: a constant target gives `tss == 0` and
/// an infinite or NaN `r2`, fewer than three items make `rse` NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Residual sum of squares.
    pub rss: f32,
    /// Total sum of squares around the target mean.
    pub tss: f32,
    /// Residual standard error, `sqrt(rss / (n - 2))`.
    pub rse: f32,
    pub r2: f32,
    pub f_stat: f32,
    /// `rss / n`.
    pub mse: f32,
}

impl RegressionMetrics {
    /// Computes the metrics from parallel predictions and targets.
    pub fn from_predictions(predicted: &[f32], targets: &[f32], num_inputs: usize) -> RegressionMetrics {
        let n = targets.len() as f32;
        let target_mean = targets.iter().sum::<f32>() / n;

        let mut mse = MseLoss::new();
        let mut tss = 0.0;
        for (p, t) in predicted.iter().zip(targets) {
            mse.add(&[*p], &[*t]);
            tss += (t - target_mean) * (t - target_mean);
        }

        let rss = mse.squared_sum();
        let rse = (rss / (n - 2.0)).sqrt();
        let r2 = 1.0 - rss / tss;
        let f_stat = ((tss - rss) / num_inputs as f32) / (rss / (n - num_inputs as f32 - 1.0));

        RegressionMetrics { rss, tss, rse, r2, f_stat, mse: mse.mean_squared_sum() }
    }
}

/// Evaluates networks with exactly one output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionEvaluator;

impl Evaluator for RegressionEvaluator {
    type Metrics = RegressionMetrics;

    fn evaluate(&self, network: &mut Network, test_set: &DataSet) -> Result<RegressionMetrics> {
        if network.output().len() != 1 {
            return Err(NetworkError::Misuse(format!(
                "regression evaluation needs a single output, network has {}",
                network.output().len()
            )));
        }
        if test_set.is_empty() {
            return Err(NetworkError::Misuse("cannot evaluate on an empty data set".into()));
        }

        let mut predicted = Vec::with_capacity(test_set.len());
        let mut targets = Vec::with_capacity(test_set.len());
        for item in test_set {
            predicted.push(network.predict(item.input())?[0]);
            targets.push(item.target()[0]);
        }
        Ok(RegressionMetrics::from_predictions(&predicted, &targets, test_set.input_len()))
    }
}
