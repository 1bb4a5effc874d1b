use crate::data::dataset::DataSetItem;
use crate::error::Result;
use crate::network::network::Network;
use crate::optim::optimizer::LearningSettings;

/// Step used for the two-sided finite difference.
pub const EPSILON: f32 = 1e-4;
/// Relative error above which a gradient is considered wrong.
pub const ERROR_THRESHOLD: f32 = 1e-2;

/// Backpropagated and finite-difference gradient of one weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientSample {
    pub layer: usize,
    pub index: usize,
    pub analytic: f32,
    pub numeric: f32,
}

impl GradientSample {
    /// `|analytic - numeric| / max(|analytic|, |numeric|)`, zero when both vanish.
    pub fn relative_error(&self) -> f32 {
        let scale = self.analytic.abs().max(self.numeric.abs());
        if scale == 0.0 {
            return 0.0;
        }
        (self.analytic - self.numeric).abs() / scale
    }

    /// Within `threshold` relative error, or within `abs_tolerance` for
    /// gradients too small for f32 differences to resolve.
    pub fn agrees(&self, threshold: f32, abs_tolerance: f32) -> bool {
        self.relative_error() <= threshold || (self.analytic - self.numeric).abs() <= abs_tolerance
    }
}

/// Compares every weight gradient of `network` for one item against
/// `(E(w + eps) - E(w - eps)) / 2eps`, where `E` is the network's loss total.
///
/// Weights are restored afterwards; the loss accumulator is left reset.
pub fn check_weights(network: &mut Network, item: &DataSetItem, epsilon: f32) -> Result<Vec<GradientSample>> {
    let settings = LearningSettings::default();

    let predicted = network.predict(item.input())?;
    let errors = network.loss_mut().add_pattern_error(&predicted, item.target());
    network.loss_mut().reset();
    network.set_output_error(&errors)?;
    network.backward(&settings)?;

    let mut samples = vec![];
    for layer in 1..network.layers().len() {
        let analytic = network.gradients(layer)?;
        let original = network.weights(layer)?;
        let mut weights = original.clone();

        for index in 0..original.len() {
            weights[index] = original[index] + epsilon;
            network.set_weights(layer, &weights)?;
            let plus = loss_of(network, item)?;

            weights[index] = original[index] - epsilon;
            network.set_weights(layer, &weights)?;
            let minus = loss_of(network, item)?;

            weights[index] = original[index];
            samples.push(GradientSample {
                layer,
                index,
                analytic: analytic[index],
                numeric: (plus - minus) / (2.0 * epsilon),
            });
        }
        network.set_weights(layer, &original)?;
    }
    Ok(samples)
}

fn loss_of(network: &mut Network, item: &DataSetItem) -> Result<f32> {
    let predicted = network.predict(item.input())?;
    let loss = network.loss_mut();
    loss.reset();
    loss.add_pattern_error(&predicted, item.target());
    let total = loss.total();
    loss.reset();
    Ok(total)
}
