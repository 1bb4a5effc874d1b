use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::exec::workers::WorkerPool;
use crate::layers::layer::{expect_dims, expect_len, Layer, NetworkLayer, Shape};
use crate::math::init;
use crate::math::tensor::{add_slice, div_slice, Tensor};
use crate::optim::optimizer::LearningSettings;

/// Fully connected layer: `outputs = activation(biases + inputsᵀ · weights)`.
///
/// `weights` is `(input_len × width)`; row `i` holds the connections of the
/// `i`-th value of the flattened input, so a 3D predecessor (convolutional or
/// pooling) connects through its channel-major layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullyConnectedLayer {
    width: usize,
    activation: ActivationFunction,
    outputs: Tensor,
    deltas: Tensor,
    weights: Tensor,
    gradients: Tensor,
    delta_weights: Tensor,
    prev_delta_weights: Tensor,
    biases: Vec<f32>,
    delta_biases: Vec<f32>,
    prev_delta_biases: Vec<f32>,
}

impl FullyConnectedLayer {
    pub fn new(width: usize, activation: ActivationFunction) -> FullyConnectedLayer {
        FullyConnectedLayer {
            width,
            activation,
            outputs: Tensor::new(width),
            deltas: Tensor::new(width),
            weights: Tensor::default(),
            gradients: Tensor::default(),
            delta_weights: Tensor::default(),
            prev_delta_weights: Tensor::default(),
            biases: vec![],
            delta_biases: vec![],
            prev_delta_biases: vec![],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    pub fn delta_weights(&self) -> &Tensor {
        &self.delta_weights
    }

    pub fn delta_biases(&self) -> &[f32] {
        &self.delta_biases
    }

    pub(crate) fn deltas_mut(&mut self) -> &mut Tensor {
        &mut self.deltas
    }

    /// Allocates parameters for `input_len` incoming values.
    pub(crate) fn allocate(&mut self, input_len: usize, rng: &mut ChaCha8Rng) -> Result<()> {
        if self.width == 0 {
            return Err(NetworkError::Architecture("fully connected layer has zero width".into()));
        }
        self.outputs = Tensor::new(self.width);
        self.deltas = Tensor::new(self.width);

        self.weights = Tensor::new_2d(input_len, self.width);
        self.gradients = Tensor::new_2d(input_len, self.width);
        self.delta_weights = Tensor::new_2d(input_len, self.width);
        self.prev_delta_weights = Tensor::new_2d(input_len, self.width);
        init::xavier(self.weights.values_mut(), input_len, self.width, rng);

        self.biases = vec![0.0; self.width];
        self.delta_biases = vec![0.0; self.width];
        self.prev_delta_biases = vec![0.0; self.width];
        init::randomize(&mut self.biases, rng);
        Ok(())
    }

    /// Adds this layer's deltas, weighted by the connecting weights, into the
    /// predecessor's (flattened) delta tensor.
    pub(crate) fn propagate_deltas_into(&self, target: &mut Tensor) {
        for i in 0..target.len() {
            let mut sum = 0.0;
            for j in 0..self.width {
                sum += self.deltas.get(j) * self.weights.get_2d(i, j);
            }
            target.add(i, sum);
        }
    }

    /// Turns the current `deltas` into gradients and accumulated weight deltas.
    ///
    /// Online mode clears the accumulators first, so they hold exactly this
    /// item's update; batch mode keeps summing until `apply_weight_changes`.
    pub(crate) fn accumulate_weight_changes(&mut self, input: &Tensor, settings: &LearningSettings) {
        if !settings.batch_mode {
            self.delta_weights.fill(0.0);
            self.delta_biases.iter_mut().for_each(|v| *v = 0.0);
        }

        for d in 0..self.width {
            let delta = self.deltas.get(d);
            for i in 0..input.len() {
                let grad = delta * input.get(i);
                self.gradients.set_2d(i, d, grad);
                let dw = settings.delta(grad, self.prev_delta_weights.get_2d(i, d));
                self.delta_weights.add_2d(i, d, dw);
            }
            self.delta_biases[d] += settings.delta(delta, self.prev_delta_biases[d]);
        }
    }

    /// Multiplies `deltas` element-wise by the activation derivative.
    pub(crate) fn scale_deltas_by_derivative(&mut self) {
        for i in 0..self.width {
            let d = self.activation.derivative(self.outputs.get(i));
            self.deltas.set(i, self.deltas.get(i) * d);
        }
    }
}

/// Flattened input length from a predecessor a dense layer may follow.
fn input_len_of(prev: Option<&NetworkLayer>) -> Result<usize> {
    match prev {
        None | Some(NetworkLayer::Output(_)) => Err(NetworkError::Architecture(
            "fully connected layer needs a non-output predecessor".into(),
        )),
        Some(prev) => Ok(prev.shape().len()),
    }
}

impl Layer for FullyConnectedLayer {
    fn shape(&self) -> Shape {
        Shape::new(self.width, 1, 1)
    }

    fn outputs(&self) -> &Tensor {
        &self.outputs
    }

    fn deltas(&self) -> &Tensor {
        &self.deltas
    }

    fn init(&mut self, prev: Option<&NetworkLayer>, rng: &mut ChaCha8Rng) -> Result<()> {
        self.allocate(input_len_of(prev)?, rng)
    }

    fn validate(&self, prev: Option<&NetworkLayer>) -> Result<()> {
        let input_len = input_len_of(prev)?;
        if self.width == 0 {
            return Err(NetworkError::Architecture("fully connected layer has zero width".into()));
        }
        expect_dims("fully connected outputs", &self.outputs, 1, self.width, 1)?;
        expect_dims("fully connected deltas", &self.deltas, 1, self.width, 1)?;
        for (what, t) in [
            ("weights", &self.weights),
            ("gradients", &self.gradients),
            ("delta weights", &self.delta_weights),
            ("previous delta weights", &self.prev_delta_weights),
        ] {
            expect_dims(what, t, input_len, self.width, 1)?;
        }
        for b in [&self.biases, &self.delta_biases, &self.prev_delta_biases] {
            expect_len(b.len(), self.width)?;
        }
        Ok(())
    }

    fn forward(&mut self, input: &Tensor, _workers: &WorkerPool) -> Result<()> {
        if input.len() != self.weights.rows() {
            return Err(NetworkError::ShapeMismatch {
                expected: self.weights.rows(),
                got: input.len(),
            });
        }
        self.outputs.copy_from(&self.biases);
        for out in 0..self.width {
            let mut sum = 0.0;
            for i in 0..input.len() {
                sum += input.get(i) * self.weights.get_2d(i, out);
            }
            self.outputs.add(out, sum);
        }
        self.activation.apply(&mut self.outputs);
        Ok(())
    }

    fn backward(
        &mut self,
        input: &Tensor,
        next: Option<&NetworkLayer>,
        settings: &LearningSettings,
    ) -> Result<()> {
        let next = next.and_then(NetworkLayer::as_dense).ok_or_else(|| {
            NetworkError::Architecture(
                "fully connected layer must be followed by a fully connected or output layer".into(),
            )
        })?;

        self.deltas.fill(0.0);
        next.propagate_deltas_into(&mut self.deltas);
        self.scale_deltas_by_derivative();
        self.accumulate_weight_changes(input, settings);
        Ok(())
    }

    fn apply_weight_changes(&mut self, settings: &LearningSettings) {
        if settings.batch_mode {
            let n = settings.batch_size as f32;
            self.delta_weights.div(n);
            div_slice(&mut self.delta_biases, n);
        }

        self.weights.add_tensor(&self.delta_weights);
        add_slice(&mut self.biases, &self.delta_biases);

        self.prev_delta_weights.set_values(self.delta_weights.values());
        self.prev_delta_biases.copy_from_slice(&self.delta_biases);

        if settings.batch_mode {
            self.delta_weights.fill(0.0);
            self.delta_biases.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    fn weights(&self) -> Vec<f32> {
        self.weights.values().to_vec()
    }

    fn set_weights(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.weights.len() {
            return Err(NetworkError::ShapeMismatch { expected: self.weights.len(), got: values.len() });
        }
        self.weights.set_values(values);
        Ok(())
    }

    fn gradients(&self) -> Vec<f32> {
        self.gradients.values().to_vec()
    }

    fn biases(&self) -> &[f32] {
        &self.biases
    }

    fn set_biases(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.biases.len() {
            return Err(NetworkError::ShapeMismatch { expected: self.biases.len(), got: values.len() });
        }
        self.biases.copy_from_slice(values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::init::seeded_rng;
    use approx::assert_abs_diff_eq;

    fn layer_with(weights: &[f32], biases: &[f32], width: usize, act: ActivationFunction) -> FullyConnectedLayer {
        let mut layer = FullyConnectedLayer::new(width, act);
        layer.allocate(weights.len() / width, &mut seeded_rng(Some(1))).unwrap();
        layer.set_weights(weights).unwrap();
        layer.set_biases(biases).unwrap();
        layer
    }

    #[test]
    fn forward_is_biased_weighted_sum() {
        // weights rows are inputs: w(0,0)=1 w(0,1)=2 w(1,0)=3 w(1,1)=4
        let mut layer = layer_with(&[1.0, 2.0, 3.0, 4.0], &[0.5, -1.0], 2, ActivationFunction::Linear);
        layer.forward(&Tensor::from_values(&[1.0, 2.0]), &WorkerPool::inline()).unwrap();
        assert_abs_diff_eq!(layer.outputs().get(0), 0.5 + 1.0 + 6.0);
        assert_abs_diff_eq!(layer.outputs().get(1), -1.0 + 2.0 + 8.0);
    }

    #[test]
    fn forward_rejects_wrong_input_length() {
        let mut layer = layer_with(&[1.0, 2.0], &[0.0], 1, ActivationFunction::Linear);
        let result = layer.forward(&Tensor::new(3), &WorkerPool::inline());
        assert!(matches!(result, Err(NetworkError::ShapeMismatch { expected: 2, got: 3 })));
    }

    #[test]
    fn validate_checks_weights_against_predecessor() {
        let input = NetworkLayer::Input(crate::layers::input::InputLayer::new(2, 1, 1));
        let mut layer = layer_with(&[1.0, 2.0, 3.0, 4.0], &[0.0, 0.0], 2, ActivationFunction::Linear);
        assert!(layer.validate(Some(&input)).is_ok());
        assert!(layer.validate(None).is_err());

        layer.biases.pop();
        assert!(matches!(
            layer.validate(Some(&input)),
            Err(NetworkError::ShapeMismatch { expected: 2, got: 1 })
        ));

        let three_inputs = NetworkLayer::Input(crate::layers::input::InputLayer::new(3, 1, 1));
        let layer = layer_with(&[1.0, 2.0, 3.0, 4.0], &[0.0, 0.0], 2, ActivationFunction::Linear);
        assert!(matches!(layer.validate(Some(&three_inputs)), Err(NetworkError::Architecture(_))));
    }

    #[test]
    fn batch_mode_averages_on_apply() {
        let mut layer = layer_with(&[0.0], &[0.0], 1, ActivationFunction::Linear);
        let settings = LearningSettings { learning_rate: 1.0, batch_mode: true, batch_size: 2, ..Default::default() };
        let input = Tensor::from_values(&[1.0]);
        layer.deltas.set(0, 1.0);
        layer.accumulate_weight_changes(&input, &settings);
        layer.deltas.set(0, 3.0);
        layer.accumulate_weight_changes(&input, &settings);
        assert_abs_diff_eq!(layer.delta_weights().get(0), -4.0);
        layer.apply_weight_changes(&settings);
        assert_abs_diff_eq!(layer.weights()[0], -2.0);
        assert_abs_diff_eq!(layer.delta_weights().get(0), 0.0);
    }
}
