use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::exec::workers::WorkerPool;
use crate::layers::dense::FullyConnectedLayer;
use crate::layers::layer::{expect_len, Layer, NetworkLayer, Shape};
use crate::loss::loss_type::LossType;
use crate::math::tensor::Tensor;
use crate::optim::optimizer::LearningSettings;

/// Last layer of every network: a fully connected layer whose deltas come
/// from the loss function's output error instead of a successor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLayer {
    dense: FullyConnectedLayer,
    labels: Vec<String>,
    loss_type: LossType,
    output_errors: Vec<f32>,
}

impl OutputLayer {
    /// Outputs are labeled `Output0`, `Output1`, ...
    pub fn new(width: usize, activation: ActivationFunction) -> OutputLayer {
        let labels = (0..width).map(|i| format!("Output{i}")).collect();
        OutputLayer::with_labels(labels, activation)
    }

    pub fn with_labels(labels: Vec<String>, activation: ActivationFunction) -> OutputLayer {
        OutputLayer {
            dense: FullyConnectedLayer::new(labels.len(), activation),
            output_errors: vec![0.0; labels.len()],
            labels,
            loss_type: LossType::Mse,
        }
    }

    pub fn dense(&self) -> &FullyConnectedLayer {
        &self.dense
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn activation(&self) -> ActivationFunction {
        self.dense.activation()
    }

    pub fn loss_type(&self) -> LossType {
        self.loss_type
    }

    pub fn set_loss_type(&mut self, loss_type: LossType) {
        self.loss_type = loss_type;
    }

    pub fn output_errors(&self) -> &[f32] {
        &self.output_errors
    }

    pub fn set_output_errors(&mut self, errors: &[f32]) -> Result<()> {
        if errors.len() != self.output_errors.len() {
            return Err(NetworkError::ShapeMismatch {
                expected: self.output_errors.len(),
                got: errors.len(),
            });
        }
        self.output_errors.copy_from_slice(errors);
        Ok(())
    }

    /// Converts the output error into deltas for the configured loss.
    fn compute_deltas(&mut self) -> Result<()> {
        let activation = self.dense.activation();
        match (self.loss_type, activation) {
            (LossType::Mse, _) => {
                for (i, err) in self.output_errors.iter().enumerate() {
                    let derivative = activation.derivative(self.dense.outputs().get(i));
                    self.dense.deltas_mut().set(i, err * derivative);
                }
            }
            // The activation derivative cancels against the loss derivative.
            (LossType::CrossEntropy, ActivationFunction::Sigmoid)
            | (LossType::CrossEntropy, ActivationFunction::Softmax) => {
                for (i, err) in self.output_errors.iter().enumerate() {
                    self.dense.deltas_mut().set(i, *err);
                }
            }
            (loss, activation) => {
                return Err(NetworkError::UnsupportedLossPairing { loss, activation });
            }
        }
        Ok(())
    }
}

impl Layer for OutputLayer {
    fn shape(&self) -> Shape {
        self.dense.shape()
    }

    fn outputs(&self) -> &Tensor {
        self.dense.outputs()
    }

    fn deltas(&self) -> &Tensor {
        self.dense.deltas()
    }

    fn init(&mut self, prev: Option<&NetworkLayer>, rng: &mut ChaCha8Rng) -> Result<()> {
        self.dense.init(prev, rng)?;
        self.output_errors = vec![0.0; self.dense.width()];
        Ok(())
    }

    fn validate(&self, prev: Option<&NetworkLayer>) -> Result<()> {
        self.dense.validate(prev)?;
        expect_len(self.labels.len(), self.dense.width())?;
        expect_len(self.output_errors.len(), self.dense.width())
    }

    fn forward(&mut self, input: &Tensor, workers: &WorkerPool) -> Result<()> {
        self.dense.forward(input, workers)
    }

    fn backward(
        &mut self,
        input: &Tensor,
        next: Option<&NetworkLayer>,
        settings: &LearningSettings,
    ) -> Result<()> {
        if let Some(next) = next {
            return Err(NetworkError::Architecture(format!(
                "output layer must be the last layer, found a {} layer after it",
                next.name()
            )));
        }
        self.compute_deltas()?;
        self.dense.accumulate_weight_changes(input, settings);
        Ok(())
    }

    fn apply_weight_changes(&mut self, settings: &LearningSettings) {
        self.dense.apply_weight_changes(settings);
    }

    fn weights(&self) -> Vec<f32> {
        self.dense.weights()
    }

    fn set_weights(&mut self, values: &[f32]) -> Result<()> {
        self.dense.set_weights(values)
    }

    fn gradients(&self) -> Vec<f32> {
        self.dense.gradients()
    }

    fn biases(&self) -> &[f32] {
        self.dense.biases()
    }

    fn set_biases(&mut self, values: &[f32]) -> Result<()> {
        self.dense.set_biases(values)
    }
}
