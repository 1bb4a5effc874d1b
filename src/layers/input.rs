use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};
use crate::exec::workers::WorkerPool;
use crate::layers::layer::{expect_dims, Layer, NetworkLayer, Shape};
use crate::math::tensor::Tensor;
use crate::optim::optimizer::LearningSettings;

/// First layer of every network.  Its outputs *are* the network input:
/// `set_input` writes straight into the tensor the next layer reads.
///
/// Nothing is backpropagated into the input, so `deltas()` is always empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLayer {
    width: usize,
    height: usize,
    depth: usize,
    outputs: Tensor,
    #[serde(skip)]
    deltas: Tensor,
}

impl InputLayer {
    pub fn new(width: usize, height: usize, depth: usize) -> InputLayer {
        InputLayer {
            width,
            height,
            depth,
            outputs: Tensor::new_3d(height, width, depth),
            deltas: Tensor::default(),
        }
    }

    /// Copies `values` (channel-major for 3D inputs) into the input tensor.
    pub fn set_input(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.outputs.len() {
            return Err(NetworkError::ShapeMismatch {
                expected: self.outputs.len(),
                got: values.len(),
            });
        }
        self.outputs.set_values(values);
        Ok(())
    }

    fn check_position(&self, prev: Option<&NetworkLayer>) -> Result<()> {
        if let Some(prev) = prev {
            return Err(NetworkError::Architecture(format!(
                "input layer must be the first layer, found it after a {} layer",
                prev.name()
            )));
        }
        if self.shape().is_empty() {
            return Err(NetworkError::Architecture(format!(
                "input layer has an empty shape {}",
                self.shape()
            )));
        }
        Ok(())
    }
}

impl Layer for InputLayer {
    fn shape(&self) -> Shape {
        Shape::new(self.width, self.height, self.depth)
    }

    fn outputs(&self) -> &Tensor {
        &self.outputs
    }

    fn deltas(&self) -> &Tensor {
        &self.deltas
    }

    fn init(&mut self, prev: Option<&NetworkLayer>, _rng: &mut ChaCha8Rng) -> Result<()> {
        self.check_position(prev)?;
        self.outputs = Tensor::new_3d(self.height, self.width, self.depth);
        Ok(())
    }

    fn validate(&self, prev: Option<&NetworkLayer>) -> Result<()> {
        self.check_position(prev)?;
        expect_dims("input tensor", &self.outputs, self.height, self.width, self.depth)
    }

    fn forward(&mut self, _input: &Tensor, _workers: &WorkerPool) -> Result<()> {
        Err(NetworkError::Misuse("forward() must never be called on an input layer".into()))
    }

    fn backward(
        &mut self,
        _input: &Tensor,
        _next: Option<&NetworkLayer>,
        _settings: &LearningSettings,
    ) -> Result<()> {
        Err(NetworkError::Misuse("backward() must never be called on an input layer".into()))
    }

    fn apply_weight_changes(&mut self, _settings: &LearningSettings) {}
}
