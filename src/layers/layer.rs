use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};
use std::fmt;

use crate::error::{NetworkError, Result};
use crate::exec::workers::WorkerPool;
use crate::layers::convolutional::ConvolutionalLayer;
use crate::layers::dense::FullyConnectedLayer;
use crate::layers::input::InputLayer;
use crate::layers::max_pooling::MaxPoolingLayer;
use crate::layers::output::OutputLayer;
use crate::math::tensor::Tensor;
use crate::optim::optimizer::LearningSettings;

/// Output shape of a layer.  `height` maps to tensor rows, `width` to columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Shape {
    pub fn new(width: usize, height: usize, depth: usize) -> Shape {
        Shape { width, height, depth }
    }

    pub fn len(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

/// Lifecycle shared by every layer kind.
///
/// A network drives each layer through `init` once, then repeatedly
/// `forward` (front to back), `backward` (back to front) and
/// `apply_weight_changes`.  A layer never owns its input: `forward` and
/// `backward` receive the predecessor's `outputs`, and `backward` receives
/// the successor, whose `backward` has already completed.
pub trait Layer {
    /// Output shape; valid once the layer is initialized.
    fn shape(&self) -> Shape;

    fn outputs(&self) -> &Tensor;

    fn deltas(&self) -> &Tensor;

    /// Allocates buffers from this layer's configuration and the
    /// predecessor's already-initialized shape.
    fn init(&mut self, prev: Option<&NetworkLayer>, rng: &mut ChaCha8Rng) -> Result<()>;

    fn forward(&mut self, input: &Tensor, workers: &WorkerPool) -> Result<()>;

    fn backward(
        &mut self,
        input: &Tensor,
        next: Option<&NetworkLayer>,
        settings: &LearningSettings,
    ) -> Result<()>;

    fn apply_weight_changes(&mut self, settings: &LearningSettings);

    /// Checks a restored layer: every buffer must match this layer's
    /// configuration and the predecessor's shape, as `init` would have
    /// allocated them.
    fn validate(&self, prev: Option<&NetworkLayer>) -> Result<()>;

    /// All weights, flattened in storage order.  Empty for layers without weights.
    fn weights(&self) -> Vec<f32> {
        Vec::new()
    }

    fn set_weights(&mut self, values: &[f32]) -> Result<()> {
        expect_no_parameters(values)
    }

    /// The most recent per-weight gradient, same order as `weights()`.
    fn gradients(&self) -> Vec<f32> {
        Vec::new()
    }

    fn biases(&self) -> &[f32] {
        &[]
    }

    fn set_biases(&mut self, values: &[f32]) -> Result<()> {
        expect_no_parameters(values)
    }
}

/// Fails unless `tensor` is `rows × cols × depth`.
pub(crate) fn expect_dims(what: &str, tensor: &Tensor, rows: usize, cols: usize, depth: usize) -> Result<()> {
    if (tensor.rows(), tensor.cols(), tensor.depth()) != (rows, cols, depth) {
        return Err(NetworkError::Architecture(format!(
            "{what} is {}x{}x{}, expected {rows}x{cols}x{depth}",
            tensor.rows(),
            tensor.cols(),
            tensor.depth()
        )));
    }
    Ok(())
}

pub(crate) fn expect_len(len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(NetworkError::ShapeMismatch { expected, got: len });
    }
    Ok(())
}

fn expect_no_parameters(values: &[f32]) -> Result<()> {
    if values.is_empty() {
        Ok(())
    } else {
        Err(NetworkError::ShapeMismatch { expected: 0, got: values.len() })
    }
}

/// The closed set of layer kinds a network is made of.
///
/// Backward steps that depend on the kind of their neighbor match on this
/// enum, so every successor kind is handled explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NetworkLayer {
    Input(InputLayer),
    FullyConnected(FullyConnectedLayer),
    Convolutional(ConvolutionalLayer),
    MaxPooling(MaxPoolingLayer),
    Output(OutputLayer),
}

impl NetworkLayer {
    pub fn as_layer(&self) -> &dyn Layer {
        match self {
            NetworkLayer::Input(l) => l,
            NetworkLayer::FullyConnected(l) => l,
            NetworkLayer::Convolutional(l) => l,
            NetworkLayer::MaxPooling(l) => l,
            NetworkLayer::Output(l) => l,
        }
    }

    pub fn as_layer_mut(&mut self) -> &mut dyn Layer {
        match self {
            NetworkLayer::Input(l) => l,
            NetworkLayer::FullyConnected(l) => l,
            NetworkLayer::Convolutional(l) => l,
            NetworkLayer::MaxPooling(l) => l,
            NetworkLayer::Output(l) => l,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NetworkLayer::Input(_) => "input",
            NetworkLayer::FullyConnected(_) => "fully_connected",
            NetworkLayer::Convolutional(_) => "convolutional",
            NetworkLayer::MaxPooling(_) => "max_pooling",
            NetworkLayer::Output(_) => "output",
        }
    }

    /// The dense part of fully connected and output layers.
    pub fn as_dense(&self) -> Option<&FullyConnectedLayer> {
        match self {
            NetworkLayer::FullyConnected(l) => Some(l),
            NetworkLayer::Output(l) => Some(l.dense()),
            _ => None,
        }
    }

    pub fn shape(&self) -> Shape {
        self.as_layer().shape()
    }

    pub fn outputs(&self) -> &Tensor {
        self.as_layer().outputs()
    }
}
