use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};
use crate::exec::workers::WorkerPool;
use crate::layers::layer::{expect_dims, expect_len, Layer, NetworkLayer, Shape};
use crate::math::tensor::Tensor;
use crate::optim::optimizer::LearningSettings;

/// Downsamples each feature map of the preceding convolutional layer by
/// taking the maximum of every `filter_height × filter_width` window.
///
/// Forward remembers, for every pooled cell, the input `(row, col)` that won
/// so the preceding layer can route the pooled delta to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPoolingLayer {
    filter_width: usize,
    filter_height: usize,
    stride: usize,
    width: usize,
    height: usize,
    depth: usize,
    outputs: Tensor,
    deltas: Tensor,
    /// Winning input position per pooled cell, channel-major like `outputs`.
    max_positions: Vec<(usize, usize)>,
}

impl MaxPoolingLayer {
    pub fn new(filter_width: usize, filter_height: usize, stride: usize) -> MaxPoolingLayer {
        MaxPoolingLayer {
            filter_width,
            filter_height,
            stride,
            width: 0,
            height: 0,
            depth: 0,
            outputs: Tensor::default(),
            deltas: Tensor::default(),
            max_positions: vec![],
        }
    }

    pub fn filter_width(&self) -> usize {
        self.filter_width
    }

    pub fn filter_height(&self) -> usize {
        self.filter_height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Input `(row, col)` that produced the pooled value at `(row, col, ch)`.
    pub fn max_position(&self, row: usize, col: usize, ch: usize) -> (usize, usize) {
        self.max_positions[ch * self.height * self.width + row * self.width + col]
    }

    /// Pooled `(width, height)` for an input of shape `input`.
    fn output_size(&self, input: Shape) -> Result<(usize, usize)> {
        if self.stride == 0 || self.filter_width == 0 || self.filter_height == 0 {
            return Err(NetworkError::Architecture(
                "max pooling layer needs non-zero filter size and stride".into(),
            ));
        }
        if self.filter_width > input.width || self.filter_height > input.height {
            return Err(NetworkError::Architecture(format!(
                "pooling filter {}x{} does not fit its {} input",
                self.filter_width, self.filter_height, input
            )));
        }
        Ok((
            (input.width - self.filter_width) / self.stride + 1,
            (input.height - self.filter_height) / self.stride + 1,
        ))
    }

    pub(crate) fn allocate(&mut self, input: Shape) -> Result<()> {
        (self.width, self.height) = self.output_size(input)?;
        self.depth = input.depth;

        self.outputs = Tensor::new_3d(self.height, self.width, self.depth);
        self.deltas = Tensor::new_3d(self.height, self.width, self.depth);
        self.max_positions = vec![(0, 0); self.height * self.width * self.depth];
        Ok(())
    }

    /// Pools one channel into its output plane and position slice.
    fn forward_channel(
        &self,
        input: &Tensor,
        ch: usize,
        plane: &mut [f32],
        positions: &mut [(usize, usize)],
    ) {
        for out_row in 0..self.height {
            let in_row = out_row * self.stride;
            for out_col in 0..self.width {
                let in_col = out_col * self.stride;

                let mut max = input.get_3d(in_row, in_col, ch);
                let (mut max_row, mut max_col) = (in_row, in_col);
                for fr in 0..self.filter_height {
                    for fc in 0..self.filter_width {
                        let value = input.get_3d(in_row + fr, in_col + fc, ch);
                        if max < value {
                            max = value;
                            max_row = in_row + fr;
                            max_col = in_col + fc;
                        }
                    }
                }

                let idx = out_row * self.width + out_col;
                plane[idx] = max;
                positions[idx] = (max_row, max_col);
            }
        }
    }

    /// Adds each pooled delta to the predecessor delta at the recorded max position.
    pub(crate) fn route_deltas_into(&self, target: &mut Tensor) {
        for ch in 0..self.depth {
            for row in 0..self.height {
                for col in 0..self.width {
                    let (max_row, max_col) = self.max_position(row, col, ch);
                    target.add_3d(max_row, max_col, ch, self.deltas.get_3d(row, col, ch));
                }
            }
        }
    }
}

fn input_shape_of(prev: Option<&NetworkLayer>) -> Result<Shape> {
    match prev {
        Some(NetworkLayer::Convolutional(conv)) => Ok(conv.shape()),
        _ => Err(NetworkError::Architecture(
            "max pooling layer can only follow a convolutional layer".into(),
        )),
    }
}

impl Layer for MaxPoolingLayer {
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
        self.allocate(input_shape_of(prev)?)
    }

    fn validate(&self, prev: Option<&NetworkLayer>) -> Result<()> {
        let input = input_shape_of(prev)?;
        if self.output_size(input)? != (self.width, self.height) || self.depth != input.depth {
            return Err(NetworkError::Architecture(format!(
                "max pooling layer {} does not fit input {input}",
                self.shape()
            )));
        }
        expect_dims("pooling outputs", &self.outputs, self.height, self.width, self.depth)?;
        expect_dims("pooling deltas", &self.deltas, self.height, self.width, self.depth)?;
        expect_len(self.max_positions.len(), self.shape().len())?;
        if let Some(&(row, col)) = self.max_positions.iter().find(|&&(r, c)| r >= input.height || c >= input.width) {
            return Err(NetworkError::Architecture(format!(
                "max position ({row}, {col}) lies outside the {input} input"
            )));
        }
        Ok(())
    }

    fn forward(&mut self, input: &Tensor, workers: &WorkerPool) -> Result<()> {
        if input.depth() != self.depth {
            return Err(NetworkError::ShapeMismatch { expected: self.depth, got: input.depth() });
        }

        // Split so workers can read the configuration while writing outputs.
        let mut outputs = std::mem::take(&mut self.outputs);
        let mut positions = std::mem::take(&mut self.max_positions);
        {
            let this = &*self;
            workers.for_each_channel_pair(this.depth, outputs.values_mut(), &mut positions, |ch, plane, pos| {
                this.forward_channel(input, ch, plane, pos);
            });
        }
        self.outputs = outputs;
        self.max_positions = positions;
        Ok(())
    }

    fn backward(
        &mut self,
        _input: &Tensor,
        next: Option<&NetworkLayer>,
        _settings: &LearningSettings,
    ) -> Result<()> {
        self.deltas.fill(0.0);
        match next {
            Some(NetworkLayer::FullyConnected(dense)) => dense.propagate_deltas_into(&mut self.deltas),
            Some(NetworkLayer::Output(out)) => out.dense().propagate_deltas_into(&mut self.deltas),
            Some(NetworkLayer::Convolutional(conv)) => conv.propagate_deltas_into(&mut self.deltas),
            Some(other @ (NetworkLayer::MaxPooling(_) | NetworkLayer::Input(_))) => {
                return Err(NetworkError::Architecture(format!(
                    "max pooling layer cannot be followed by a {} layer",
                    other.name()
                )));
            }
            None => {
                return Err(NetworkError::Architecture("max pooling layer cannot be the last layer".into()));
            }
        }
        Ok(())
    }

    fn apply_weight_changes(&mut self, _settings: &LearningSettings) {}
}
