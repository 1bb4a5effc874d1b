use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::exec::workers::WorkerPool;
use crate::layers::layer::{expect_dims, expect_len, Layer, NetworkLayer, Shape};
use crate::math::init;
use crate::math::tensor::{add_slice, div_slice, Tensor};
use crate::optim::optimizer::LearningSettings;

/// Bank of `channels` filters correlated across the input.
///
/// Filters are centered on the sampled input position and zero-padded at
/// the borders, so output position `(r, c)` reads input rows
/// `r*stride + fr - center_y` and columns `c*stride + fc - center_x`.
/// Output size per axis is `ceil(input / stride)`, depth is `channels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvolutionalLayer {
    filter_width: usize,
    filter_height: usize,
    filter_depth: usize,
    channels: usize,
    stride: usize,
    activation: ActivationFunction,
    width: usize,
    height: usize,
    outputs: Tensor,
    deltas: Tensor,
    /// One `filter_height × filter_width × filter_depth` tensor per channel.
    filters: Vec<Tensor>,
    filter_gradients: Vec<Tensor>,
    delta_weights: Vec<Tensor>,
    prev_delta_weights: Vec<Tensor>,
    biases: Vec<f32>,
    delta_biases: Vec<f32>,
    prev_delta_biases: Vec<f32>,
}

impl ConvolutionalLayer {
    pub fn new(
        filter_width: usize,
        filter_height: usize,
        channels: usize,
        stride: usize,
        activation: ActivationFunction,
    ) -> ConvolutionalLayer {
        ConvolutionalLayer {
            filter_width,
            filter_height,
            filter_depth: 0,
            channels,
            stride,
            activation,
            width: 0,
            height: 0,
            outputs: Tensor::default(),
            deltas: Tensor::default(),
            filters: vec![],
            filter_gradients: vec![],
            delta_weights: vec![],
            prev_delta_weights: vec![],
            biases: vec![],
            delta_biases: vec![],
            prev_delta_biases: vec![],
        }
    }

    pub fn filter_width(&self) -> usize {
        self.filter_width
    }

    pub fn filter_height(&self) -> usize {
        self.filter_height
    }

    pub fn filter_depth(&self) -> usize {
        self.filter_depth
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn filters(&self) -> &[Tensor] {
        &self.filters
    }

    fn center(&self) -> (isize, isize) {
        (
            (self.filter_height as isize - 1) / 2,
            (self.filter_width as isize - 1) / 2,
        )
    }

    fn check_config(&self) -> Result<()> {
        if self.filter_width == 0 || self.filter_height == 0 || self.channels == 0 || self.stride == 0 {
            return Err(NetworkError::Architecture(format!(
                "convolutional layer needs non-zero filter size, channels and stride \
                 (filter {}x{}, {} channels, stride {})",
                self.filter_width, self.filter_height, self.channels, self.stride
            )));
        }
        if !self.activation.is_elementwise() {
            return Err(NetworkError::Architecture(
                "softmax activation is only supported on fully connected and output layers".into(),
            ));
        }
        Ok(())
    }

    /// Output `(width, height)` for an input of shape `input`.
    fn output_size(&self, input: Shape) -> (usize, usize) {
        (
            (input.width + self.stride - 1) / self.stride,
            (input.height + self.stride - 1) / self.stride,
        )
    }

    pub(crate) fn allocate(&mut self, input: Shape, rng: &mut ChaCha8Rng) -> Result<()> {
        self.check_config()?;

        self.filter_depth = input.depth;
        (self.width, self.height) = self.output_size(input);
        self.outputs = Tensor::new_3d(self.height, self.width, self.channels);
        self.deltas = Tensor::new_3d(self.height, self.width, self.channels);

        let filter = Tensor::new_3d(self.filter_height, self.filter_width, self.filter_depth);
        let taps = self.filter_width * self.filter_height;
        let fan_in = taps * self.filter_depth;
        let fan_out = taps * self.channels;

        self.filters = vec![filter.clone(); self.channels];
        for f in &mut self.filters {
            init::xavier(f.values_mut(), fan_in, fan_out, rng);
        }
        self.filter_gradients = vec![filter.clone(); self.channels];
        self.delta_weights = vec![filter.clone(); self.channels];
        self.prev_delta_weights = vec![filter; self.channels];

        self.biases = vec![0.0; self.channels];
        init::randomize(&mut self.biases, rng);
        self.delta_biases = vec![0.0; self.channels];
        self.prev_delta_biases = vec![0.0; self.channels];
        Ok(())
    }

    /// Routes this layer's deltas back through its filters into the
    /// predecessor's delta tensor (inverse of the forward window mapping).
    pub(crate) fn propagate_deltas_into(&self, target: &mut Tensor) {
        let (center_y, center_x) = self.center();
        let stride = self.stride as isize;
        let rows = target.rows() as isize;
        let cols = target.cols() as isize;

        for ndz in 0..self.channels {
            let filter = &self.filters[ndz];
            for ndr in 0..self.height {
                for ndc in 0..self.width {
                    let next_delta = self.deltas.get_3d(ndr, ndc, ndz);
                    for fz in 0..self.filter_depth {
                        for fr in 0..self.filter_height {
                            for fc in 0..self.filter_width {
                                let out_row = ndr as isize * stride + (fr as isize - center_y);
                                let out_col = ndc as isize * stride + (fc as isize - center_x);
                                if out_row < 0 || out_row >= rows || out_col < 0 || out_col >= cols {
                                    continue;
                                }
                                target.add_3d(
                                    out_row as usize,
                                    out_col as usize,
                                    fz,
                                    next_delta * filter.get_3d(fr, fc, fz),
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn deltas_mut(&mut self) -> &mut Tensor {
        &mut self.deltas
    }

    fn accumulate_weight_changes(&mut self, input: &Tensor, settings: &LearningSettings) {
        if !settings.batch_mode {
            self.delta_weights.iter_mut().for_each(|t| t.fill(0.0));
            self.delta_biases.iter_mut().for_each(|v| *v = 0.0);
        }

        let (center_y, center_x) = self.center();
        let stride = self.stride as isize;
        let in_rows = input.rows() as isize;
        let in_cols = input.cols() as isize;

        for ch in 0..self.channels {
            let grad = &mut self.filter_gradients[ch];
            grad.fill(0.0);
            let mut bias_grad = 0.0;

            for out_row in 0..self.height {
                for out_col in 0..self.width {
                    let delta = self.deltas.get_3d(out_row, out_col, ch);
                    bias_grad += delta;
                    for fz in 0..self.filter_depth {
                        for fr in 0..self.filter_height {
                            for fc in 0..self.filter_width {
                                let in_row = out_row as isize * stride + (fr as isize - center_y);
                                let in_col = out_col as isize * stride + (fc as isize - center_x);
                                if in_row < 0 || in_row >= in_rows || in_col < 0 || in_col >= in_cols {
                                    continue;
                                }
                                grad.add_3d(fr, fc, fz, delta * input.get_3d(in_row as usize, in_col as usize, fz));
                            }
                        }
                    }
                }
            }

            let prev = &self.prev_delta_weights[ch];
            let acc = &mut self.delta_weights[ch];
            for k in 0..grad.len() {
                acc.add(k, settings.delta(grad.get(k), prev.get(k)));
            }
            self.delta_biases[ch] += settings.delta(bias_grad, self.prev_delta_biases[ch]);
        }
    }
}

/// Shape of a predecessor a convolutional layer may follow.
fn input_shape_of(prev: Option<&NetworkLayer>) -> Result<Shape> {
    match prev {
        Some(prev @ (NetworkLayer::Input(_) | NetworkLayer::Convolutional(_) | NetworkLayer::MaxPooling(_))) => {
            Ok(prev.shape())
        }
        Some(prev) => Err(NetworkError::Architecture(format!(
            "convolutional layer cannot follow a {} layer",
            prev.name()
        ))),
        None => Err(NetworkError::Architecture("convolutional layer needs a predecessor".into())),
    }
}

impl Layer for ConvolutionalLayer {
    fn shape(&self) -> Shape {
        Shape::new(self.width, self.height, self.channels)
    }

    fn outputs(&self) -> &Tensor {
        &self.outputs
    }

    fn deltas(&self) -> &Tensor {
        &self.deltas
    }

    fn init(&mut self, prev: Option<&NetworkLayer>, rng: &mut ChaCha8Rng) -> Result<()> {
        self.allocate(input_shape_of(prev)?, rng)
    }

    fn validate(&self, prev: Option<&NetworkLayer>) -> Result<()> {
        let input = input_shape_of(prev)?;
        self.check_config()?;
        if self.filter_depth != input.depth || self.output_size(input) != (self.width, self.height) {
            return Err(NetworkError::Architecture(format!(
                "convolutional layer {}x{} with filter depth {} does not fit input {input}",
                self.width, self.height, self.filter_depth
            )));
        }
        expect_dims("convolutional outputs", &self.outputs, self.height, self.width, self.channels)?;
        expect_dims("convolutional deltas", &self.deltas, self.height, self.width, self.channels)?;
        for bank in [&self.filters, &self.filter_gradients, &self.delta_weights, &self.prev_delta_weights] {
            expect_len(bank.len(), self.channels)?;
            for filter in bank {
                expect_dims("filter", filter, self.filter_height, self.filter_width, self.filter_depth)?;
            }
        }
        for b in [&self.biases, &self.delta_biases, &self.prev_delta_biases] {
            expect_len(b.len(), self.channels)?;
        }
        Ok(())
    }

    fn forward(&mut self, input: &Tensor, workers: &WorkerPool) -> Result<()> {
        if input.depth() != self.filter_depth {
            return Err(NetworkError::ShapeMismatch { expected: self.filter_depth, got: input.depth() });
        }

        let (center_y, center_x) = self.center();
        let stride = self.stride as isize;
        let (width, height) = (self.width, self.height);
        let (filter_width, filter_height, filter_depth) = (self.filter_width, self.filter_height, self.filter_depth);
        let in_rows = input.rows() as isize;
        let in_cols = input.cols() as isize;
        let filters = &self.filters;
        let biases = &self.biases;
        let activation = self.activation;

        workers.for_each_channel(self.channels, self.outputs.values_mut(), |ch, plane| {
            let filter = &filters[ch];
            for out_row in 0..height {
                for out_col in 0..width {
                    let mut sum = biases[ch];
                    for fz in 0..filter_depth {
                        for fr in 0..filter_height {
                            for fc in 0..filter_width {
                                let in_row = out_row as isize * stride + (fr as isize - center_y);
                                let in_col = out_col as isize * stride + (fc as isize - center_x);
                                if in_row < 0 || in_row >= in_rows || in_col < 0 || in_col >= in_cols {
                                    continue;
                                }
                                sum += input.get_3d(in_row as usize, in_col as usize, fz) * filter.get_3d(fr, fc, fz);
                            }
                        }
                    }
                    plane[out_row * width + out_col] = activation.value(sum);
                }
            }
        });
        Ok(())
    }

    fn backward(
        &mut self,
        input: &Tensor,
        next: Option<&NetworkLayer>,
        settings: &LearningSettings,
    ) -> Result<()> {
        self.deltas.fill(0.0);
        match next {
            Some(NetworkLayer::MaxPooling(pool)) => pool.route_deltas_into(&mut self.deltas),
            Some(NetworkLayer::Convolutional(conv)) => conv.propagate_deltas_into(&mut self.deltas),
            Some(NetworkLayer::FullyConnected(dense)) => dense.propagate_deltas_into(&mut self.deltas),
            Some(NetworkLayer::Output(out)) => out.dense().propagate_deltas_into(&mut self.deltas),
            Some(NetworkLayer::Input(_)) | None => {
                return Err(NetworkError::Architecture(
                    "convolutional layer needs a pooling, convolutional or dense successor".into(),
                ));
            }
        }

        let activation = self.activation;
        for i in 0..self.deltas.len() {
            let d = activation.derivative(self.outputs.get(i));
            self.deltas.set(i, self.deltas.get(i) * d);
        }

        self.accumulate_weight_changes(input, settings);
        Ok(())
    }

    fn apply_weight_changes(&mut self, settings: &LearningSettings) {
        let n = settings.batch_size as f32;
        for ch in 0..self.channels {
            if settings.batch_mode {
                self.delta_weights[ch].div(n);
            }
            self.filters[ch].add_tensor(&self.delta_weights[ch]);
            self.prev_delta_weights[ch].set_values(self.delta_weights[ch].values());
            if settings.batch_mode {
                self.delta_weights[ch].fill(0.0);
            }
        }

        if settings.batch_mode {
            div_slice(&mut self.delta_biases, n);
        }
        add_slice(&mut self.biases, &self.delta_biases);
        self.prev_delta_biases.copy_from_slice(&self.delta_biases);
        if settings.batch_mode {
            self.delta_biases.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    fn weights(&self) -> Vec<f32> {
        self.filters.iter().flat_map(|f| f.values().iter().copied()).collect()
    }

    fn set_weights(&mut self, values: &[f32]) -> Result<()> {
        let per_filter = self.filter_width * self.filter_height * self.filter_depth;
        if values.len() != per_filter * self.filters.len() {
            return Err(NetworkError::ShapeMismatch {
                expected: per_filter * self.filters.len(),
                got: values.len(),
            });
        }
        for (filter, chunk) in self.filters.iter_mut().zip(values.chunks(per_filter)) {
            filter.set_values(chunk);
        }
        Ok(())
    }

    fn gradients(&self) -> Vec<f32> {
        self.filter_gradients.iter().flat_map(|f| f.values().iter().copied()).collect()
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
