use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense single-precision buffer with up to three logical axes.
///
/// Values are stored channel-major: `index(row, col, ch) = ch*rows*cols + row*cols + col`,
/// so every depth slice (feature map) is one contiguous run of `rows*cols` values.
/// A 1D tensor is a single row (`rows = 1, depth = 1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TensorData")]
pub struct Tensor {
    rows: usize,
    cols: usize,
    depth: usize,
    values: Vec<f32>,
}

/// Serialized form of a `Tensor`, checked before it becomes one.
#[derive(Deserialize)]
struct TensorData {
    rows: usize,
    cols: usize,
    depth: usize,
    values: Vec<f32>,
}

impl TryFrom<TensorData> for Tensor {
    type Error = String;

    fn try_from(data: TensorData) -> std::result::Result<Tensor, String> {
        let expected = data
            .rows
            .checked_mul(data.cols)
            .and_then(|n| n.checked_mul(data.depth))
            .ok_or_else(|| format!("tensor dims {}x{}x{} overflow", data.rows, data.cols, data.depth))?;
        if data.values.len() != expected {
            return Err(format!(
                "tensor {}x{}x{} needs {} values, found {}",
                data.rows,
                data.cols,
                data.depth,
                expected,
                data.values.len()
            ));
        }
        Ok(Tensor { rows: data.rows, cols: data.cols, depth: data.depth, values: data.values })
    }
}

impl Tensor {
    /// 1D tensor with `cols` zeros.
    pub fn new(cols: usize) -> Tensor {
        Tensor::new_3d(1, cols, 1)
    }

    pub fn new_2d(rows: usize, cols: usize) -> Tensor {
        Tensor::new_3d(rows, cols, 1)
    }

    pub fn new_3d(rows: usize, cols: usize, depth: usize) -> Tensor {
        Tensor {
            rows,
            cols,
            depth,
            values: vec![0.0; rows * cols * depth],
        }
    }

    /// 1D tensor holding a copy of `values`.
    pub fn from_values(values: &[f32]) -> Tensor {
        Tensor {
            rows: 1,
            cols: values.len(),
            depth: 1,
            values: values.to_vec(),
        }
    }

    /// 3D tensor from channel-major values.
    ///
    /// # Panics
    /// Panics if `values.len() != rows * cols * depth`.
    pub fn from_values_3d(rows: usize, cols: usize, depth: usize, values: Vec<f32>) -> Tensor {
        assert_eq!(
            values.len(),
            rows * cols * depth,
            "tensor buffer length must equal rows * cols * depth"
        );
        Tensor { rows, cols, depth, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Overwrites every value. Lengths must match.
    ///
    /// # Panics
    /// Panics if `values.len() != self.len()`.
    pub fn set_values(&mut self, values: &[f32]) {
        self.values.copy_from_slice(values);
    }

    #[inline]
    fn index_3d(&self, row: usize, col: usize, ch: usize) -> usize {
        debug_assert!(
            row < self.rows && col < self.cols && ch < self.depth,
            "index ({row}, {col}, {ch}) out of bounds for {}x{}x{} tensor",
            self.rows,
            self.cols,
            self.depth
        );
        ch * self.rows * self.cols + row * self.cols + col
    }

    #[inline]
    pub fn get(&self, idx: usize) -> f32 {
        self.values[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: f32) {
        self.values[idx] = value;
    }

    #[inline]
    pub fn add(&mut self, idx: usize, value: f32) {
        self.values[idx] += value;
    }

    #[inline]
    pub fn get_2d(&self, row: usize, col: usize) -> f32 {
        self.values[self.index_3d(row, col, 0)]
    }

    #[inline]
    pub fn set_2d(&mut self, row: usize, col: usize, value: f32) {
        let idx = self.index_3d(row, col, 0);
        self.values[idx] = value;
    }

    #[inline]
    pub fn add_2d(&mut self, row: usize, col: usize, value: f32) {
        let idx = self.index_3d(row, col, 0);
        self.values[idx] += value;
    }

    #[inline]
    pub fn get_3d(&self, row: usize, col: usize, ch: usize) -> f32 {
        self.values[self.index_3d(row, col, ch)]
    }

    #[inline]
    pub fn set_3d(&mut self, row: usize, col: usize, ch: usize, value: f32) {
        let idx = self.index_3d(row, col, ch);
        self.values[idx] = value;
    }

    #[inline]
    pub fn add_3d(&mut self, row: usize, col: usize, ch: usize, value: f32) {
        let idx = self.index_3d(row, col, ch);
        self.values[idx] += value;
    }

    pub fn fill(&mut self, value: f32) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    /// Element-wise `self += other`.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    pub fn add_tensor(&mut self, other: &Tensor) {
        assert!(self.same_shape(other), "tensors are of incompatible shapes");
        add_slice(&mut self.values, &other.values);
    }

    pub fn div(&mut self, divisor: f32) {
        div_slice(&mut self.values, divisor);
    }

    /// Maps `f` over every value in place.
    pub fn apply<F>(&mut self, f: F)
    where
        F: Fn(f32) -> f32,
    {
        self.values.iter_mut().for_each(|v| *v = f(*v));
    }

    /// Initializes the tensor from a bias vector, one bias per column.
    ///
    /// Used to seed a weighted sum before accumulation.
    pub fn copy_from(&mut self, biases: &[f32]) {
        assert_eq!(biases.len(), self.values.len(), "bias vector length mismatch");
        self.values.copy_from_slice(biases);
    }

    pub fn same_shape(&self, other: &Tensor) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.depth == other.depth
    }
}

impl Default for Tensor {
    fn default() -> Self {
        Tensor { rows: 0, cols: 0, depth: 0, values: vec![] }
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in 0..self.depth {
            if self.depth > 1 {
                writeln!(f, "channel {ch}:")?;
            }
            for row in 0..self.rows {
                let line: Vec<String> = (0..self.cols)
                    .map(|col| format!("{:.4}", self.get_3d(row, col, ch)))
                    .collect();
                writeln!(f, "[{}]", line.join(", "))?;
            }
        }
        Ok(())
    }
}

/// `dst[i] += src[i]` for bias vectors.
pub fn add_slice(dst: &mut [f32], src: &[f32]) {
    assert_eq!(dst.len(), src.len(), "slices are of incompatible lengths");
    dst.iter_mut().zip(src.iter()).for_each(|(a, b)| *a += b);
}

pub fn div_slice(dst: &mut [f32], divisor: f32) {
    dst.iter_mut().for_each(|v| *v /= divisor);
}
