use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    Tanh,
    ReLU,
    LeakyReLU { alpha: f32 },
    Linear,
    /// Softmax is vector-valued; `apply()` normalizes over the whole tensor.
    /// Only valid on fully connected and output layers.
    Softmax,
}

impl ActivationFunction {
    /// Element-wise activation.  For `Softmax` this returns `exp(x)`; the
    /// normalization happens in `apply()`.
    pub fn value(&self, x: f32) -> f32 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Linear => x,
            ActivationFunction::Softmax => x.exp(),
        }
    }

    /// Derivative expressed through the activation's own output `y = f(x)`.
    ///
    /// Layers only keep their outputs, so every backward step goes through
    /// this form.  `Softmax` uses the diagonal of its Jacobian, `y·(1 - y)`;
    /// paired with cross-entropy the output layer bypasses it entirely.
    pub fn derivative(&self, y: f32) -> f32 {
        match self {
            ActivationFunction::Sigmoid | ActivationFunction::Softmax => y * (1.0 - y),
            ActivationFunction::Tanh => 1.0 - y * y,
            ActivationFunction::ReLU => if y > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if y > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Linear => 1.0,
        }
    }

    /// Applies the activation in place to a weighted-sum tensor.
    ///
    /// No max-subtraction is done for `Softmax`: very large logits overflow.
    pub fn apply(&self, tensor: &mut Tensor) {
        match self {
            ActivationFunction::Softmax => {
                tensor.apply(f32::exp);
                let sum: f32 = tensor.values().iter().sum();
                tensor.div(sum);
            }
            _ => tensor.apply(|x| self.value(x)),
        }
    }

    pub fn is_elementwise(&self) -> bool {
        !matches!(self, ActivationFunction::Softmax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sigmoid_and_derivative() {
        let f = ActivationFunction::Sigmoid;
        let y = f.value(0.0);
        assert_abs_diff_eq!(y, 0.5);
        assert_abs_diff_eq!(f.derivative(y), 0.25);
    }

    #[test]
    fn tanh_derivative_from_output() {
        let f = ActivationFunction::Tanh;
        let x = 0.3f32;
        let y = f.value(x);
        let numeric = (f.value(x + 1e-3) - f.value(x - 1e-3)) / 2e-3;
        assert_abs_diff_eq!(f.derivative(y), numeric, epsilon = 1e-3);
    }

    #[test]
    fn relu_variants() {
        assert_eq!(ActivationFunction::ReLU.value(-2.0), 0.0);
        assert_eq!(ActivationFunction::ReLU.derivative(0.0), 0.0);
        let leaky = ActivationFunction::LeakyReLU { alpha: 0.1 };
        assert_abs_diff_eq!(leaky.value(-2.0), -0.2);
        assert_abs_diff_eq!(leaky.derivative(-0.2), 0.1);
    }

    #[test]
    fn softmax_normalizes() {
        let mut t = Tensor::from_values(&[1.0, 2.0, 3.0]);
        ActivationFunction::Softmax.apply(&mut t);
        let sum: f32 = t.values().iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(t.get(2) > t.get(1) && t.get(1) > t.get(0));
    }
}
