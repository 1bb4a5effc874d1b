use serde::{Serialize, Deserialize};

/// Selects which loss function a network is trained against.
///
/// - `Mse`          — Mean-squared error; any output activation.
/// - `CrossEntropy` — Cross-entropy; pair with a Sigmoid (binary, per output)
///   or Softmax (categorical) output layer.  The output error is
///   `predicted - expected` and the output layer uses it as its delta directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    CrossEntropy,
}
