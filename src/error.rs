use thiserror::Error;

use crate::activation::activation::ActivationFunction;
use crate::loss::loss_type::LossType;

/// Everything that can go wrong while building, running or persisting a network.
///
/// Architecture and misuse errors are programming errors: the network is left
/// in whatever state it was in and should not be used further.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The layer chain is not a valid architecture (checked during `init`).
    #[error("illegal network architecture: {0}")]
    Architecture(String),

    /// A vector or tensor handed to the network has the wrong length.
    #[error("shape mismatch: expected {expected} values, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// An operation was invoked on a layer that does not support it.
    #[error("illegal operation: {0}")]
    Misuse(String),

    /// The output layer has no closed-form delta for this loss/activation pair.
    #[error("unsupported pairing of {loss:?} loss with {activation:?} output activation")]
    UnsupportedLossPairing {
        loss: LossType,
        activation: ActivationFunction,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("could not start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
