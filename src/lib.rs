pub mod activation;
pub mod data;
pub mod error;
pub mod eval;
pub mod exec;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;
pub mod util;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use data::dataset::{DataSet, DataSetItem};
pub use error::{NetworkError, Result};
pub use eval::{ClassificationMetrics, ClassifierEvaluator, Evaluator, RegressionEvaluator, RegressionMetrics};
pub use exec::context::ExecutionContext;
pub use layers::{Layer, NetworkLayer, Shape};
pub use loss::loss_type::LossType;
pub use math::tensor::Tensor;
pub use network::{LayerSpec, Network, NetworkBuilder, NetworkSpec};
pub use optim::optimizer::{LearningSettings, OptimizerType};
pub use train::{BackpropagationTrainer, EpochStats, TrainerConfig};
