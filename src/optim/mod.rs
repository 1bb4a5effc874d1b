pub mod momentum;
pub mod optimizer;
pub mod sgd;

pub use optimizer::{LearningSettings, OptimizerType};
