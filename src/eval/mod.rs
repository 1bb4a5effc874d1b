pub mod classifier;
pub mod evaluator;
pub mod regression;

pub use classifier::{ClassMetrics, ClassificationMetrics, ClassifierEvaluator, ConfusionMatrix};
pub use evaluator::Evaluator;
pub use regression::{RegressionEvaluator, RegressionMetrics};
