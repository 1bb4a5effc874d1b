use crate::data::dataset::DataSet;
use crate::error::Result;
use crate::network::network::Network;

/// Replays the forward pass of a trained network over a test set and
/// summarizes how well it did.
pub trait Evaluator {
    type Metrics;

    fn evaluate(&self, network: &mut Network, test_set: &DataSet) -> Result<Self::Metrics>;
}
