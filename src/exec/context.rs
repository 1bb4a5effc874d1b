use serde::{Serialize, Deserialize};

/// Caller-supplied execution settings for a network.
///
/// Passed to `NetworkBuilder` and stored with the network, so a reloaded
/// model runs with the same thread count and reinitializes identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Worker threads for channel-parallel forward passes; `1` runs inline.
    pub threads: usize,
    /// Seed for weight initialization and shuffling; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl ExecutionContext {
    pub fn new(threads: usize, seed: Option<u64>) -> Self {
        ExecutionContext { threads, seed }
    }

    /// Library version, recorded in saved models.
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        ExecutionContext { threads: 1, seed: None }
    }
}
