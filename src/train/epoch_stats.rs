use serde::{Serialize, Deserialize};

/// Per-epoch training statistics.
///
/// When a `progress_tx` channel is configured in `TrainerConfig`, the trainer
/// sends one `EpochStats` value at the end of every completed epoch; the
/// last one is also the return value of `train`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Upper bound on epochs for this run.
    pub max_epochs: usize,
    /// Loss function total over all items of this epoch.
    pub train_loss: f32,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
