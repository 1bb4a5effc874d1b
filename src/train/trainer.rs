use std::time::Instant;

use log::{debug, info, warn};
use rand::seq::SliceRandom;

use crate::data::dataset::DataSet;
use crate::error::{NetworkError, Result};
use crate::math::init::seeded_rng;
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainerConfig;

/// Gradient-descent trainer driving forward, error, backward and apply over a
/// data set, epoch after epoch.
///
/// A run stops when the epoch loss is at most `max_error`, when `max_epochs`
/// epochs have completed, or when the progress receiver has been dropped.
#[derive(Debug, Clone)]
pub struct BackpropagationTrainer {
    config: TrainerConfig,
}

impl BackpropagationTrainer {
    pub fn new(config: TrainerConfig) -> Result<BackpropagationTrainer> {
        config.validate()?;
        Ok(BackpropagationTrainer { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Trains `network` in place and returns the stats of the last epoch.
    pub fn train(&self, network: &mut Network, train_set: &DataSet) -> Result<EpochStats> {
        if train_set.is_empty() {
            return Err(NetworkError::Misuse("cannot train on an empty data set".into()));
        }
        if train_set.input_len() != network.input_len() {
            return Err(NetworkError::ShapeMismatch {
                expected: network.input_len(),
                got: train_set.input_len(),
            });
        }
        if train_set.target_len() != network.output().len() {
            return Err(NetworkError::ShapeMismatch {
                expected: network.output().len(),
                got: train_set.target_len(),
            });
        }

        let settings = self.config.learning_settings();
        let mut rng = seeded_rng(network.context().seed);
        let mut order: Vec<usize> = (0..train_set.len()).collect();
        let mut epoch = 0;

        loop {
            epoch += 1;
            let t_start = Instant::now();

            if self.config.shuffle {
                order.shuffle(&mut rng);
            }
            network.loss_mut().reset();

            let mut pending = 0;
            for &idx in &order {
                let item = &train_set.items()[idx];
                let predicted = network.predict(item.input())?;
                let errors = network.loss_mut().add_pattern_error(&predicted, item.target());
                network.set_output_error(&errors)?;
                network.backward(&settings)?;

                if settings.batch_mode {
                    pending += 1;
                    if pending == settings.batch_size {
                        debug!("epoch {epoch}: applying batch of {pending} items");
                        network.apply_weight_changes(&settings);
                        pending = 0;
                    }
                } else {
                    network.apply_weight_changes(&settings);
                }
            }
            if pending > 0 {
                warn!(
                    "epoch {epoch}: flushing partial batch of {pending} items averaged over batch size {}",
                    settings.batch_size
                );
                network.apply_weight_changes(&settings);
            }

            let stats = EpochStats {
                epoch,
                max_epochs: self.config.max_epochs,
                train_loss: network.loss().total(),
                elapsed_ms: t_start.elapsed().as_millis() as u64,
            };
            info!(
                "epoch {}/{}: loss {:.6} ({} ms)",
                stats.epoch, stats.max_epochs, stats.train_loss, stats.elapsed_ms
            );

            if let Some(ref tx) = self.config.progress_tx {
                if tx.send(stats.clone()).is_err() {
                    info!("progress receiver dropped, stopping after epoch {epoch}");
                    return Ok(stats);
                }
            }
            if stats.train_loss <= self.config.max_error {
                info!("loss {} reached max error {}, stopping after epoch {epoch}", stats.train_loss, self.config.max_error);
                return Ok(stats);
            }
            if epoch >= self.config.max_epochs {
                info!("stopping after max epochs ({epoch}), loss {}", stats.train_loss);
                return Ok(stats);
            }
        }
    }
}
