mod common;

use std::sync::mpsc;

use approx::assert_relative_eq;
use strata_nn::{
    ActivationFunction, ClassifierEvaluator, LearningSettings, LossType, Network, NetworkBuilder, NetworkError,
    OptimizerType, TrainerConfig,
};

fn all_weights(net: &Network) -> Vec<Vec<f32>> {
    (0..net.layers().len())
        .map(|i| {
            let mut v = net.weights(i).unwrap();
            v.extend_from_slice(net.biases(i).unwrap());
            v
        })
        .collect()
}

#[test]
fn same_seed_same_network() {
    assert_eq!(all_weights(&common::xor_network(42)), all_weights(&common::xor_network(42)));
    assert_ne!(all_weights(&common::xor_network(42)), all_weights(&common::xor_network(43)));
}

#[test]
fn same_seed_same_training_run() {
    let config = || TrainerConfig { shuffle: true, ..TrainerConfig::new(0.3, 0.0, 50) };
    let mut a = common::xor_network(42);
    let mut b = common::xor_network(42);
    let sa = a.train(&common::xor_set(), config()).unwrap();
    let sb = b.train(&common::xor_set(), config()).unwrap();
    assert_eq!(sa.train_loss, sb.train_loss);
    assert_eq!(all_weights(&a), all_weights(&b));
}

#[test]
fn batch_of_one_matches_online() {
    let online = TrainerConfig { optimizer: OptimizerType::Momentum, momentum: 0.5, ..TrainerConfig::new(0.2, 0.0, 25) };
    let batch = TrainerConfig { batch_mode: true, batch_size: 1, ..online.clone() };
    let mut a = common::xor_network(9);
    let mut b = common::xor_network(9);
    a.train(&common::xor_set(), online).unwrap();
    b.train(&common::xor_set(), batch).unwrap();
    assert_eq!(all_weights(&a), all_weights(&b));
}

#[test]
fn full_batch_applies_mean_step() {
    let lr = 0.5;
    let data = common::xor_set();
    let mut net = common::xor_network(11);

    // Sum the per-item output-layer gradients at the initial weights.
    let mut probe = net.clone();
    let settings = LearningSettings::default();
    let mut summed = vec![0.0; probe.weights(2).unwrap().len()];
    for item in &data {
        let predicted = probe.predict(item.input()).unwrap();
        let errors = probe.loss_mut().add_pattern_error(&predicted, item.target());
        probe.set_output_error(&errors).unwrap();
        probe.backward(&settings).unwrap();
        for (s, g) in summed.iter_mut().zip(probe.gradients(2).unwrap()) {
            *s += g;
        }
    }

    let initial = net.weights(2).unwrap();
    let config = TrainerConfig { batch_mode: true, batch_size: 4, ..TrainerConfig::new(lr, 0.0, 1) };
    net.train(&data, config).unwrap();

    for ((w0, w1), g) in initial.iter().zip(net.weights(2).unwrap()).zip(summed) {
        assert_relative_eq!(w1, w0 - lr * g / 4.0, epsilon = 1e-5);
    }
}

#[test]
fn xor_is_learned() {
    let mut net = NetworkBuilder::new()
        .input_layer(2, 1, 1)
        .dense_layer(6, ActivationFunction::Tanh)
        .output_layer(1, ActivationFunction::Sigmoid)
        .loss_function(LossType::Mse)
        .random_seed(123)
        .build()
        .unwrap();
    let config = TrainerConfig { optimizer: OptimizerType::Momentum, momentum: 0.5, ..TrainerConfig::new(0.5, 0.005, 20_000) };
    let stats = net.train(&common::xor_set(), config).unwrap();
    assert!(stats.train_loss <= 0.005, "stopped at epoch {} with loss {}", stats.epoch, stats.train_loss);

    let metrics = net.test(&common::xor_set(), &ClassifierEvaluator::new()).unwrap();
    assert_eq!(metrics.accuracy, 1.0);
}

#[test]
fn cnn_loss_decreases() {
    let (tx, rx) = mpsc::channel();
    let mut net = common::small_cnn(5, 2);
    let config = TrainerConfig { progress_tx: Some(tx), shuffle: true, ..TrainerConfig::new(0.05, 0.0, 40) };
    net.train(&common::bars_set(), config).unwrap();

    let losses: Vec<f32> = rx.try_iter().map(|s| s.train_loss).collect();
    assert_eq!(losses.len(), 40);
    assert!(losses[39] < losses[0], "loss went from {} to {}", losses[0], losses[39]);
}

#[test]
fn worker_count_does_not_change_results() {
    let mut inline = common::small_cnn(17, 1);
    let mut parallel = common::small_cnn(17, 3);
    let data = common::bars_set();
    for item in &data {
        assert_eq!(inline.predict(item.input()).unwrap(), parallel.predict(item.input()).unwrap());
    }

    let config = || TrainerConfig::new(0.1, 0.0, 5);
    inline.train(&data, config()).unwrap();
    parallel.train(&data, config()).unwrap();
    assert_eq!(all_weights(&inline), all_weights(&parallel));
}

#[test]
fn cross_entropy_needs_sigmoid_or_softmax_output() {
    let mut net = NetworkBuilder::new()
        .input_layer(2, 1, 1)
        .output_layer(1, ActivationFunction::Tanh)
        .loss_function(LossType::CrossEntropy)
        .random_seed(1)
        .build()
        .unwrap();
    let result = net.train(&common::xor_set(), TrainerConfig::new(0.1, 0.0, 1));
    assert!(matches!(
        result,
        Err(NetworkError::UnsupportedLossPairing { loss: LossType::CrossEntropy, activation: ActivationFunction::Tanh })
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let mut net = common::xor_network(1);
    let result = net.train(&common::xor_set(), TrainerConfig { learning_rate: -1.0, ..Default::default() });
    assert!(matches!(result, Err(NetworkError::Config(_))));
}
