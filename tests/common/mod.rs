#![allow(dead_code)]

use strata_nn::{ActivationFunction, DataSet, LossType, Network, NetworkBuilder};

pub fn xor_set() -> DataSet {
    DataSet::from_rows(
        &[vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        &[vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
    )
    .unwrap()
}

/// 2 -> 3 Tanh -> 1 Sigmoid with MSE.
pub fn xor_builder(seed: u64) -> NetworkBuilder {
    NetworkBuilder::new()
        .name("xor")
        .input_layer(2, 1, 1)
        .dense_layer(3, ActivationFunction::Tanh)
        .output_layer(1, ActivationFunction::Sigmoid)
        .loss_function(LossType::Mse)
        .random_seed(seed)
}

pub fn xor_network(seed: u64) -> Network {
    xor_builder(seed).build().unwrap()
}

/// 6x6x1 input, 3x3 convolution with 2 channels, 2x2 pooling, 2 softmax outputs.
pub fn small_cnn(seed: u64, threads: usize) -> Network {
    NetworkBuilder::new()
        .input_layer(6, 6, 1)
        .convolutional_layer(3, 3, 2, 1, ActivationFunction::Tanh)
        .max_pooling_layer(2, 2, 2)
        .output_layer(2, ActivationFunction::Softmax)
        .loss_function(LossType::CrossEntropy)
        .random_seed(seed)
        .threads(threads)
        .build()
        .unwrap()
}

/// Vertical versus horizontal bar images for `small_cnn`.
pub fn bars_set() -> DataSet {
    let mut inputs = vec![];
    let mut targets = vec![];
    for k in 1..5 {
        let mut vertical = vec![0.0; 36];
        let mut horizontal = vec![0.0; 36];
        for i in 0..6 {
            vertical[i * 6 + k] = 1.0;
            horizontal[k * 6 + i] = 1.0;
        }
        inputs.push(vertical);
        targets.push(vec![1.0, 0.0]);
        inputs.push(horizontal);
        targets.push(vec![0.0, 1.0]);
    }
    DataSet::from_rows(&inputs, &targets).unwrap()
}
