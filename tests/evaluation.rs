mod common;

use approx::assert_relative_eq;
use strata_nn::{
    ActivationFunction, ClassifierEvaluator, DataSet, NetworkBuilder, NetworkError, RegressionEvaluator,
    RegressionMetrics,
};

#[test]
fn regression_on_identity_network() {
    let mut net = NetworkBuilder::new()
        .input_layer(1, 1, 1)
        .output_layer(1, ActivationFunction::Linear)
        .random_seed(1)
        .build()
        .unwrap();
    net.set_weights(1, &[1.0]).unwrap();
    net.set_biases(1, &[0.0]).unwrap();

    let data = DataSet::from_rows(&[vec![1.1], vec![1.9], vec![3.2]], &[vec![1.0], vec![2.0], vec![3.0]]).unwrap();
    let metrics = net.test(&data, &RegressionEvaluator).unwrap();
    assert_eq!(metrics, RegressionMetrics::from_predictions(&[1.1, 1.9, 3.2], &[1.0, 2.0, 3.0], 1));
    assert_relative_eq!(metrics.r2, 0.97, max_relative = 1e-4);
    assert_relative_eq!(metrics.mse, 0.02, max_relative = 1e-4);
}

#[test]
fn regression_needs_single_output() {
    let mut net = NetworkBuilder::new()
        .input_layer(1, 1, 1)
        .output_layer(2, ActivationFunction::Linear)
        .build()
        .unwrap();
    let data = DataSet::from_rows(&[vec![1.0]], &[vec![1.0, 2.0]]).unwrap();
    assert!(matches!(net.test(&data, &RegressionEvaluator), Err(NetworkError::Misuse(_))));
}

#[test]
fn binary_classifier_confusion() {
    let mut net = NetworkBuilder::new()
        .input_layer(2, 1, 1)
        .output_layer_with_labels(&["spam"], ActivationFunction::Sigmoid)
        .random_seed(1)
        .build()
        .unwrap();
    net.set_weights(1, &[1.0, -1.0]).unwrap();
    net.set_biases(1, &[0.0]).unwrap();

    // outputs: sigmoid(1) positive, sigmoid(-1) negative, sigmoid(0) = 0.5 positive
    let data = DataSet::from_rows(
        &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]],
        &[vec![1.0], vec![1.0], vec![0.0]],
    )
    .unwrap();
    let metrics = net.test(&data, &ClassifierEvaluator::new()).unwrap();

    let cm = &metrics.confusion;
    assert_eq!(cm.labels(), &["not spam", "spam"]);
    assert_eq!(cm.get(1, 1), 1);
    assert_eq!(cm.get(1, 0), 1);
    assert_eq!(cm.get(0, 1), 1);
    assert_eq!(cm.get(0, 0), 0);
    assert_relative_eq!(metrics.accuracy, 1.0 / 3.0);
    assert_relative_eq!(metrics.per_class[1].precision, 0.5);
    assert_relative_eq!(metrics.per_class[1].recall, 0.5);
}

#[test]
fn multi_class_uses_argmax_and_labels() {
    let mut net = NetworkBuilder::new()
        .input_layer(3, 1, 1)
        .output_layer_with_labels(&["red", "green", "blue"], ActivationFunction::Softmax)
        .random_seed(1)
        .build()
        .unwrap();
    // identity weights: the largest input wins
    net.set_weights(1, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
    net.set_biases(1, &[0.0, 0.0, 0.0]).unwrap();

    let data = DataSet::from_rows(
        &[vec![3.0, 0.0, 0.0], vec![0.0, 2.0, 0.0], vec![0.0, 0.0, 1.0], vec![0.0, 5.0, 0.0]],
        &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 1.0]],
    )
    .unwrap();
    let metrics = net.test(&data, &ClassifierEvaluator::new()).unwrap();
    assert_eq!(metrics.confusion.labels(), &["red", "green", "blue"]);
    assert_eq!(metrics.confusion.get(2, 1), 1);
    assert_relative_eq!(metrics.accuracy, 0.75);
    assert_relative_eq!(metrics.per_class[2].recall, 0.5);
    assert_relative_eq!(metrics.per_class[1].precision, 0.5);
}
