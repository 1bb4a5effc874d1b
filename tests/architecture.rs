use strata_nn::{ActivationFunction, LayerSpec, NetworkBuilder, NetworkError, NetworkLayer, NetworkSpec, Shape};

#[test]
fn cnn_shapes_follow_the_chain() {
    let net = NetworkBuilder::new()
        .input_layer(28, 28, 1)
        .convolutional_layer(5, 5, 6, 1, ActivationFunction::ReLU)
        .max_pooling_layer(2, 2, 2)
        .convolutional_layer(3, 3, 12, 2, ActivationFunction::LeakyReLU { alpha: 0.01 })
        .dense_layer(30, ActivationFunction::Tanh)
        .output_layer(10, ActivationFunction::Softmax)
        .random_seed(2)
        .build()
        .unwrap();

    let shapes: Vec<Shape> = net.layers().iter().map(NetworkLayer::shape).collect();
    assert_eq!(
        shapes,
        vec![
            Shape::new(28, 28, 1),
            Shape::new(28, 28, 6),
            Shape::new(14, 14, 6),
            Shape::new(7, 7, 12),
            Shape::new(30, 1, 1),
            Shape::new(10, 1, 1),
        ]
    );
    assert_eq!(net.weights(1).unwrap().len(), 5 * 5 * 6);
    assert_eq!(net.weights(3).unwrap().len(), 3 * 3 * 6 * 12);
    assert_eq!(net.weights(4).unwrap().len(), 7 * 7 * 12 * 30);
    assert!(net.weights(2).unwrap().is_empty());
}

fn architecture_error(spec: NetworkSpec) -> bool {
    matches!(spec.build(), Err(NetworkError::Architecture(_)))
}

fn spec_of(layers: Vec<LayerSpec>) -> NetworkSpec {
    let mut spec = NetworkBuilder::new().spec().clone();
    spec.layers = layers;
    spec
}

#[test]
fn illegal_chains_are_rejected() {
    let input = LayerSpec::Input { width: 4, height: 4, depth: 1 };
    let output = LayerSpec::Output { width: 1, activation: ActivationFunction::Sigmoid, labels: None };
    let dense = LayerSpec::FullyConnected { width: 3, activation: ActivationFunction::Tanh };
    let pool = LayerSpec::MaxPooling { filter_width: 2, filter_height: 2, stride: 2 };
    let conv = |activation| LayerSpec::Convolutional { filter_width: 3, filter_height: 3, channels: 2, stride: 1, activation };

    assert!(architecture_error(spec_of(vec![])));
    assert!(architecture_error(spec_of(vec![input.clone()])));
    assert!(architecture_error(spec_of(vec![dense.clone(), output.clone()])));
    assert!(architecture_error(spec_of(vec![input.clone(), pool.clone(), output.clone()])));
    assert!(architecture_error(spec_of(vec![input.clone(), dense.clone(), pool, output.clone()])));
    assert!(architecture_error(spec_of(vec![input.clone(), dense, conv(ActivationFunction::ReLU), output.clone()])));
    assert!(architecture_error(spec_of(vec![input.clone(), conv(ActivationFunction::Softmax), output.clone()])));
    assert!(architecture_error(spec_of(vec![input.clone(), input.clone(), output.clone()])));
    assert!(architecture_error(spec_of(vec![
        input,
        LayerSpec::MaxPooling { filter_width: 3, filter_height: 3, stride: 1 },
        output,
    ])));
}

#[test]
fn oversized_pooling_window_is_rejected() {
    let result = NetworkBuilder::new()
        .input_layer(2, 2, 1)
        .convolutional_layer(3, 3, 1, 1, ActivationFunction::Tanh)
        .max_pooling_layer(3, 3, 1)
        .output_layer(1, ActivationFunction::Sigmoid)
        .build();
    assert!(matches!(result, Err(NetworkError::Architecture(_))));
}

#[test]
fn spec_json_is_human_editable() {
    let json = r#"{
        "name": "tiny",
        "loss": "cross_entropy",
        "layers": [
            {"type": "input", "width": 3, "height": 1, "depth": 1},
            {"type": "fully_connected", "width": 4, "activation": "ReLU"},
            {"type": "output", "width": 2, "activation": "Softmax", "labels": ["yes", "no"]}
        ]
    }"#;
    let spec: NetworkSpec = serde_json::from_str(json).unwrap();
    assert_eq!(spec.context.threads, 1);
    let mut net = spec.build().unwrap();
    assert_eq!(net.output_layer().labels(), &["yes", "no"]);
    let out = net.predict(&[0.1, 0.2, 0.3]).unwrap();
    assert!((out.iter().sum::<f32>() - 1.0).abs() < 1e-5);
}
