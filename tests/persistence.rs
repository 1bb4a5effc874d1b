mod common;

use serde_json::{json, Value};
use strata_nn::{Network, NetworkError, NetworkSpec, TrainerConfig};

fn temp_path(name: &str) -> String {
    std::env::temp_dir().join(name).to_string_lossy().into_owned()
}

#[test]
fn json_string_round_trip_predicts_identically() {
    let mut net = common::xor_network(123);
    net.train(&common::xor_set(), TrainerConfig::new(0.5, 0.0, 20)).unwrap();

    let mut restored = Network::from_json(&net.to_json().unwrap()).unwrap();
    for item in &common::xor_set() {
        assert_eq!(net.predict(item.input()).unwrap(), restored.predict(item.input()).unwrap());
    }
    assert_eq!(restored.output_layer().labels(), &["Output0"]);
    assert_eq!(restored.version(), net.version());
}

#[test]
fn json_file_round_trip_keeps_cnn() {
    let mut net = common::small_cnn(3, 2);
    let path = temp_path("strata_nn_cnn_round_trip.json");
    net.save_json(&path).unwrap();
    let mut restored = Network::load_json(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(restored.context().threads, 2);
    for i in 0..net.layers().len() {
        assert_eq!(net.layers()[i].shape(), restored.layers()[i].shape());
        assert_eq!(net.weights(i).unwrap(), restored.weights(i).unwrap());
        assert_eq!(net.biases(i).unwrap(), restored.biases(i).unwrap());
    }
    for item in &common::bars_set() {
        assert_eq!(net.predict(item.input()).unwrap(), restored.predict(item.input()).unwrap());
    }
}

#[test]
fn spec_rebuilds_the_same_initial_network() {
    let builder = common::xor_builder(77);
    let spec = builder.spec().clone();
    let path = temp_path("strata_nn_xor_spec.json");
    spec.save_json(&path).unwrap();
    let loaded = NetworkSpec::load_json(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, spec);
    let a = builder.build().unwrap();
    let b = loaded.build().unwrap();
    for i in 0..a.layers().len() {
        assert_eq!(a.weights(i).unwrap(), b.weights(i).unwrap());
    }
}

#[test]
fn malformed_json_is_an_error() {
    assert!(matches!(Network::from_json("{\"layers\": 3}"), Err(NetworkError::Json(_))));
    assert!(matches!(Network::load_json("/nonexistent/strata.json"), Err(NetworkError::Io(_))));
}

fn xor_json() -> Value {
    serde_json::from_str(&common::xor_network(5).to_json().unwrap()).unwrap()
}

fn load(value: &Value) -> strata_nn::Result<Network> {
    Network::from_json(&value.to_string())
}

#[test]
fn empty_layer_list_is_rejected() {
    let mut value = xor_json();
    value["layers"] = json!([]);
    assert!(matches!(load(&value), Err(NetworkError::Architecture(_))));
}

#[test]
fn layer_chain_must_still_fit_together() {
    // Dropping the hidden layer leaves 3-row output weights behind a 2-value input.
    let mut value = xor_json();
    value["layers"].as_array_mut().unwrap().remove(1);
    assert!(matches!(load(&value), Err(NetworkError::Architecture(_))));

    let mut value = xor_json();
    value["layers"].as_array_mut().unwrap().swap(0, 2);
    assert!(matches!(load(&value), Err(NetworkError::Architecture(_))));
}

#[test]
fn truncated_tensor_buffer_is_rejected() {
    let mut value = xor_json();
    value["layers"][2]["Output"]["dense"]["weights"]["values"].as_array_mut().unwrap().pop();
    assert!(matches!(load(&value), Err(NetworkError::Json(_))));
}

#[test]
fn resized_weights_are_rejected() {
    let zeros = vec![0.0f32; 9];
    let mut value = xor_json();
    value["layers"][1]["FullyConnected"]["weights"] =
        json!({ "rows": 3, "cols": 3, "depth": 1, "values": zeros });
    assert!(matches!(load(&value), Err(NetworkError::Architecture(_))));

    let mut value = xor_json();
    value["layers"][1]["FullyConnected"]["biases"] = json!([0.0, 0.0]);
    assert!(matches!(
        load(&value),
        Err(NetworkError::ShapeMismatch { expected: 3, got: 2 })
    ));
}

#[test]
fn loss_must_match_output_layer() {
    let cnn: Value = serde_json::from_str(&common::small_cnn(1, 1).to_json().unwrap()).unwrap();
    let mut value = xor_json();
    value["loss"] = cnn["loss"].clone();
    assert!(matches!(load(&value), Err(NetworkError::Architecture(_))));
}

#[test]
fn pooling_positions_must_lie_inside_input() {
    let mut value: Value = serde_json::from_str(&common::small_cnn(1, 1).to_json().unwrap()).unwrap();
    assert!(load(&value).is_ok());
    value["layers"][2]["MaxPooling"]["max_positions"][0] = json!([99, 0]);
    assert!(matches!(load(&value), Err(NetworkError::Architecture(_))));
}

#[test]
fn load_json_validates_too() {
    let mut value = xor_json();
    value["layers"].as_array_mut().unwrap().remove(1);
    let path = temp_path("strata_nn_broken_chain.json");
    std::fs::write(&path, value.to_string()).unwrap();
    let result = Network::load_json(&path);
    let _ = std::fs::remove_file(&path);
    assert!(matches!(result, Err(NetworkError::Architecture(_))));
}
