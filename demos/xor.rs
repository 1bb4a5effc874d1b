use strata_nn::{ActivationFunction, DataSet, LossType, NetworkBuilder, TrainerConfig};

fn main() -> strata_nn::Result<()> {
    let inputs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let expected_outputs = vec![
        vec![0.0],
        vec![1.0],
        vec![1.0],
        vec![0.0],
    ];
    let train_set = DataSet::from_rows(&inputs, &expected_outputs)?;

    let mut network = NetworkBuilder::new()
        .name("xor")
        .input_layer(2, 1, 1)
        .dense_layer(3, ActivationFunction::Tanh)
        .output_layer(1, ActivationFunction::Sigmoid)
        .loss_function(LossType::Mse)
        .random_seed(123)
        .build()?;

    let config = TrainerConfig::new(0.9, 0.01, 10_000);
    let stats = network.train(&train_set, config)?;
    println!("Stopped after epoch {}: loss = {:.6}", stats.epoch, stats.train_loss);

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.predict(input)?[0]);
    }
    Ok(())
}
