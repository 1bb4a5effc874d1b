use log::debug;
use serde::{Serialize, Deserialize};

use crate::data::dataset::DataSet;
use crate::error::{NetworkError, Result};
use crate::eval::evaluator::Evaluator;
use crate::exec::context::ExecutionContext;
use crate::exec::workers::WorkerPool;
use crate::layers::{Layer, NetworkLayer, OutputLayer};
use crate::loss::loss_function::LossFunction;
use crate::math::init::seeded_rng;
use crate::network::spec::NetworkSpec;
use crate::optim::optimizer::LearningSettings;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainerConfig;
use crate::train::trainer::BackpropagationTrainer;

/// An ordered chain of layers, first `Input`, last `Output`.
///
/// Layers reach their neighbours by index: layer `i` reads the outputs of
/// layer `i - 1` on the way forward and the deltas of layer `i + 1` on the
/// way back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    version: String,
    context: ExecutionContext,
    layers: Vec<NetworkLayer>,
    loss: LossFunction,
    #[serde(skip)]
    workers: WorkerPool,
}

impl Network {
    /// Builds and initializes every layer described by `spec`, front to back.
    pub fn from_spec(spec: &NetworkSpec) -> Result<Network> {
        let mut layers: Vec<NetworkLayer> = spec.layers.iter().map(|l| l.to_layer()).collect();
        validate_chain(&layers)?;

        let output_activation = match layers.last_mut() {
            Some(NetworkLayer::Output(out)) => {
                out.set_loss_type(spec.loss);
                out.activation()
            }
            _ => unreachable!("validate_chain guarantees a trailing output layer"),
        };

        let mut rng = seeded_rng(spec.context.seed);
        for i in 0..layers.len() {
            let (head, tail) = layers.split_at_mut(i);
            let layer = &mut tail[0];
            layer.as_layer_mut().init(head.last(), &mut rng)?;
            debug!("initialized {} layer {} with shape {}", layer.name(), i, layer.shape());
        }

        Ok(Network {
            version: ExecutionContext::version().to_string(),
            context: spec.context.clone(),
            layers,
            loss: LossFunction::new(spec.loss, output_activation),
            workers: WorkerPool::new(spec.context.threads)?,
        })
    }

    pub fn layers(&self) -> &[NetworkLayer] {
        &self.layers
    }

    pub fn layer(&self, idx: usize) -> Result<&NetworkLayer> {
        self.layers
            .get(idx)
            .ok_or_else(|| NetworkError::Misuse(format!("no layer at index {idx}")))
    }

    fn layer_mut(&mut self, idx: usize) -> Result<&mut NetworkLayer> {
        self.layers
            .get_mut(idx)
            .ok_or_else(|| NetworkError::Misuse(format!("no layer at index {idx}")))
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn loss(&self) -> &LossFunction {
        &self.loss
    }

    pub fn loss_mut(&mut self) -> &mut LossFunction {
        &mut self.loss
    }

    pub fn output_layer(&self) -> &OutputLayer {
        match self.layers.last() {
            Some(NetworkLayer::Output(out)) => out,
            _ => unreachable!("a built network always ends with an output layer"),
        }
    }

    fn output_layer_mut(&mut self) -> &mut OutputLayer {
        match self.layers.last_mut() {
            Some(NetworkLayer::Output(out)) => out,
            _ => unreachable!("a built network always ends with an output layer"),
        }
    }

    /// Number of values `set_input` expects.
    pub fn input_len(&self) -> usize {
        self.layers[0].shape().len()
    }

    /// Writes `values` into the input layer without running the network.
    pub fn set_input(&mut self, values: &[f32]) -> Result<()> {
        match self.layers.first_mut() {
            Some(NetworkLayer::Input(input)) => input.set_input(values),
            _ => unreachable!("a built network always starts with an input layer"),
        }
    }

    /// Runs every layer after the input, in order.
    pub fn forward(&mut self) -> Result<()> {
        for i in 1..self.layers.len() {
            let (head, tail) = self.layers.split_at_mut(i);
            tail[0].as_layer_mut().forward(head[i - 1].outputs(), &self.workers)?;
        }
        Ok(())
    }

    /// Outputs of the last forward pass.
    pub fn output(&self) -> &[f32] {
        self.output_layer().outputs().values()
    }

    /// Single forward pass for `input`.
    pub fn predict(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.set_input(input)?;
        self.forward()?;
        Ok(self.output().to_vec())
    }

    /// Hands the loss function's per-output error to the output layer.
    pub fn set_output_error(&mut self, errors: &[f32]) -> Result<()> {
        self.output_layer_mut().set_output_errors(errors)
    }

    /// Backpropagates the current output error through every layer after the
    /// input, last layer first.
    pub fn backward(&mut self, settings: &LearningSettings) -> Result<()> {
        for i in (1..self.layers.len()).rev() {
            let (head, tail) = self.layers.split_at_mut(i);
            if let Some((layer, rest)) = tail.split_first_mut() {
                layer.as_layer_mut().backward(head[i - 1].outputs(), rest.first(), settings)?;
            }
        }
        Ok(())
    }

    pub fn apply_weight_changes(&mut self, settings: &LearningSettings) {
        for layer in self.layers.iter_mut().skip(1) {
            layer.as_layer_mut().apply_weight_changes(settings);
        }
    }

    /// Weights of layer `idx`, flattened; empty for layers without weights.
    pub fn weights(&self, idx: usize) -> Result<Vec<f32>> {
        Ok(self.layer(idx)?.as_layer().weights())
    }

    pub fn set_weights(&mut self, idx: usize, values: &[f32]) -> Result<()> {
        self.layer_mut(idx)?.as_layer_mut().set_weights(values)
    }

    pub fn biases(&self, idx: usize) -> Result<&[f32]> {
        Ok(self.layer(idx)?.as_layer().biases())
    }

    pub fn set_biases(&mut self, idx: usize, values: &[f32]) -> Result<()> {
        self.layer_mut(idx)?.as_layer_mut().set_biases(values)
    }

    /// Gradients from the most recent backward pass of layer `idx`.
    pub fn gradients(&self, idx: usize) -> Result<Vec<f32>> {
        Ok(self.layer(idx)?.as_layer().gradients())
    }

    /// Trains with backpropagation until a stopping criterion is met.
    pub fn train(&mut self, train_set: &DataSet, config: TrainerConfig) -> Result<EpochStats> {
        BackpropagationTrainer::new(config)?.train(self, train_set)
    }

    /// Runs `evaluator` over `test_set`.
    pub fn test<E: Evaluator>(&mut self, test_set: &DataSet, evaluator: &E) -> Result<E::Metrics> {
        evaluator.evaluate(self, test_set)
    }

    /// Serializes shapes, weights and biases to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Network> {
        Network::restore(serde_json::from_str(json)?)
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Network::restore(serde_json::from_reader(reader)?)
    }

    /// Checks a deserialized network the way `from_spec` would have built it,
    /// then starts its worker pool.
    fn restore(mut network: Network) -> Result<Network> {
        validate_chain(&network.layers)?;
        for (i, layer) in network.layers.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| &network.layers[p]);
            layer.as_layer().validate(prev).map_err(|e| match e {
                NetworkError::Architecture(msg) => {
                    NetworkError::Architecture(format!("{} layer {i}: {msg}", layer.name()))
                }
                other => other,
            })?;
        }

        let declared = network.output_layer().loss_type();
        if network.loss.loss_type() != declared {
            return Err(NetworkError::Architecture(format!(
                "loss function {:?} does not match the output layer's {:?}",
                network.loss.loss_type(),
                declared
            )));
        }

        network.workers = WorkerPool::new(network.context.threads)?;
        debug!("restored network with {} layers", network.layers.len());
        Ok(network)
    }
}

/// Input first and only first, output last and only last.
fn validate_chain(layers: &[NetworkLayer]) -> Result<()> {
    if layers.len() < 2 {
        return Err(NetworkError::Architecture(
            "a network needs at least an input and an output layer".into(),
        ));
    }
    if !matches!(layers.first(), Some(NetworkLayer::Input(_))) {
        return Err(NetworkError::Architecture("the first layer must be an input layer".into()));
    }
    if !matches!(layers.last(), Some(NetworkLayer::Output(_))) {
        return Err(NetworkError::Architecture("the last layer must be an output layer".into()));
    }
    for (i, layer) in layers.iter().enumerate().skip(1).take(layers.len() - 2) {
        if matches!(layer, NetworkLayer::Input(_) | NetworkLayer::Output(_)) {
            return Err(NetworkError::Architecture(format!(
                "{} layer at position {i} must not be in the middle of the network",
                layer.name()
            )));
        }
    }
    Ok(())
}
