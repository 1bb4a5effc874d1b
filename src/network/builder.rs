use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::exec::context::ExecutionContext;
use crate::loss::loss_type::LossType;
use crate::network::network::Network;
use crate::network::spec::{LayerSpec, NetworkSpec};

/// Assembles a network layer by layer; the order of calls is the layer order.
///
/// ```
/// use strata_nn::{ActivationFunction, LossType, NetworkBuilder};
///
/// let network = NetworkBuilder::new()
///     .input_layer(2, 1, 1)
///     .dense_layer(3, ActivationFunction::Tanh)
///     .output_layer(1, ActivationFunction::Sigmoid)
///     .loss_function(LossType::Mse)
///     .random_seed(123)
///     .build()
///     .unwrap();
/// assert_eq!(network.layers().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    spec: NetworkSpec,
}

impl NetworkBuilder {
    pub fn new() -> NetworkBuilder {
        NetworkBuilder {
            spec: NetworkSpec {
                name: "network".into(),
                layers: vec![],
                loss: LossType::Mse,
                context: ExecutionContext::default(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.spec.name = name.into();
        self
    }

    pub fn input_layer(mut self, width: usize, height: usize, depth: usize) -> Self {
        self.spec.layers.push(LayerSpec::Input { width, height, depth });
        self
    }

    pub fn dense_layer(mut self, width: usize, activation: ActivationFunction) -> Self {
        self.spec.layers.push(LayerSpec::FullyConnected { width, activation });
        self
    }

    pub fn convolutional_layer(
        mut self,
        filter_width: usize,
        filter_height: usize,
        channels: usize,
        stride: usize,
        activation: ActivationFunction,
    ) -> Self {
        self.spec.layers.push(LayerSpec::Convolutional {
            filter_width,
            filter_height,
            channels,
            stride,
            activation,
        });
        self
    }

    pub fn max_pooling_layer(mut self, filter_width: usize, filter_height: usize, stride: usize) -> Self {
        self.spec.layers.push(LayerSpec::MaxPooling { filter_width, filter_height, stride });
        self
    }

    pub fn output_layer(mut self, width: usize, activation: ActivationFunction) -> Self {
        self.spec.layers.push(LayerSpec::Output { width, activation, labels: None });
        self
    }

    pub fn output_layer_with_labels(mut self, labels: &[&str], activation: ActivationFunction) -> Self {
        self.spec.layers.push(LayerSpec::Output {
            width: labels.len(),
            activation,
            labels: Some(labels.iter().map(|l| l.to_string()).collect()),
        });
        self
    }

    pub fn loss_function(mut self, loss: LossType) -> Self {
        self.spec.loss = loss;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.spec.context.seed = Some(seed);
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.spec.context.threads = threads;
        self
    }

    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.spec.context = context;
        self
    }

    /// The architecture collected so far.
    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn build(self) -> Result<Network> {
        Network::from_spec(&self.spec)
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        NetworkBuilder::new()
    }
}
