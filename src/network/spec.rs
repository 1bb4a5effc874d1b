use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::exec::context::ExecutionContext;
use crate::layers::{ConvolutionalLayer, FullyConnectedLayer, InputLayer, MaxPoolingLayer, NetworkLayer, OutputLayer};
use crate::loss::loss_type::LossType;
use crate::network::network::Network;

/// Describes one layer in a network specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Input {
        width: usize,
        height: usize,
        depth: usize,
    },
    FullyConnected {
        width: usize,
        activation: ActivationFunction,
    },
    Convolutional {
        filter_width: usize,
        filter_height: usize,
        channels: usize,
        stride: usize,
        activation: ActivationFunction,
    },
    MaxPooling {
        filter_width: usize,
        filter_height: usize,
        stride: usize,
    },
    Output {
        width: usize,
        activation: ActivationFunction,
        /// Class names for each output; defaults to `Output0..`.
        #[serde(default)]
        labels: Option<Vec<String>>,
    },
}

impl LayerSpec {
    /// The uninitialized layer this spec describes.
    pub fn to_layer(&self) -> NetworkLayer {
        match self {
            LayerSpec::Input { width, height, depth } => {
                NetworkLayer::Input(InputLayer::new(*width, *height, *depth))
            }
            LayerSpec::FullyConnected { width, activation } => {
                NetworkLayer::FullyConnected(FullyConnectedLayer::new(*width, *activation))
            }
            LayerSpec::Convolutional { filter_width, filter_height, channels, stride, activation } => {
                NetworkLayer::Convolutional(ConvolutionalLayer::new(
                    *filter_width,
                    *filter_height,
                    *channels,
                    *stride,
                    *activation,
                ))
            }
            LayerSpec::MaxPooling { filter_width, filter_height, stride } => {
                NetworkLayer::MaxPooling(MaxPoolingLayer::new(*filter_width, *filter_height, *stride))
            }
            LayerSpec::Output { width, activation, labels } => NetworkLayer::Output(match labels {
                Some(labels) => OutputLayer::with_labels(labels.clone(), *activation),
                None => OutputLayer::new(*width, *activation),
            }),
        }
    }
}

/// A fully serializable description of a network architecture plus its
/// loss type and execution context.
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of the
/// trained weights; building it with the same seed reproduces the same
/// initial weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    /// Loss function to pair with this network during training.
    pub loss: LossType,
    #[serde(default)]
    pub context: ExecutionContext,
}

impl NetworkSpec {
    pub fn build(&self) -> Result<Network> {
        Network::from_spec(self)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
