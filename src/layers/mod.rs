pub mod convolutional;
pub mod dense;
pub mod input;
pub mod layer;
pub mod max_pooling;
pub mod output;

pub use convolutional::ConvolutionalLayer;
pub use dense::FullyConnectedLayer;
pub use input::InputLayer;
pub use layer::{Layer, NetworkLayer, Shape};
pub use max_pooling::MaxPoolingLayer;
pub use output::OutputLayer;
