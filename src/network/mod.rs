pub mod builder;
pub mod network;
pub mod spec;

pub use builder::NetworkBuilder;
pub use network::Network;
pub use spec::{NetworkSpec, LayerSpec};
