pub mod dataset;

pub use dataset::{DataSet, DataSetItem};
