pub mod init;
pub mod tensor;

pub use tensor::Tensor;
