pub mod context;
pub mod workers;

pub use context::ExecutionContext;
pub use workers::WorkerPool;
