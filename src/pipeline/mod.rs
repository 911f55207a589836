//! Message pipeline: ordered sequential handlers, then parallel fan-out.

mod engine;
mod tasks;

pub use engine::{Flow, ParallelHandler, Pipeline, PipelineState, SequentialHandler};
pub use tasks::TaskPool;
