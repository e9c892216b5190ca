//! Normalization pipeline: request options, the fixed execution plan,
//! and the engine that applies it to a dataset.

mod engine;
mod options;
mod plan;

pub use engine::{run, EngineError, PipelineResult};
pub use options::{NormalizeOptions, OptionsError, ResourceKind, ResponseMode};
pub use plan::{Operation, Plan, Step};
