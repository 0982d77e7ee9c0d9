//! Transform pipelines over polars tables.
//!
//! A [`Step`] binds one transform from `neurobox-transform` or
//! `neurobox-align` to its parameter record. A [`Pipeline`] runs steps in
//! order and supports appending, inserting, removing and editing parameters
//! by name.

mod error;
pub mod pipeline;
pub mod step;

pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use step::{CustomFn, CustomStep, STEP_NAMES, Step};
