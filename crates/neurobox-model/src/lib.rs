pub mod columns;
pub mod error;
pub mod options;
pub mod params;

pub use columns::{DEFAULT_GROUP_COL, DEFAULT_TIME_COL, EventColumns};
pub use error::{ParameterError, Result};
pub use options::{
    AlignOptions, ClosestEventOptions, DEFAULT_ALIGNED_COL, DEFAULT_EVENT_COL,
    DEFAULT_EVENT_INDEX_COL,
};
pub use params::{StepParams, require_column_name, require_non_negative, require_positive};
