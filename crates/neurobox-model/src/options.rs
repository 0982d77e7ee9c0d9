//! Options for aligning observations to discrete events.
//!
//! # Window semantics
//!
//! For an observation at time `t`, the governing event is the latest event `e`
//! with `e <= t + look_ahead`. The look-ahead (`time_before_event` /
//! `time_before`) lets an event that happens shortly *after* the observation
//! claim it. The upper bound (`max_latency` / `time_after`) discards matches
//! whose distance `|t - e|` exceeds it. Both bounds are inclusive.

use serde::{Deserialize, Serialize};

use crate::columns::EventColumns;
use crate::error::Result;
use crate::params::{StepParams, require_column_name, require_non_negative};

/// Default result column for latency alignment.
pub const DEFAULT_ALIGNED_COL: &str = "aligned";
/// Default result column for the closest event's timestamp.
pub const DEFAULT_EVENT_COL: &str = "event";
/// Default result column for the closest event's index.
pub const DEFAULT_EVENT_INDEX_COL: &str = "event_index";

/// Options for latency alignment (`align_to_events`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignOptions {
    /// Observations up to this long before an event are aligned to it.
    #[serde(default)]
    pub time_before_event: Option<f64>,
    /// Observations further than this from their event get no latency.
    #[serde(default)]
    pub max_latency: Option<f64>,
    #[serde(flatten)]
    pub columns: EventColumns,
    pub returned_colname: String,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            time_before_event: None,
            max_latency: None,
            columns: EventColumns::default(),
            returned_colname: DEFAULT_ALIGNED_COL.to_string(),
        }
    }
}

impl AlignOptions {
    #[must_use]
    pub fn with_time_before_event(mut self, value: f64) -> Self {
        self.time_before_event = Some(value);
        self
    }

    #[must_use]
    pub fn with_max_latency(mut self, value: f64) -> Self {
        self.max_latency = Some(value);
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: EventColumns) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_returned_colname(mut self, name: impl Into<String>) -> Self {
        self.returned_colname = name.into();
        self
    }
}

impl StepParams for AlignOptions {
    fn validate(&self) -> Result<()> {
        if let Some(value) = self.time_before_event {
            require_non_negative("time_before_event", value)?;
        }
        if let Some(value) = self.max_latency {
            require_non_negative("max_latency", value)?;
        }
        self.columns.validate()?;
        require_column_name("returned_colname", &self.returned_colname)
    }
}

/// Options for closest-event lookups (`get_closest_event`, `get_closest_event_idx`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestEventOptions {
    /// Observations up to this long before an event are assigned to it.
    #[serde(default)]
    pub time_before: Option<f64>,
    /// Observations later than this after their event are left unassigned.
    #[serde(default)]
    pub time_after: Option<f64>,
    #[serde(flatten)]
    pub columns: EventColumns,
    pub returned_colname: String,
}

impl Default for ClosestEventOptions {
    fn default() -> Self {
        Self::event()
    }
}

impl ClosestEventOptions {
    /// Defaults for the event timestamp lookup.
    pub fn event() -> Self {
        Self {
            time_before: None,
            time_after: None,
            columns: EventColumns::default(),
            returned_colname: DEFAULT_EVENT_COL.to_string(),
        }
    }

    /// Defaults for the event index lookup.
    pub fn index() -> Self {
        Self {
            returned_colname: DEFAULT_EVENT_INDEX_COL.to_string(),
            ..Self::event()
        }
    }

    #[must_use]
    pub fn with_time_before(mut self, value: f64) -> Self {
        self.time_before = Some(value);
        self
    }

    #[must_use]
    pub fn with_time_after(mut self, value: f64) -> Self {
        self.time_after = Some(value);
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: EventColumns) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_returned_colname(mut self, name: impl Into<String>) -> Self {
        self.returned_colname = name.into();
        self
    }
}

impl StepParams for ClosestEventOptions {
    fn validate(&self) -> Result<()> {
        if let Some(value) = self.time_before {
            require_non_negative("time_before", value)?;
        }
        if let Some(value) = self.time_after {
            require_non_negative("time_after", value)?;
        }
        self.columns.validate()?;
        require_column_name("returned_colname", &self.returned_colname)
    }
}
