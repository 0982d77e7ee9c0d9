//! Column roles shared by the event alignment operations.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::require_column_name;

/// Default name of the group key column in both tables.
pub const DEFAULT_GROUP_COL: &str = "group";
/// Default name of the time column in both tables.
pub const DEFAULT_TIME_COL: &str = "time";

/// Which columns carry the group key and the timestamps in the observation
/// ("data") table and in the event table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventColumns {
    /// Group key column in the observation table.
    pub data_group_col: String,
    /// Group key column in the event table.
    pub events_group_col: String,
    /// Timestamp column in the event table.
    pub events_time_col: String,
    /// Time column in the observation table.
    pub data_time_col: String,
}

impl Default for EventColumns {
    fn default() -> Self {
        Self {
            data_group_col: DEFAULT_GROUP_COL.to_string(),
            events_group_col: DEFAULT_GROUP_COL.to_string(),
            events_time_col: DEFAULT_TIME_COL.to_string(),
            data_time_col: DEFAULT_TIME_COL.to_string(),
        }
    }
}

impl EventColumns {
    /// Use the same group column name in both tables.
    #[must_use]
    pub fn with_group_col(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.data_group_col.clone_from(&name);
        self.events_group_col = name;
        self
    }

    /// Use the same time column name in both tables.
    #[must_use]
    pub fn with_time_col(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.data_time_col.clone_from(&name);
        self.events_time_col = name;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_column_name("data_group_col", &self.data_group_col)?;
        require_column_name("events_group_col", &self.events_group_col)?;
        require_column_name("events_time_col", &self.events_time_col)?;
        require_column_name("data_time_col", &self.data_time_col)
    }
}
