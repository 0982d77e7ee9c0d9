//! Group-wise nearest-event alignment.
//!
//! Given a table of observations and a table of timestamped events, both
//! split into independent groups (e.g. recording sessions), this crate
//! assigns to each observation the latency to, the timestamp of, or the
//! index of its governing event.
//!
//! - **binning**: the single-group primitive that finds the governing edge
//! - **group**: partition matching across two tables with order-preserving reassembly
//! - **engine**: the three public alignment operations
//!
//! # Example
//!
//! ```ignore
//! use neurobox_align::align_to_events;
//! use neurobox_model::AlignOptions;
//!
//! let options = AlignOptions::default().with_max_latency(3.0);
//! let aligned = align_to_events(&spikes, &stimuli, &options)?;
//! ```

pub mod binning;
pub mod engine;
mod error;
pub mod group;

pub use binning::{EventEdges, Located, Window};
pub use engine::{LookupKind, align_to_events, get_closest_event, get_closest_event_idx};
pub use error::{AlignError, TableRole};
pub use group::{GroupOperation, apply_by_group};
