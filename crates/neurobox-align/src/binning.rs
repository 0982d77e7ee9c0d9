//! Single-group binning primitive.
//!
//! Locates, for each query timestamp, the event edge that governs it. Edges
//! may arrive unsorted and may contain missing values; [`EventEdges`] keeps a
//! stable ascending copy together with each edge's original position.
//!
//! Rules, shared by every lookup:
//!
//! - the governing edge is the latest edge `e` with `e <= t + look_ahead`;
//! - an observation equal to an edge is governed by that edge;
//! - among equal edges the first in original order wins;
//! - when `|t - e| > max_latency` there is no governing edge;
//! - missing queries and an empty edge set yield `None`.

/// Look-ahead and maximum-latency bounds for one lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Window {
    /// How far after the observation an event may occur and still govern it.
    pub look_ahead: f64,
    /// Largest accepted distance between observation and governing event.
    pub max_latency: Option<f64>,
}

impl Window {
    pub fn new(look_ahead: Option<f64>, max_latency: Option<f64>) -> Self {
        Self {
            look_ahead: look_ahead.unwrap_or(0.0),
            max_latency,
        }
    }
}

/// The edge that governs one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    /// Position of the edge in the sequence passed to [`EventEdges::new`].
    pub position: usize,
    /// The edge timestamp.
    pub edge: f64,
    /// Query time minus edge time.
    pub latency: f64,
}

/// Sorted event edges for one group.
#[derive(Debug, Clone, Default)]
pub struct EventEdges {
    sorted: Vec<(f64, usize)>,
}

impl EventEdges {
    /// Build from raw edge timestamps; missing entries are skipped but still
    /// count toward the positions of later edges.
    pub fn new(edges: &[Option<f64>]) -> Self {
        let mut sorted: Vec<(f64, usize)> = edges
            .iter()
            .enumerate()
            .filter_map(|(position, edge)| edge.filter(|e| !e.is_nan()).map(|e| (e, position)))
            .collect();
        // Stable: equal edges keep their original relative order.
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { sorted }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Find the governing edge for a single query time.
    pub fn locate(&self, query: Option<f64>, window: Window) -> Option<Located> {
        let t = query.filter(|t| !t.is_nan())?;
        let reach = t + window.look_ahead;
        let upper = self.sorted.partition_point(|(edge, _)| *edge <= reach);
        if upper == 0 {
            return None;
        }
        let edge = self.sorted[upper - 1].0;
        let first = self.sorted.partition_point(|(e, _)| *e < edge);
        let (edge, position) = self.sorted[first];
        let latency = t - edge;
        if let Some(max_latency) = window.max_latency
            && latency.abs() > max_latency
        {
            return None;
        }
        Some(Located {
            position,
            edge,
            latency,
        })
    }

    /// Latency of each query to its governing edge.
    pub fn latencies(&self, queries: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
        queries
            .iter()
            .map(|q| self.locate(*q, window).map(|hit| hit.latency))
            .collect()
    }

    /// Timestamp of each query's governing edge.
    pub fn edges_for(&self, queries: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
        queries
            .iter()
            .map(|q| self.locate(*q, window).map(|hit| hit.edge))
            .collect()
    }

    /// Original position of each query's governing edge.
    pub fn positions_for(&self, queries: &[Option<f64>], window: Window) -> Vec<Option<i64>> {
        queries
            .iter()
            .map(|q| {
                self.locate(*q, window)
                    .and_then(|hit| i64::try_from(hit.position).ok())
            })
            .collect()
    }
}
