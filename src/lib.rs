//! # roadmatch
//!
//! Fréchet-based map matching: assign each observation of a noisy GPS-like
//! trace to the most plausible edge of a road network.
//!
//! This library provides:
//! - A discrete Fréchet-style matcher coupling spatial candidate search
//!   with a continuity-constrained dynamic program over the road graph
//! - A re-splitting driver that recovers low-confidence stretches by
//!   re-matching sub-traces with relaxed error bounds
//! - An immutable road-graph model with per-edge polyline geometry
//! - An R-tree index over every geometric vertex of the network
//! - A line-oriented text format for traces and match results
//!
//! ## Features
//!
//! - **`parallel`** - Batch matching of many traces with rayon (default)
//! - **`synthetic`** - Seeded synthetic networks and traces for benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use roadmatch::{match_frechet, Edge, MatcherConfig, Point, RoadGraph, Trace, VertexIndex};
//!
//! // A single road segment from (0,0) to (100,0).
//! let nodes = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
//! let edges = vec![Edge::new(
//!     0,
//!     0,
//!     1,
//!     vec![
//!         Point::new(0.0, 0.0),
//!         Point::new(50.0, 0.0),
//!         Point::new(100.0, 0.0),
//!     ],
//! )];
//! let graph = RoadGraph::from_parts(nodes, edges).unwrap();
//! let index = VertexIndex::build(&graph);
//!
//! // Two noisy observations along the segment.
//! let trace = Trace::from_points(vec![Point::new(10.0, 2.0), Point::new(60.0, -1.0)]);
//! let output = match_frechet(&graph, &index, &trace, &MatcherConfig::default()).unwrap();
//!
//! assert_eq!(output.edge(0), Some(0));
//! assert_eq!(output.edge(1), Some(0));
//! ```
//!
//! The graph and index are immutable after construction and may be shared
//! by any number of concurrent match calls; all mutable state lives inside
//! a single call.

use serde::{Deserialize, Serialize};

pub mod error;
pub mod geometry;
pub mod graph;
pub mod matcher;
pub mod output;
pub mod spatial;
pub mod trace;

#[cfg(feature = "synthetic")]
pub mod synthetic;

pub use error::{MatchError, Result};
pub use graph::{Edge, EdgeId, NodeId, RoadGraph, VertexId};
#[cfg(feature = "parallel")]
pub use matcher::match_frechet_batch;
pub use matcher::{match_frechet, match_frechet_smart};
pub use output::{Estimate, MatchOutput};
pub use spatial::VertexIndex;
pub use trace::Trace;

/// Default field delimiter of the trace and output text formats.
pub const IO_DELIMITER: char = '|';

/// A point in a planar metric coordinate system, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Squared Euclidean distance to another point.
    pub fn dist2(&self, other: Point) -> f64 {
        geometry::dist2(*self, other)
    }
}

/// Tunable parameters of the matcher and the re-splitting driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Squared radius of the spatial candidate search and admissibility
    /// bound for DP transitions, m². Default: 150·150.
    pub max_error2: f64,

    /// Hard cutoff on accepted matching distance in metres; caps the
    /// relaxation applied by the smart driver. Default: 200.
    pub max_match_error: f64,

    /// Candidates retrieved per observation. Default: 50.
    pub nn_number: usize,

    /// Starting candidate-search radius in metres, doubled up to the
    /// maximum while a query returns nothing. Default: 100.
    pub initial_error: f64,

    /// Granularity of the bucketed frontier. Default: 100 000.
    pub buckets: usize,

    /// Most geometric vertices a transition walk may traverse between two
    /// successive observations. Default: 64.
    pub max_walk: usize,

    /// Confidence below which an estimate belongs to a weak run.
    /// Default: 0.5.
    pub weak_threshold: f64,

    /// Cap on the sub-parts the smart driver may create. Default: 10.
    pub num_parts: usize,

    /// Re-splitting passes of the smart driver. Default: 1.
    pub num_retries: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_error2: matcher::MAX_CONSIDERED_AREA,
            max_match_error: matcher::MAX_MATCH_ERROR,
            nn_number: matcher::NN_NUMBER,
            initial_error: matcher::INITIAL_ERROR,
            buckets: matcher::BUCKETS,
            max_walk: matcher::MAX_WALK,
            weak_threshold: matcher::WEAK_THRESHOLD,
            num_parts: matcher::NUM_PARTS,
            num_retries: 1,
        }
    }
}
