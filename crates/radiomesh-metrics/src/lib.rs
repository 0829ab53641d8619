//! # Radiomesh Metrics
//!
//! Topology-quality metrics over a dual graph of the simulated mesh.
//!
//! The simulation layer snapshots its state into a [`TopologyGraph`]:
//! one vertex per device, one undirected edge per *potential* link (a
//! pair that could connect under admissibility), each edge flagged with
//! whether the link is actually *established*. The metric functions in
//! [`metrics`] are pure functions over that graph:
//!
//! - [`metrics::reachability`]: component-count ratio of potential over
//!   established
//! - [`metrics::robustness`]: node-disjoint simple-path proxy, established
//!   over potential
//! - [`metrics::bandwidth`]: widest-path aggregate, potential over
//!   established
//! - [`metrics::latency`]: shortest-path latency aggregate, potential over
//!   established
//! - [`metrics::power`]: spanning edges over edges actually present
//! - [`metrics::fairness`]: correlation of submitted vs. forwarded data
//!
//! Degenerate denominators resolve to the convention 1.0 instead of
//! propagating. [`metrics::evaluate_small`] and [`metrics::evaluate_large`]
//! fold a weighted subset into a single score; the large variant skips
//! robustness and bandwidth, which are combinatorially expensive.

pub mod graph;
pub mod metrics;

// Re-export main types
pub use graph::{LinkInfo, NodeData, TopologyGraph};
pub use metrics::{
    EvaluationWeights, bandwidth, evaluate_large, evaluate_small, fairness, latency, power,
    reachability, robustness,
};
