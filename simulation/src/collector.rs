//! Per-tick metric collection
//!
//! At the start of every tick the model snapshots the topology and
//! appends one row of reporter values. The path-enumeration metrics
//! (bandwidth efficiency, robustness) are only computed for small
//! populations, and the overall evaluation widens to the six-term
//! variant when they are.

use serde::Serialize;

use radiomesh_metrics::{self as metrics, EvaluationWeights};

use crate::analysis::topology_graph;
use crate::simulation::Simulation;

/// Populations at or above this size skip the path-enumeration metrics
pub const EXPENSIVE_METRICS_LIMIT: usize = 10;

/// How many completed ticks the transit-time reporter looks back over
const TRANSIT_WINDOW: u64 = 10;

/// One tick's worth of reporter values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRow {
    pub tick: u64,
    pub reachability: f64,
    pub routing_efficiency: f64,
    pub power_efficiency: f64,
    pub fairness: f64,
    pub overall_evaluation: f64,
    pub average_transit_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth_efficiency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robustness: Option<f64>,
}

/// Tick-indexed table of metric rows
#[derive(Debug, Default)]
pub struct DataCollector {
    rows: Vec<MetricsRow>,
}

impl DataCollector {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Compute one row of reporter values from the current state
    pub fn measure(sim: &Simulation) -> MetricsRow {
        let graph = topology_graph(sim);
        let weights = EvaluationWeights::default();
        let expensive = sim.device_count() < EXPENSIVE_METRICS_LIMIT;

        let overall = if expensive {
            metrics::evaluate_small(&graph, &weights)
        } else {
            metrics::evaluate_large(&graph, &weights)
        };

        MetricsRow {
            tick: sim.tick(),
            reachability: metrics::reachability(&graph),
            routing_efficiency: metrics::latency(&graph),
            power_efficiency: metrics::power(&graph),
            fairness: metrics::fairness(&graph),
            overall_evaluation: overall,
            average_transit_time: average_transit_time(sim),
            bandwidth_efficiency: expensive.then(|| metrics::bandwidth(&graph)),
            robustness: expensive.then(|| metrics::robustness(&graph)),
        }
    }

    pub(crate) fn push(&mut self, row: MetricsRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }

    pub fn latest(&self) -> Option<&MetricsRow> {
        self.rows.last()
    }

    /// The whole table as JSON lines, one row per tick
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&serde_json::to_string(row)?);
            out.push('\n');
        }
        Ok(out)
    }
}

/// Mean hop count of packets received over the last few completed ticks
///
/// Sums `initial_ttl - ttl` across every packet in each device's received
/// log inside the window; no packets means 0.
fn average_transit_time(sim: &Simulation) -> f64 {
    let start = sim.tick().saturating_sub(TRANSIT_WINDOW);
    let mut total_hops = 0u64;
    let mut total_packets = 0u64;

    for id in sim.device_ids() {
        let device = sim.device(id);
        for tick in start..sim.tick() {
            if let Some(packets) = device.received_packets.get(&tick) {
                total_packets += packets.len() as u64;
                total_hops += packets.iter().map(|p| p.hops() as u64).sum::<u64>();
            }
        }
    }

    if total_packets == 0 {
        return 0.0;
    }
    total_hops as f64 / total_packets as f64
}
