//! Snapshot of the live simulation into the metrics graph
//!
//! Builds the dual topology graph: one vertex per device, one edge per
//! admissible pair, flagged established when the first endpoint holds a
//! connection record. Ordered pairs are visited both ways and the later
//! visit wins, so an asymmetric half-open link is described from the
//! second endpoint's perspective.

use radiomesh_metrics::{LinkInfo, NodeData, TopologyGraph};

use crate::simulation::Simulation;

/// Derive the dual topology graph from the current simulation state
pub fn topology_graph(sim: &Simulation) -> TopologyGraph {
    let mut graph = TopologyGraph::new();
    let ids = sim.device_ids();

    let indices: Vec<_> = ids
        .iter()
        .map(|id| {
            let device = sim.device(*id);
            graph.add_node(NodeData::new(
                device.own_data as f64,
                device.total_data as f64,
            ))
        })
        .collect();

    for (i, &u) in ids.iter().enumerate() {
        for (j, &v) in ids.iter().enumerate() {
            if u == v {
                continue;
            }
            let device = sim.device(u);
            let Some(admissible) = device.protocols.iter().find(|p| sim.can_connect(u, p, v))
            else {
                continue;
            };
            let info = match sim.connection_protocol(u, v) {
                Some(used) => LinkInfo::established(used.latency as f64, used.bandwidth as f64),
                None => LinkInfo::potential(admissible.latency as f64, admissible.bandwidth as f64),
            };
            graph.add_link(indices[i], indices[j], info);
        }
    }

    graph
}
