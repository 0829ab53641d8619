//! Dual-graph snapshot of the mesh topology
//!
//! Vertices are devices, edges are potential links. The established
//! sub-topology is the edge-filtered view with `established == true`;
//! it shares node indices with the full graph so path and component
//! results are directly comparable.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// Per-device data carried by a topology vertex
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeData {
    /// Data submitted to the network by this device as a source
    pub own_data: f64,
    /// Total data forwarded by this device, including as source
    pub total_data: f64,
}

impl NodeData {
    pub fn new(own_data: f64, total_data: f64) -> Self {
        Self { own_data, total_data }
    }
}

/// Description of one potential link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkInfo {
    /// Whether the endpoints actually hold connection records
    pub established: bool,
    /// Latency of the link's protocol, in ticks
    pub latency: f64,
    /// Bandwidth of the link's protocol, in size units per tick
    pub bandwidth: f64,
}

impl LinkInfo {
    pub fn established(latency: f64, bandwidth: f64) -> Self {
        Self { established: true, latency, bandwidth }
    }

    pub fn potential(latency: f64, bandwidth: f64) -> Self {
        Self { established: false, latency, bandwidth }
    }
}

/// The dual topology graph
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: UnGraph<NodeData, LinkInfo>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex, returning its index
    pub fn add_node(&mut self, data: NodeData) -> NodeIndex {
        self.graph.add_node(data)
    }

    /// Record a potential link between two vertices
    ///
    /// Re-adding an existing pair replaces the link description; snapshot
    /// builders iterate ordered pairs, so the second endpoint's view of a
    /// link wins.
    pub fn add_link(&mut self, a: NodeIndex, b: NodeIndex, info: LinkInfo) {
        self.graph.update_edge(a, b, info);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The full (potential) graph
    pub fn potential(&self) -> &UnGraph<NodeData, LinkInfo> {
        &self.graph
    }

    /// The established sub-topology
    ///
    /// Keeps every vertex (isolated devices stay their own component) and
    /// only the established edges. Node indices match the full graph.
    pub fn established(&self) -> UnGraph<NodeData, LinkInfo> {
        let mut sub = UnGraph::default();
        for data in self.graph.node_weights() {
            sub.add_node(*data);
        }
        for edge in self.graph.edge_references() {
            if edge.weight().established {
                sub.add_edge(edge.source(), edge.target(), *edge.weight());
            }
        }
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_established_view_keeps_all_nodes() {
        let mut g = TopologyGraph::new();
        let a = g.add_node(NodeData::default());
        let b = g.add_node(NodeData::default());
        let c = g.add_node(NodeData::default());
        g.add_link(a, b, LinkInfo::established(1.0, 10.0));
        g.add_link(b, c, LinkInfo::potential(1.0, 10.0));

        let est = g.established();
        assert_eq!(est.node_count(), 3);
        assert_eq!(est.edge_count(), 1);
        assert!(est.find_edge(a, b).is_some());
        assert!(est.find_edge(b, c).is_none());
    }

    #[test]
    fn test_add_link_replaces_existing_pair() {
        let mut g = TopologyGraph::new();
        let a = g.add_node(NodeData::default());
        let b = g.add_node(NodeData::default());
        g.add_link(a, b, LinkInfo::potential(1.0, 10.0));
        g.add_link(b, a, LinkInfo::established(2.0, 20.0));

        assert_eq!(g.edge_count(), 1);
        let est = g.established();
        assert_eq!(est.edge_count(), 1);
    }
}
