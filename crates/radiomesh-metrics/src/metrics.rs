//! Metric functions over the dual topology graph
//!
//! Every metric compares the established sub-topology against the full
//! potential graph. Division by a degenerate denominator resolves to 1.0
//! by convention rather than propagating an error.
//!
//! Note the bandwidth metric divides potential by established, the
//! inverse of the other ratios; it is therefore >= 1 whenever the
//! established topology is a strict subgraph. This matches the historical
//! definition and is kept deliberately.

use std::collections::HashSet;

use petgraph::algo::{all_simple_paths, connected_components, dijkstra, has_path_connecting};
use petgraph::graph::{NodeIndex, UnGraph};

use crate::graph::{LinkInfo, NodeData, TopologyGraph};

type Graph = UnGraph<NodeData, LinkInfo>;

/// Weights for the overall evaluation scores; all default to 1
#[derive(Debug, Clone, Copy)]
pub struct EvaluationWeights {
    pub reachability: f64,
    pub robustness: f64,
    pub bandwidth: f64,
    pub latency: f64,
    pub power: f64,
    pub fairness: f64,
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        Self {
            reachability: 1.0,
            robustness: 1.0,
            bandwidth: 1.0,
            latency: 1.0,
            power: 1.0,
            fairness: 1.0,
        }
    }
}

/// Ratio of connected-component counts, potential over established
///
/// Under 1 means the established topology is more fragmented than the
/// potential one allows.
pub fn reachability(g: &TopologyGraph) -> f64 {
    if g.is_empty() {
        return 1.0;
    }
    let potential = connected_components(g.potential());
    let established = connected_components(&g.established());
    potential as f64 / established as f64
}

/// Node-disjoint simple-path count, established over potential
///
/// An upper-bound proxy for the edge-disjoint path count: for each vertex
/// pair, simple paths are enumerated in lexicographic order and a path
/// counts when its node set is disjoint from the union of the node sets
/// of every previously enumerated path for that pair.
pub fn robustness(g: &TopologyGraph) -> f64 {
    let potential = absolute_robustness(g.potential());
    if potential == 0 {
        return 1.0;
    }
    absolute_robustness(&g.established()) as f64 / potential as f64
}

fn absolute_robustness(graph: &Graph) -> u64 {
    let mut count = 0;
    for (a, b) in node_pairs(graph) {
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        for path in simple_paths_lex(graph, a, b) {
            if path.iter().all(|n| !seen.contains(n)) {
                count += 1;
            }
            seen.extend(path.iter().copied());
        }
    }
    count
}

/// Widest-path bandwidth aggregate, potential over established
///
/// For every pair connected in the established topology, takes the best
/// bottleneck bandwidth over all simple paths; the metric is the ratio of
/// that sum computed on the potential graph to the same sum on the
/// established graph.
pub fn bandwidth(g: &TopologyGraph) -> f64 {
    let established = g.established();
    let denominator = absolute_bandwidth(&established, &established);
    if denominator == 0.0 {
        return 1.0;
    }
    absolute_bandwidth(g.potential(), &established) / denominator
}

fn absolute_bandwidth(graph: &Graph, established: &Graph) -> f64 {
    let mut total = 0.0;
    for (a, b) in node_pairs(graph) {
        if !has_path_connecting(established, a, b, None) {
            continue;
        }
        let mut best = f64::NEG_INFINITY;
        for path in all_simple_paths::<Vec<NodeIndex>, _>(graph, a, b, 0, None) {
            let bottleneck = path
                .windows(2)
                .map(|pair| link(graph, pair[0], pair[1]).bandwidth)
                .fold(f64::INFINITY, f64::min);
            best = best.max(bottleneck);
        }
        if best != f64::NEG_INFINITY {
            total += best;
        }
    }
    total
}

/// Shortest-path latency aggregate, potential over established
///
/// Pairs lacking a path in either graph are skipped entirely.
pub fn latency(g: &TopologyGraph) -> f64 {
    let potential = g.potential();
    let established = g.established();
    let mut potential_total = 0.0;
    let mut established_total = 0.0;

    for (a, b) in node_pairs(potential) {
        let via_potential = dijkstra(potential, a, Some(b), |e| e.weight().latency)
            .get(&b)
            .copied();
        let via_established = dijkstra(&established, a, Some(b), |e| e.weight().latency)
            .get(&b)
            .copied();
        if let (Some(p), Some(e)) = (via_potential, via_established) {
            potential_total += p;
            established_total += e;
        }
    }

    if established_total == 0.0 {
        return 1.0;
    }
    potential_total / established_total
}

/// Ratio of the minimum spanning edge count to the edges actually present
///
/// `(|V| - |CC(established)|) / |E(established)|`: how close the
/// established topology is to a spanning forest.
pub fn power(g: &TopologyGraph) -> f64 {
    let established = g.established();
    let edges = established.edge_count();
    if edges == 0 {
        return 1.0;
    }
    let least_possible = established.node_count() - connected_components(&established);
    least_possible as f64 / edges as f64
}

/// Correlation of submitted vs. forwarded data, rescaled to [0, 1]
///
/// A device that forwards in proportion to what it submits is treated
/// fairly; perfectly anti-correlated load scores 0. Undefined correlation
/// (fewer than two devices, or zero variance) resolves to 1.0.
pub fn fairness(g: &TopologyGraph) -> f64 {
    let nodes: Vec<&NodeData> = g.potential().node_weights().collect();
    match pearson(&nodes) {
        Some(r) => (r + 1.0) / 2.0,
        None => 1.0,
    }
}

fn pearson(nodes: &[&NodeData]) -> Option<f64> {
    let n = nodes.len();
    if n < 2 {
        return None;
    }
    let count = n as f64;
    let mean_own = nodes.iter().map(|d| d.own_data).sum::<f64>() / count;
    let mean_total = nodes.iter().map(|d| d.total_data).sum::<f64>() / count;

    let mut covariance = 0.0;
    let mut var_own = 0.0;
    let mut var_total = 0.0;
    for data in nodes {
        let dx = data.own_data - mean_own;
        let dy = data.total_data - mean_total;
        covariance += dx * dy;
        var_own += dx * dx;
        var_total += dy * dy;
    }
    if var_own == 0.0 || var_total == 0.0 {
        return None;
    }
    Some(covariance / (var_own * var_total).sqrt())
}

/// Weighted mean of all six metrics
pub fn evaluate_small(g: &TopologyGraph, weights: &EvaluationWeights) -> f64 {
    let scores = [
        (weights.reachability, reachability(g)),
        (weights.robustness, robustness(g)),
        (weights.bandwidth, bandwidth(g)),
        (weights.latency, latency(g)),
        (weights.power, power(g)),
        (weights.fairness, fairness(g)),
    ];
    weighted_mean(&scores)
}

/// Weighted mean of the cheap metrics only
///
/// Robustness and bandwidth enumerate simple paths and are skipped for
/// anything but small populations.
pub fn evaluate_large(g: &TopologyGraph, weights: &EvaluationWeights) -> f64 {
    let scores = [
        (weights.reachability, reachability(g)),
        (weights.latency, latency(g)),
        (weights.power, power(g)),
        (weights.fairness, fairness(g)),
    ];
    weighted_mean(&scores)
}

fn weighted_mean(scores: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = scores.iter().map(|(w, _)| w).sum();
    scores.iter().map(|(w, s)| w * s).sum::<f64>() / total_weight
}

fn node_pairs(graph: &Graph) -> Vec<(NodeIndex, NodeIndex)> {
    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    let mut pairs = Vec::new();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            pairs.push((nodes[i], nodes[j]));
        }
    }
    pairs
}

/// All simple paths between two vertices in lexicographic node order
fn simple_paths_lex(graph: &Graph, a: NodeIndex, b: NodeIndex) -> Vec<Vec<NodeIndex>> {
    let mut paths: Vec<Vec<NodeIndex>> =
        all_simple_paths(graph, a, b, 0, None).collect();
    paths.sort();
    paths
}

fn link(graph: &Graph, a: NodeIndex, b: NodeIndex) -> LinkInfo {
    let edge = graph.find_edge(a, b).expect("consecutive path nodes share an edge");
    graph[edge]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The reference four-node topology: a triangle a-b-c of established
    /// links plus a potential-only spur b-d.
    fn reference_graph() -> TopologyGraph {
        let mut g = TopologyGraph::new();
        let a = g.add_node(NodeData::new(10.5, 50.0));
        let b = g.add_node(NodeData::new(3.7, 73.3));
        let c = g.add_node(NodeData::new(2.5, 20.0));
        let d = g.add_node(NodeData::new(5.1, 100.0));
        g.add_link(a, b, LinkInfo::established(0.5, 10.0));
        g.add_link(a, c, LinkInfo::established(0.1, 100.0));
        g.add_link(c, b, LinkInfo::established(0.3, 20.0));
        g.add_link(b, d, LinkInfo::potential(0.2, 50.0));
        g
    }

    /// A triangle where every potential link is established.
    fn saturated_graph() -> TopologyGraph {
        let mut g = TopologyGraph::new();
        let a = g.add_node(NodeData::new(1.0, 2.0));
        let b = g.add_node(NodeData::new(2.0, 4.0));
        let c = g.add_node(NodeData::new(3.0, 6.0));
        g.add_link(a, b, LinkInfo::established(1.0, 10.0));
        g.add_link(b, c, LinkInfo::established(1.0, 10.0));
        g.add_link(a, c, LinkInfo::established(1.0, 10.0));
        g
    }

    #[test]
    fn test_reachability() {
        assert_eq!(reachability(&reference_graph()), 0.5);
    }

    #[test]
    fn test_robustness() {
        assert_eq!(robustness(&reference_graph()), 0.5);
    }

    #[test]
    fn test_bandwidth() {
        assert_eq!(bandwidth(&reference_graph()), 1.0);
    }

    #[test]
    fn test_latency() {
        assert_eq!(latency(&reference_graph()), 1.0);
    }

    #[test]
    fn test_power() {
        assert_eq!(power(&reference_graph()), 2.0 / 3.0);
    }

    #[test]
    fn test_fairness_in_unit_interval() {
        let score = fairness(&reference_graph());
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_saturated_topology_scores_one_everywhere() {
        let g = saturated_graph();
        assert_eq!(reachability(&g), 1.0);
        assert_eq!(robustness(&g), 1.0);
        assert_eq!(bandwidth(&g), 1.0);
        assert_eq!(latency(&g), 1.0);
        assert_eq!(power(&g), 1.0);
        assert_eq!(fairness(&g), 1.0);
        assert_eq!(evaluate_small(&g, &EvaluationWeights::default()), 1.0);
        assert_eq!(evaluate_large(&g, &EvaluationWeights::default()), 1.0);
    }

    #[test]
    fn test_nothing_established_conventions() {
        let mut g = TopologyGraph::new();
        let a = g.add_node(NodeData::default());
        let b = g.add_node(NodeData::default());
        let c = g.add_node(NodeData::default());
        g.add_link(a, b, LinkInfo::potential(1.0, 10.0));
        g.add_link(b, c, LinkInfo::potential(1.0, 10.0));

        // one potential component over three isolated established ones
        assert_eq!(reachability(&g), 1.0 / 3.0);
        // no established paths at all
        assert_eq!(robustness(&g), 0.0);
        // degenerate denominators resolve to 1.0
        assert_eq!(bandwidth(&g), 1.0);
        assert_eq!(latency(&g), 1.0);
        assert_eq!(power(&g), 1.0);
    }

    #[test]
    fn test_empty_graph_conventions() {
        let g = TopologyGraph::new();
        assert_eq!(reachability(&g), 1.0);
        assert_eq!(robustness(&g), 1.0);
        assert_eq!(bandwidth(&g), 1.0);
        assert_eq!(latency(&g), 1.0);
        assert_eq!(power(&g), 1.0);
        assert_eq!(fairness(&g), 1.0);
    }

    #[test]
    fn test_fairness_zero_variance_is_one() {
        let mut g = TopologyGraph::new();
        g.add_node(NodeData::new(5.0, 10.0));
        g.add_node(NodeData::new(5.0, 20.0));
        g.add_node(NodeData::new(5.0, 30.0));
        assert_eq!(fairness(&g), 1.0);
    }

    #[test]
    fn test_fairness_perfect_correlation() {
        let mut g = TopologyGraph::new();
        g.add_node(NodeData::new(1.0, 10.0));
        g.add_node(NodeData::new(2.0, 20.0));
        g.add_node(NodeData::new(3.0, 30.0));
        assert_eq!(fairness(&g), 1.0);

        let mut anti = TopologyGraph::new();
        anti.add_node(NodeData::new(1.0, 30.0));
        anti.add_node(NodeData::new(2.0, 20.0));
        anti.add_node(NodeData::new(3.0, 10.0));
        assert_eq!(fairness(&anti), 0.0);
    }

    #[test]
    fn test_evaluation_weights() {
        let g = reference_graph();
        // weight everything but power at zero
        let weights = EvaluationWeights {
            reachability: 0.0,
            robustness: 0.0,
            bandwidth: 0.0,
            latency: 0.0,
            power: 1.0,
            fairness: 0.0,
        };
        assert_eq!(evaluate_small(&g, &weights), power(&g));
        assert_eq!(evaluate_large(&g, &weights), power(&g));
    }
}
