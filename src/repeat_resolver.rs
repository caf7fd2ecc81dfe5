//! Velvet-style graph optimisation: coverage cutoff and Tour Bus.
//!
//! The coverage cutoff removes edges whose k-mer multiplicity sits below the
//! first valley of the weight histogram. Tour Bus then looks for branch
//! nodes whose outgoing paths all reconverge on one node and keeps only the
//! best-covered path.

use crate::config::AssemblyConfig;
use crate::graph::{DeBruijnGraph, NodeId, OutEdge};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Largest edge weight considered when looking for the histogram valley
pub const CUTOFF_HISTOGRAM_MAX: usize = 15;

/// Cutoff used when there is too little signal to estimate one
pub const DEFAULT_COVERAGE_CUTOFF: u64 = 2;

/// What the resolver did to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverReport {
    pub coverage_cutoff: Option<u64>,
    pub edges_below_cutoff: usize,
    pub branches_resolved: usize,
}

/// Estimate a coverage cutoff from the edge weights of a graph.
pub fn estimate_coverage_cutoff(graph: &DeBruijnGraph) -> u64 {
    let weights: Vec<u64> = graph.edges().map(|(_, _, weight)| weight).collect();
    coverage_cutoff_from_weights(&weights)
}

/// Valley detection over the weight histogram restricted to
/// `1..=CUTOFF_HISTOGRAM_MAX`.
///
/// The first weight `w` whose count is strictly below both neighbours gives
/// a cutoff of `w + 1`. Without a valley the share of weight-1 edges decides:
/// 4 when at least half are singletons, 3 from a quarter, 2 otherwise. With
/// fewer than three distinct weights in range the cutoff is
/// [`DEFAULT_COVERAGE_CUTOFF`].
pub fn coverage_cutoff_from_weights(weights: &[u64]) -> u64 {
    let mut histogram = [0usize; CUTOFF_HISTOGRAM_MAX + 2];
    for &weight in weights {
        if (1..=CUTOFF_HISTOGRAM_MAX as u64).contains(&weight) {
            histogram[weight as usize] += 1;
        }
    }

    let candidates = histogram[1..=CUTOFF_HISTOGRAM_MAX]
        .iter()
        .filter(|&&count| count > 0)
        .count();
    if candidates < 3 {
        return DEFAULT_COVERAGE_CUTOFF;
    }

    for w in 2..CUTOFF_HISTOGRAM_MAX {
        if histogram[w] < histogram[w - 1] && histogram[w] < histogram[w + 1] {
            return w as u64 + 1;
        }
    }

    let singleton_fraction = histogram[1] as f64 / weights.len() as f64;
    if singleton_fraction >= 0.5 {
        4
    } else if singleton_fraction >= 0.25 {
        3
    } else {
        DEFAULT_COVERAGE_CUTOFF
    }
}

/// Remove every edge with weight strictly below `cutoff`.
///
/// Nodes left without edges are evicted by the graph. Returns the number of
/// edges removed.
pub fn apply_coverage_cutoff(graph: &mut DeBruijnGraph, cutoff: u64) -> usize {
    let weak: Vec<(NodeId, NodeId)> = graph
        .edges()
        .filter(|&(_, _, weight)| weight < cutoff)
        .map(|(from, to, _)| (from, to))
        .collect();
    let mut removed = 0;
    for (from, to) in weak {
        if graph.remove_edge(from, to).is_some() {
            removed += 1;
        }
    }
    removed
}

/// One outgoing path walked from a branch node.
#[derive(Debug, Clone)]
struct BranchWalk {
    first: NodeId,
    /// Nodes after the branch node; the last one is where the walk stopped
    path: Vec<NodeId>,
    weight: u64,
}

impl BranchWalk {
    fn end(&self) -> NodeId {
        self.path[self.path.len() - 1]
    }

    fn interior(&self) -> &[NodeId] {
        &self.path[..self.path.len() - 1]
    }
}

/// Follow a branch edge, then keep going while nodes are simple
/// pass-throughs (one successor, at most one predecessor). The walk takes at
/// most `max_len` edges and accumulates their weights.
fn walk_branch(graph: &DeBruijnGraph, edge: OutEdge, max_len: usize) -> BranchWalk {
    let mut path = vec![edge.to];
    let mut weight = edge.weight;
    let mut current = edge.to;

    while path.len() < max_len {
        if graph.out_degree(current) != 1 || graph.in_degree(current) > 1 {
            break;
        }
        let next = graph.out_edges(current)[0];
        weight += next.weight;
        path.push(next.to);
        current = next.to;
    }

    BranchWalk {
        first: edge.to,
        path,
        weight,
    }
}

/// Collapse the branches of `start` if they all reconverge on one node.
/// Returns how many branches were removed.
fn resolve_branch(graph: &mut DeBruijnGraph, start: NodeId, max_len: usize) -> usize {
    let view: &DeBruijnGraph = graph;
    let walks: Vec<BranchWalk> = view
        .out_edges(start)
        .iter()
        .map(|&edge| walk_branch(view, edge, max_len))
        .collect();

    let end = walks[0].end();
    if walks.iter().any(|walk| walk.end() != end) {
        return 0;
    }

    // Strict comparison keeps the first-walked branch on ties
    let mut best = 0;
    for (i, walk) in walks.iter().enumerate().skip(1) {
        if walk.weight > walks[best].weight {
            best = i;
        }
    }
    let survivor = walks[best].path.clone();

    let mut resolved = 0;
    for (i, walk) in walks.iter().enumerate() {
        if i == best {
            continue;
        }
        if graph.remove_edge(start, walk.first).is_none() {
            continue;
        }
        resolved += 1;
        for &node in walk.interior() {
            if node == start || survivor.contains(&node) || !graph.contains(node) {
                break;
            }
            if graph.in_degree(node) == 0 || graph.out_degree(node) == 0 {
                graph.remove_node(node);
            } else {
                break;
            }
        }
    }
    resolved
}

/// Tour Bus: repeatedly resolve divergent-then-convergent branches, keeping
/// the path with the highest accumulated weight.
///
/// Stops after a pass that changes nothing or after `max_iterations` passes.
pub fn tour_bus(graph: &mut DeBruijnGraph, max_repeat_length: usize, max_iterations: usize) -> usize {
    let mut total = 0;
    for iteration in 0..max_iterations {
        let view: &DeBruijnGraph = graph;
        let branches: Vec<NodeId> = view.nodes().filter(|&n| view.out_degree(n) >= 2).collect();
        let mut resolved = 0;
        for start in branches {
            // An earlier removal in this pass may have pruned this branch point
            if !graph.contains(start) || graph.out_degree(start) < 2 {
                continue;
            }
            resolved += resolve_branch(graph, start, max_repeat_length);
        }
        debug!("Tour bus pass {}: resolved {} branches", iteration + 1, resolved);
        total += resolved;
        if resolved == 0 {
            return total;
        }
    }
    warn!("Tour bus stopped at the {}-pass limit", max_iterations);
    total
}

/// Run coverage cutoff then Tour Bus as enabled in the configuration.
pub fn resolve_repeats(graph: &mut DeBruijnGraph, config: &AssemblyConfig) -> ResolverReport {
    let mut report = ResolverReport::default();

    if config.auto_cutoff {
        let cutoff = estimate_coverage_cutoff(graph);
        report.coverage_cutoff = Some(cutoff);
        report.edges_below_cutoff = apply_coverage_cutoff(graph, cutoff);
        info!(
            "Coverage cutoff {}: removed {} edges, {} nodes / {} edges remain",
            cutoff,
            report.edges_below_cutoff,
            graph.node_count(),
            graph.edge_count()
        );
    }

    if config.use_tour_bus {
        report.branches_resolved = tour_bus(
            graph,
            config.max_repeat_length,
            config.tour_bus_iterations,
        );
        info!(
            "Tour bus resolved {} branches, {} nodes / {} edges remain",
            report.branches_resolved,
            graph.node_count(),
            graph.edge_count()
        );
    }

    report
}
