//! Local graph simplification: islands, tips and simple bubbles.

use crate::config::AssemblyConfig;
use crate::graph::{DeBruijnGraph, NodeId};
use bitvec::prelude::*;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Counts of what each cleaning sub-pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub island_nodes_removed: usize,
    pub tip_nodes_removed: usize,
    pub bubbles_popped: usize,
    pub late_tip_nodes_removed: usize,
}

/// Undirected connected components, in order of their first node.
pub fn connected_components(graph: &DeBruijnGraph) -> Vec<Vec<NodeId>> {
    let mut visited = bitvec![0; graph.id_bound()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for start in graph.nodes() {
        if visited[start.index()] {
            continue;
        }
        visited.set(start.index(), true);
        queue.push_back(start);
        let mut component = Vec::new();

        while let Some(current) = queue.pop_front() {
            component.push(current);
            for neighbor in graph.neighbors_undirected(current) {
                if !visited[neighbor.index()] {
                    visited.set(neighbor.index(), true);
                    queue.push_back(neighbor);
                }
            }
        }
        components.push(component);
    }
    components
}

/// Delete every connected component with fewer than `min_component_size`
/// nodes. Returns the number of nodes removed.
pub fn remove_islands(graph: &mut DeBruijnGraph, min_component_size: usize) -> usize {
    let islands: Vec<Vec<NodeId>> = connected_components(graph)
        .into_iter()
        .filter(|component| component.len() < min_component_size)
        .collect();

    let mut removed = 0;
    for island in &islands {
        for &node in island {
            // Neighbours of a removed node may already have been evicted
            if graph.contains(node) {
                graph.remove_node(node);
            }
            removed += 1;
        }
    }
    debug!("Removed {} islands ({} nodes)", islands.len(), removed);
    removed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TipEnd {
    /// Dead end with no successors, walked backwards
    Sink,
    /// Dead end with no predecessors, walked forwards
    Source,
}

/// A short dead-end path hanging off an anchor node.
#[derive(Debug, Clone)]
struct Tip {
    end: TipEnd,
    /// Tip nodes from the dead end towards the anchor, anchor excluded
    nodes: Vec<NodeId>,
    anchor: NodeId,
    weight: u64,
}

impl Tip {
    fn attach(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }
}

fn trace_tip(graph: &DeBruijnGraph, dead_end: NodeId, end: TipEnd, max_len: usize) -> Option<Tip> {
    let mut nodes = vec![dead_end];
    let mut weight = 0;
    let mut current = dead_end;

    loop {
        if nodes.len() > max_len {
            return None;
        }
        let (next, edge_weight, is_anchor) = match end {
            TipEnd::Sink => {
                if graph.in_degree(current) != 1 {
                    return None;
                }
                let pred = graph.predecessors(current)[0];
                let w = graph.edge_weight(pred, current)?;
                (pred, w, graph.out_degree(pred) > 1)
            }
            TipEnd::Source => {
                if graph.out_degree(current) != 1 {
                    return None;
                }
                let edge = graph.out_edges(current)[0];
                (edge.to, edge.weight, graph.in_degree(edge.to) > 1)
            }
        };
        weight += edge_weight;

        if is_anchor {
            return Some(Tip {
                end,
                nodes,
                anchor: next,
                weight,
            });
        }
        if nodes.contains(&next) {
            return None;
        }
        nodes.push(next);
        current = next;
    }
}

/// Heaviest edge at the anchor that does not lead into the tip.
fn best_alternative(graph: &DeBruijnGraph, tip: &Tip) -> Option<u64> {
    let attach = tip.attach();
    match tip.end {
        TipEnd::Sink => graph
            .out_edges(tip.anchor)
            .iter()
            .filter(|edge| edge.to != attach)
            .map(|edge| edge.weight)
            .max(),
        TipEnd::Source => graph
            .predecessors(tip.anchor)
            .iter()
            .filter(|&&pred| pred != attach)
            .filter_map(|&pred| graph.edge_weight(pred, tip.anchor))
            .max(),
    }
}

fn should_remove(graph: &DeBruijnGraph, tip: &Tip, min_coverage_ratio: f64) -> bool {
    if tip.nodes.len() < 2 {
        return true;
    }
    match best_alternative(graph, tip) {
        None => true,
        Some(alternative) => (tip.weight as f64) < min_coverage_ratio * alternative as f64,
    }
}

fn find_tip(graph: &DeBruijnGraph, node: NodeId, tip_max_len: usize) -> Option<Tip> {
    let (in_degree, out_degree) = (graph.in_degree(node), graph.out_degree(node));
    if out_degree == 0 && in_degree > 0 {
        trace_tip(graph, node, TipEnd::Sink, tip_max_len)
    } else if in_degree == 0 && out_degree > 0 {
        trace_tip(graph, node, TipEnd::Source, tip_max_len)
    } else {
        None
    }
}

/// Remove short dead-end paths, repeating until no tip qualifies or
/// `max_iterations` passes have run. Returns the number of nodes removed.
///
/// A tip is removed when it has a single node, when its anchor has no other
/// edge on the tip's side, or when its accumulated weight is below
/// `min_coverage_ratio` times the anchor's heaviest alternative edge.
pub fn remove_tips(
    graph: &mut DeBruijnGraph,
    tip_max_len: usize,
    min_coverage_ratio: f64,
    max_iterations: usize,
) -> usize {
    let mut total = 0;
    for iteration in 0..max_iterations {
        let candidates: Vec<NodeId> = graph.nodes().collect();
        let mut removed = 0;
        for node in candidates {
            if !graph.contains(node) {
                continue;
            }
            let tip = match find_tip(graph, node, tip_max_len) {
                Some(tip) => tip,
                None => continue,
            };
            if !should_remove(graph, &tip, min_coverage_ratio) {
                continue;
            }
            for &tip_node in &tip.nodes {
                if graph.remove_node(tip_node) {
                    removed += 1;
                }
            }
        }
        debug!("Tip pass {}: removed {} nodes", iteration + 1, removed);
        total += removed;
        if removed == 0 {
            return total;
        }
    }
    warn!("Tip removal stopped at the {}-pass limit", max_iterations);
    total
}

/// One side of a candidate bubble.
#[derive(Debug, Clone)]
struct BubbleArm {
    path: Vec<NodeId>,
    weight: u64,
}

impl BubbleArm {
    fn end(&self) -> NodeId {
        self.path[self.path.len() - 1]
    }

    fn interior(&self) -> &[NodeId] {
        &self.path[..self.path.len() - 1]
    }
}

fn walk_arm(graph: &DeBruijnGraph, split: NodeId, arm: usize, max_steps: usize) -> BubbleArm {
    let first = graph.out_edges(split)[arm];
    let mut path = vec![first.to];
    let mut weight = first.weight;
    let mut current = first.to;

    for _ in 0..max_steps {
        if graph.out_degree(current) != 1 || graph.in_degree(current) != 1 {
            break;
        }
        let next = graph.out_edges(current)[0];
        weight += next.weight;
        path.push(next.to);
        current = next.to;
    }
    BubbleArm { path, weight }
}

/// Pop the weaker arm of a two-way split if both arms merge on one node.
fn pop_bubble_at(graph: &mut DeBruijnGraph, split: NodeId, max_bubble_len: usize) -> bool {
    let first = walk_arm(graph, split, 0, max_bubble_len);
    let second = walk_arm(graph, split, 1, max_bubble_len);

    let merge = first.end();
    if merge != second.end() || merge == split {
        return false;
    }

    // Equal weights pop the second-listed arm
    let weaker = if first.weight < second.weight {
        &first
    } else {
        &second
    };

    if weaker.interior().is_empty() {
        return graph.remove_edge(split, merge).is_some();
    }
    if weaker.interior().contains(&split) {
        return false;
    }
    for &node in weaker.interior() {
        graph.remove_node(node);
    }
    true
}

/// Collapse simple bubbles: a node with exactly two successors whose
/// pass-through arms, each at most `max_bubble_len` steps long, meet at the
/// same node. Repeats until nothing pops or `max_iterations` passes have
/// run. Returns the number of bubbles popped.
pub fn pop_bubbles(graph: &mut DeBruijnGraph, max_bubble_len: usize, max_iterations: usize) -> usize {
    let mut total = 0;
    for iteration in 0..max_iterations {
        let splits: Vec<NodeId> = graph.nodes().collect();
        let mut popped = 0;
        for split in splits {
            if !graph.contains(split) || graph.out_degree(split) != 2 {
                continue;
            }
            if pop_bubble_at(graph, split, max_bubble_len) {
                popped += 1;
            }
        }
        debug!("Bubble pass {}: popped {}", iteration + 1, popped);
        total += popped;
        if popped == 0 {
            return total;
        }
    }
    warn!("Bubble popping stopped at the {}-pass limit", max_iterations);
    total
}

/// Islands, then tips, then bubbles if enabled, then tips again.
pub fn clean_graph(graph: &mut DeBruijnGraph, config: &AssemblyConfig) -> CleaningReport {
    let mut report = CleaningReport::default();

    report.island_nodes_removed = remove_islands(graph, config.min_component_size);
    info!(
        "Islands: removed {} nodes, {} nodes remain",
        report.island_nodes_removed,
        graph.node_count()
    );

    report.tip_nodes_removed = remove_tips(
        graph,
        config.tip_max_len,
        config.min_coverage_ratio,
        config.max_clean_iterations,
    );
    info!(
        "Tips: removed {} nodes, {} nodes remain",
        report.tip_nodes_removed,
        graph.node_count()
    );

    if config.pop_bubbles {
        report.bubbles_popped = pop_bubbles(graph, config.max_bubble_len, config.max_clean_iterations);
        info!(
            "Bubbles: popped {}, {} nodes remain",
            report.bubbles_popped,
            graph.node_count()
        );
    }

    report.late_tip_nodes_removed = remove_tips(
        graph,
        config.tip_max_len,
        config.min_coverage_ratio,
        config.max_clean_iterations,
    );
    info!(
        "Tips after bubbles: removed {} nodes, {} nodes remain",
        report.late_tip_nodes_removed,
        graph.node_count()
    );

    report
}
