//! Unitig enumeration and contig rendering.
//!
//! A node is *internal* when it has exactly one predecessor and one
//! successor; every other node is a *boundary* where a unitig may start or
//! end. Walks consume edges, so every edge of the graph lands in exactly one
//! unitig.

use crate::graph::{DeBruijnGraph, NodeId};
use log::debug;
use std::collections::HashSet;

type UsedEdges = HashSet<(NodeId, NodeId)>;

/// Whether a node lies on exactly one unambiguous path
pub fn is_internal(graph: &DeBruijnGraph, node: NodeId) -> bool {
    graph.in_degree(node) == 1 && graph.out_degree(node) == 1
}

/// Every maximal unambiguous path of the graph.
///
/// Boundary nodes are expanded first, in arena order; a second sweep over
/// nodes that still have unconsumed out-edges picks up isolated cycles.
/// The first walk leaving a start is prefixed with the chain that leads
/// into it, so a branch node reached from an unbranched chain ends up
/// inside that walk. A cycle path repeats its first node at the end.
pub fn extract_unitigs(graph: &DeBruijnGraph) -> Vec<Vec<NodeId>> {
    let mut used = UsedEdges::new();
    let mut unitigs = Vec::new();

    let boundary: Vec<NodeId> = graph
        .nodes()
        .filter(|&node| !is_internal(graph, node))
        .collect();
    for &start in &boundary {
        walk_from(graph, start, &mut used, &mut unitigs);
    }
    let from_boundary = unitigs.len();

    for start in graph.nodes() {
        walk_from(graph, start, &mut used, &mut unitigs);
    }

    debug!(
        "Found {} unitigs ({} from boundary nodes, {} cycles)",
        unitigs.len(),
        from_boundary,
        unitigs.len() - from_boundary
    );
    unitigs
}

/// Walk every unconsumed out-edge of `start`.
fn walk_from(
    graph: &DeBruijnGraph,
    start: NodeId,
    used: &mut UsedEdges,
    unitigs: &mut Vec<Vec<NodeId>>,
) {
    let mut first = true;
    for edge in graph.out_edges(start) {
        if used.contains(&(start, edge.to)) {
            continue;
        }
        let forward = walk_forward(graph, start, edge.to, used);
        if !first {
            unitigs.push(forward);
            continue;
        }
        first = false;

        let mut path = walk_backward(graph, start, used);
        if path.is_empty() {
            unitigs.push(forward);
        } else {
            path.reverse();
            path.extend(forward);
            unitigs.push(path);
        }
    }
}

/// Follow `start -> next` and onwards while the path stays internal.
fn walk_forward(
    graph: &DeBruijnGraph,
    start: NodeId,
    next: NodeId,
    used: &mut UsedEdges,
) -> Vec<NodeId> {
    let mut forward = vec![start, next];
    used.insert((start, next));

    let mut current = next;
    while is_internal(graph, current) {
        let succ = graph.out_edges(current)[0].to;
        if !used.insert((current, succ)) {
            break;
        }
        forward.push(succ);
        current = succ;
    }
    forward
}

/// Predecessors of `start`, nearest first, reached through the only
/// unconsumed incoming edge at each step.
///
/// The walk passes through internal nodes and stops after the first
/// boundary node it adds.
fn walk_backward(graph: &DeBruijnGraph, start: NodeId, used: &mut UsedEdges) -> Vec<NodeId> {
    let mut backward = Vec::new();
    let mut current = start;
    loop {
        let mut unused = graph
            .predecessors(current)
            .iter()
            .filter(|&&pred| !used.contains(&(pred, current)));
        let pred = match (unused.next(), unused.next()) {
            (Some(&pred), None) => pred,
            _ => break,
        };
        used.insert((pred, current));
        backward.push(pred);
        if !is_internal(graph, pred) {
            break;
        }
        current = pred;
    }
    backward
}

/// Spell a node path as DNA: the first label, then the last base of every
/// following node.
///
/// A path of `m` nodes yields `(k-1) + (m-1)` bases.
pub fn path_to_sequence(graph: &DeBruijnGraph, path: &[NodeId]) -> String {
    let Some((&first, rest)) = path.split_first() else {
        return String::new();
    };
    let mut bytes = Vec::with_capacity(graph.node_len() + rest.len());
    bytes.extend_from_slice(graph.label(first));
    for &node in rest {
        if let Some(&last) = graph.label(node).last() {
            bytes.push(last);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Render all unitigs, drop those shorter than `min_contig_len`, and remove
/// exact duplicates keeping the first occurrence.
pub fn extract_contigs(graph: &DeBruijnGraph, min_contig_len: usize) -> Vec<String> {
    let unitigs = extract_unitigs(graph);
    let total = unitigs.len();
    let sequences = unitigs
        .iter()
        .map(|path| path_to_sequence(graph, path))
        .filter(|seq| seq.len() >= min_contig_len)
        .collect();
    let contigs = dedup_in_order(sequences);
    debug!(
        "Kept {} of {} unitigs at min_contig_len={}",
        contigs.len(),
        total,
        min_contig_len
    );
    contigs
}

fn dedup_in_order(sequences: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    sequences
        .into_iter()
        .filter(|seq| seen.insert(seq.clone()))
        .collect()
}
