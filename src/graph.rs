//! Weighted de Bruijn graph store.
//!
//! Nodes are (k-1)-mers interned into a contiguous label arena and addressed
//! by [`NodeId`]. Every node owns an ordered list of weighted outgoing edges
//! and a list of predecessors, so out/in degree are always the lengths of
//! those lists and cannot drift from the edge set. All mutation goes through
//! [`DeBruijnGraph::add_edge`], [`DeBruijnGraph::remove_edge`] and
//! [`DeBruijnGraph::remove_node`].

use crate::error::{AssemblyError, Result};
use crate::kmers::KmerCounts;
use bitvec::prelude::*;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Index of a node in the label arena.
///
/// Ids are never reused: once a node is evicted its id stays dead, and
/// re-inserting the same label allocates a fresh slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn from_index(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize);
        NodeId(index as u32)
    }

    /// Id for a fresh arena slot, failing once the arena outgrows `u32`.
    pub fn try_from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(NodeId)
            .map_err(|_| AssemblyError::CapacityExceeded {
                limit: u32::MAX as usize + 1,
            })
    }

    /// Position of this node in the arena
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A weighted outgoing edge. The edge stands for one distinct k-mer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutEdge {
    pub to: NodeId,
    pub weight: u64,
}

/// Node and edge counts of a graph snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
}

/// Directed weighted de Bruijn graph over (k-1)-mers.
#[derive(Debug, Clone)]
pub struct DeBruijnGraph {
    k: usize,
    /// Arena of node labels, slot `i` spans `[i * (k-1), (i + 1) * (k-1))`.
    labels: Vec<u8>,
    index: HashMap<Vec<u8>, NodeId>,
    present: BitVec,
    out_edges: Vec<Vec<OutEdge>>,
    in_edges: Vec<Vec<NodeId>>,
    live_nodes: usize,
    edge_count: usize,
}

impl DeBruijnGraph {
    /// Create an empty graph for k-mers of length `k` (nodes of length k-1).
    pub fn new(k: usize) -> Result<Self> {
        if k < 2 {
            return Err(AssemblyError::invalid_parameter(format!(
                "k-mer length must be at least 2, got {}",
                k
            )));
        }
        Ok(DeBruijnGraph {
            k,
            labels: Vec::new(),
            index: HashMap::new(),
            present: BitVec::new(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
            live_nodes: 0,
            edge_count: 0,
        })
    }

    /// Build a graph from a k-mer count table.
    ///
    /// K-mers with a count below `min_count` are skipped. Every retained
    /// k-mer becomes an edge from its prefix to its suffix weighted by its
    /// count. K-mers are inserted in lexicographic order so node ids and
    /// edge order do not depend on hash iteration order.
    pub fn from_kmer_counts(counts: &KmerCounts, k: usize, min_count: u64) -> Result<Self> {
        if counts.is_empty() {
            return Err(AssemblyError::empty_input("k-mer count table is empty"));
        }
        let mut graph = DeBruijnGraph::new(k)?;

        let mut retained: Vec<(&str, u64)> = counts
            .iter()
            .filter(|(_, count)| **count >= min_count)
            .map(|(kmer, &count)| (kmer.as_str(), count))
            .collect();
        retained.sort_unstable_by(|a, b| a.0.cmp(b.0));

        for (kmer, count) in &retained {
            if kmer.len() != k {
                return Err(AssemblyError::InvalidKmerLength {
                    expected: k,
                    found: kmer.len(),
                });
            }
            let bytes = kmer.as_bytes();
            graph.add_edge(&bytes[..k - 1], &bytes[1..], *count)?;
        }

        if retained.is_empty() {
            warn!(
                "All {} k-mers fell below min_kmer_count={}, graph is empty",
                counts.len(),
                min_count
            );
        }
        debug!(
            "Built graph from {} of {} k-mers: {} nodes, {} edges",
            retained.len(),
            counts.len(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Length of every node label (k-1)
    pub fn node_len(&self) -> usize {
        self.k - 1
    }

    pub fn node_count(&self) -> usize {
        self.live_nodes
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of arena slots ever allocated; every `NodeId::index` is below it
    pub fn id_bound(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live_nodes == 0
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.live_nodes,
            edges: self.edge_count,
        }
    }

    /// Look up the id of a live node by its label
    pub fn node_id(&self, label: &[u8]) -> Option<NodeId> {
        self.index.get(label).copied()
    }

    /// Label of a node. Evicted ids still resolve to their former label.
    pub fn label(&self, node: NodeId) -> &[u8] {
        let len = self.node_len();
        let start = node.index() * len;
        &self.labels[start..start + len]
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.present
            .get(node.index())
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// Live nodes in arena (insertion) order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.present.iter_ones().map(NodeId::from_index)
    }

    /// Outgoing edges of a node, in insertion order
    pub fn out_edges(&self, node: NodeId) -> &[OutEdge] {
        self.out_edges
            .get(node.index())
            .map(|edges| edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(node).iter().map(|edge| edge.to)
    }

    pub fn predecessors(&self, node: NodeId) -> &[NodeId] {
        self.in_edges
            .get(node.index())
            .map(|preds| preds.as_slice())
            .unwrap_or(&[])
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_edges(node).len()
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.predecessors(node).len()
    }

    pub fn edge_weight(&self, from: NodeId, to: NodeId) -> Option<u64> {
        self.out_edges(from)
            .iter()
            .find(|edge| edge.to == to)
            .map(|edge| edge.weight)
    }

    /// All edges as `(from, to, weight)` triples
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, u64)> + '_ {
        self.nodes().flat_map(move |from| {
            self.out_edges(from)
                .iter()
                .map(move |edge| (from, edge.to, edge.weight))
        })
    }

    /// Successors followed by predecessors, without duplicates.
    pub fn neighbors_undirected(&self, node: NodeId) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = self.successors(node).collect();
        for &pred in self.predecessors(node) {
            if !neighbors.contains(&pred) {
                neighbors.push(pred);
            }
        }
        neighbors
    }

    /// Add `weight` to the edge `from -> to`, creating nodes and the edge
    /// as needed. Repeated calls for the same pair accumulate weight on a
    /// single edge. A zero weight is ignored.
    pub fn add_edge(&mut self, from: &[u8], to: &[u8], weight: u64) -> Result<()> {
        for label in [from, to] {
            if label.len() != self.node_len() {
                return Err(AssemblyError::InvalidNodeLength {
                    expected: self.node_len(),
                    found: label.len(),
                });
            }
        }
        if weight == 0 {
            return Ok(());
        }
        let u = self.intern(from)?;
        let v = self.intern(to)?;
        self.add_edge_between(u, v, weight);
        Ok(())
    }

    fn add_edge_between(&mut self, u: NodeId, v: NodeId, weight: u64) {
        let edges = &mut self.out_edges[u.index()];
        if let Some(edge) = edges.iter_mut().find(|edge| edge.to == v) {
            edge.weight += weight;
            return;
        }
        edges.push(OutEdge { to: v, weight });
        self.in_edges[v.index()].push(u);
        self.edge_count += 1;
    }

    fn intern(&mut self, label: &[u8]) -> Result<NodeId> {
        if let Some(&id) = self.index.get(label) {
            return Ok(id);
        }
        let id = NodeId::try_from_index(self.present.len())?;
        self.labels.extend_from_slice(label);
        self.present.push(true);
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.index.insert(label.to_vec(), id);
        self.live_nodes += 1;
        Ok(id)
    }

    /// Delete the edge `from -> to` and return its weight.
    ///
    /// Endpoints left without any edge are evicted. Removing an edge that
    /// does not exist is a no-op.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Option<u64> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        let edges = &mut self.out_edges[from.index()];
        let pos = edges.iter().position(|edge| edge.to == to)?;
        let removed = edges.remove(pos);
        if edges.is_empty() {
            *edges = Vec::new();
        }
        detach(&mut self.in_edges[to.index()], from);
        self.edge_count -= 1;

        self.evict_if_isolated(from);
        self.evict_if_isolated(to);
        Some(removed.weight)
    }

    /// Remove a node with all incident edges. Neighbours left without any
    /// edge are evicted as well. Returns false if the node was absent.
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        if !self.contains(node) {
            return false;
        }
        let outgoing = std::mem::take(&mut self.out_edges[node.index()]);
        let incoming = std::mem::take(&mut self.in_edges[node.index()]);
        self.edge_count -= outgoing.len();

        let mut touched = Vec::with_capacity(outgoing.len() + incoming.len());
        for edge in &outgoing {
            if edge.to != node {
                detach(&mut self.in_edges[edge.to.index()], node);
                touched.push(edge.to);
            }
        }
        for &pred in &incoming {
            if pred == node {
                continue;
            }
            let edges = &mut self.out_edges[pred.index()];
            if let Some(pos) = edges.iter().position(|edge| edge.to == node) {
                edges.remove(pos);
                self.edge_count -= 1;
            }
            touched.push(pred);
        }

        self.evict(node);
        for neighbor in touched {
            self.evict_if_isolated(neighbor);
        }
        true
    }

    fn evict_if_isolated(&mut self, node: NodeId) {
        if self.contains(node) && self.out_degree(node) == 0 && self.in_degree(node) == 0 {
            self.evict(node);
        }
    }

    fn evict(&mut self, node: NodeId) {
        let i = node.index();
        self.present.set(i, false);
        self.out_edges[i] = Vec::new();
        self.in_edges[i] = Vec::new();
        let len = self.k - 1;
        self.index.remove(&self.labels[i * len..(i + 1) * len]);
        self.live_nodes -= 1;
    }

    /// Cross-check every bookkeeping structure against the edge lists.
    pub fn verify(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let mut in_counts = vec![0usize; self.present.len()];
        let mut edges = 0;

        for node in self.nodes() {
            if self.out_degree(node) == 0 && self.in_degree(node) == 0 {
                errors.push(format!("node {} is present with no edges", node));
            }
            if self.index.get(self.label(node)) != Some(&node) {
                errors.push(format!("node {} is missing from the label index", node));
            }
            for edge in self.out_edges(node) {
                edges += 1;
                if edge.weight == 0 {
                    errors.push(format!("edge {} -> {} has zero weight", node, edge.to));
                }
                if !self.contains(edge.to) {
                    errors.push(format!("edge {} -> {} targets an evicted node", node, edge.to));
                    continue;
                }
                in_counts[edge.to.index()] += 1;
                if !self.predecessors(edge.to).contains(&node) {
                    errors.push(format!("{} not recorded as predecessor of {}", node, edge.to));
                }
            }
        }
        for node in self.nodes() {
            if in_counts[node.index()] != self.in_degree(node) {
                errors.push(format!(
                    "node {} in-degree {} disagrees with {} incoming edges",
                    node,
                    self.in_degree(node),
                    in_counts[node.index()]
                ));
            }
        }
        if edges != self.edge_count {
            errors.push(format!("edge count {} but {} edges stored", self.edge_count, edges));
        }
        if self.index.len() != self.live_nodes {
            errors.push(format!(
                "label index holds {} entries for {} live nodes",
                self.index.len(),
                self.live_nodes
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn detach(list: &mut Vec<NodeId>, node: NodeId) {
    if let Some(pos) = list.iter().position(|&n| n == node) {
        list.remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(graph: &DeBruijnGraph, label: &str) -> NodeId {
        graph.node_id(label.as_bytes()).unwrap()
    }

    #[test]
    fn test_node_id_bounds() {
        let last = NodeId::try_from_index(u32::MAX as usize).unwrap();
        assert_eq!(last.index(), u32::MAX as usize);
        assert!(matches!(
            NodeId::try_from_index(u32::MAX as usize + 1),
            Err(AssemblyError::CapacityExceeded { limit }) if limit == u32::MAX as usize + 1
        ));
    }

    #[test]
    fn test_add_edge_accumulates_weight() {
        let mut graph = DeBruijnGraph::new(4).unwrap();
        graph.add_edge(b"ACG", b"CGT", 3).unwrap();
        graph.add_edge(b"ACG", b"CGT", 2).unwrap();
        graph.add_edge(b"ACG", b"CGT", 1).unwrap();

        let u = id(&graph, "ACG");
        let v = id(&graph, "CGT");
        assert_eq!(graph.edge_weight(u, v), Some(6));
        assert_eq!(graph.out_degree(u), 1);
        assert_eq!(graph.in_degree(v), 1);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.verify().is_ok());
    }

    #[test]
    fn test_add_edge_rejects_wrong_label_length() {
        let mut graph = DeBruijnGraph::new(4).unwrap();
        let err = graph.add_edge(b"ACGT", b"CGT", 1).unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::InvalidNodeLength { expected: 3, found: 4 }
        ));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_zero_weight_is_ignored() {
        let mut graph = DeBruijnGraph::new(4).unwrap();
        graph.add_edge(b"ACG", b"CGT", 0).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_remove_edge_evicts_isolated_endpoints() {
        let mut graph = DeBruijnGraph::new(4).unwrap();
        graph.add_edge(b"ACG", b"CGT", 2).unwrap();
        graph.add_edge(b"CGT", b"GTA", 2).unwrap();

        let a = id(&graph, "ACG");
        let c = id(&graph, "CGT");
        assert_eq!(graph.remove_edge(a, c), Some(2));
        assert!(!graph.contains(a));
        assert!(graph.node_id(b"ACG").is_none());
        assert!(graph.contains(c));
        assert_eq!(graph.in_degree(c), 0);
        assert_eq!(graph.out_degree(c), 1);
        assert!(graph.verify().is_ok());

        // Second removal is a no-op
        assert_eq!(graph.remove_edge(a, c), None);
        assert!(graph.verify().is_ok());
    }

    #[test]
    fn test_remove_node_updates_neighbours() {
        let mut graph = DeBruijnGraph::new(4).unwrap();
        graph.add_edge(b"AAC", b"ACG", 1).unwrap();
        graph.add_edge(b"TAC", b"ACG", 1).unwrap();
        graph.add_edge(b"ACG", b"CGT", 1).unwrap();
        graph.add_edge(b"ACG", b"CGA", 1).unwrap();
        graph.add_edge(b"TAC", b"ACC", 1).unwrap();

        let hub = id(&graph, "ACG");
        let tac = id(&graph, "TAC");
        assert!(graph.remove_node(hub));

        assert!(!graph.contains(hub));
        assert!(graph.nodes().all(|n| n != hub));
        assert!(graph.edges().all(|(u, v, _)| u != hub && v != hub));
        // TAC keeps its other edge, the rest became isolated
        assert!(graph.contains(tac));
        assert_eq!(graph.out_degree(tac), 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.verify().is_ok());

        assert!(!graph.remove_node(hub));
    }

    #[test]
    fn test_self_loop_bookkeeping() {
        let mut graph = DeBruijnGraph::new(4).unwrap();
        graph.add_edge(b"AAA", b"AAA", 5).unwrap();
        let a = id(&graph, "AAA");
        assert_eq!(graph.in_degree(a), 1);
        assert_eq!(graph.out_degree(a), 1);
        assert_eq!(graph.neighbors_undirected(a), vec![a]);

        assert!(graph.remove_node(a));
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.verify().is_ok());
    }

    #[test]
    fn test_from_kmer_counts_filters_and_splits() {
        let mut counts = KmerCounts::new();
        counts.insert("ACGT".to_string(), 5);
        counts.insert("CGTA".to_string(), 3);
        counts.insert("GTAA".to_string(), 1);

        let graph = DeBruijnGraph::from_kmer_counts(&counts, 4, 2).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let acg = id(&graph, "ACG");
        let cgt = id(&graph, "CGT");
        assert_eq!(graph.edge_weight(acg, cgt), Some(5));
        assert!(graph.node_id(b"TAA").is_none());
    }

    #[test]
    fn test_from_kmer_counts_errors() {
        let counts = KmerCounts::new();
        assert!(matches!(
            DeBruijnGraph::from_kmer_counts(&counts, 4, 1),
            Err(AssemblyError::EmptyInput(_))
        ));

        let mut counts = KmerCounts::new();
        counts.insert("ACGTA".to_string(), 3);
        assert!(matches!(
            DeBruijnGraph::from_kmer_counts(&counts, 4, 1),
            Err(AssemblyError::InvalidKmerLength { expected: 4, found: 5 })
        ));
    }

    #[test]
    fn test_node_ids_follow_sorted_kmers() {
        let mut counts = KmerCounts::new();
        counts.insert("TTTT".to_string(), 2);
        counts.insert("AAAC".to_string(), 2);
        let graph = DeBruijnGraph::from_kmer_counts(&counts, 4, 1).unwrap();
        let order: Vec<&[u8]> = graph.nodes().map(|n| graph.label(n)).collect();
        assert_eq!(order, vec![&b"AAA"[..], &b"AAC"[..], &b"TTT"[..]]);
    }
}
