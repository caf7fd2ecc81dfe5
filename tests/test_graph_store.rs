use dbgrush::graph::{DeBruijnGraph, NodeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

fn random_label(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect()
}

fn assert_absent(graph: &DeBruijnGraph, node: NodeId) {
    assert!(!graph.contains(node));
    assert!(graph.nodes().all(|n| n != node));
    assert_eq!(graph.in_degree(node), 0);
    assert_eq!(graph.out_degree(node), 0);
    assert!(graph.edges().all(|(u, v, _)| u != node && v != node));
}

#[test]
fn random_mutations_keep_bookkeeping_consistent() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut graph = DeBruijnGraph::new(4).unwrap();

    for step in 0..2000 {
        match rng.gen_range(0..10) {
            0..=5 => {
                let from = random_label(&mut rng, 3);
                let to = random_label(&mut rng, 3);
                let weight = rng.gen_range(1..6);
                graph.add_edge(&from, &to, weight).unwrap();
            }
            6..=8 => {
                let edges: Vec<_> = graph.edges().collect();
                if !edges.is_empty() {
                    let (u, v, w) = edges[rng.gen_range(0..edges.len())];
                    assert_eq!(graph.remove_edge(u, v), Some(w));
                    assert_eq!(graph.edge_weight(u, v), None);
                }
            }
            _ => {
                let nodes: Vec<_> = graph.nodes().collect();
                if !nodes.is_empty() {
                    let node = nodes[rng.gen_range(0..nodes.len())];
                    assert!(graph.remove_node(node));
                    assert_absent(&graph, node);
                }
            }
        }
        if let Err(errors) = graph.verify() {
            panic!("step {}: {:?}", step, errors);
        }
    }
}

#[test]
fn repeated_additions_count_degree_once() {
    let mut graph = DeBruijnGraph::new(5).unwrap();
    let weights = [3, 1, 4, 1, 5];
    for &w in &weights {
        graph.add_edge(b"ACGT", b"CGTA", w).unwrap();
    }
    let u = graph.node_id(b"ACGT").unwrap();
    let v = graph.node_id(b"CGTA").unwrap();
    assert_eq!(graph.edge_weight(u, v), Some(weights.iter().sum()));
    assert_eq!(graph.out_degree(u), 1);
    assert_eq!(graph.in_degree(v), 1);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn removal_is_idempotent() {
    let mut graph = DeBruijnGraph::new(4).unwrap();
    graph.add_edge(b"AAC", b"ACG", 2).unwrap();
    graph.add_edge(b"ACG", b"CGT", 2).unwrap();
    let a = graph.node_id(b"AAC").unwrap();
    let b = graph.node_id(b"ACG").unwrap();

    assert!(graph.remove_node(b));
    assert_absent(&graph, b);
    assert!(graph.is_empty());
    assert!(!graph.remove_node(b));
    assert_eq!(graph.remove_edge(a, b), None);
    assert!(graph.verify().is_ok());
}

#[test]
fn evicted_label_can_return_with_new_id() {
    let mut graph = DeBruijnGraph::new(4).unwrap();
    graph.add_edge(b"AAC", b"ACG", 2).unwrap();
    let old = graph.node_id(b"AAC").unwrap();
    let target = graph.node_id(b"ACG").unwrap();
    graph.remove_edge(old, target);
    assert!(graph.is_empty());

    graph.add_edge(b"AAC", b"ACG", 1).unwrap();
    let new = graph.node_id(b"AAC").unwrap();
    assert_ne!(old, new);
    assert!(!graph.contains(old));
    assert_eq!(graph.label(new), b"AAC");
    assert!(graph.verify().is_ok());
}
