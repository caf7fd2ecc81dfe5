pub mod cleaning;
pub mod cli;
pub mod config;
pub mod correction;
pub mod error;
pub mod fasta;
pub mod graph;
pub mod grid_search;
pub mod kmers;
pub mod pipeline;
pub mod repeat_resolver;
pub mod report;
pub mod stats;
pub mod traversal;

pub use config::AssemblyConfig;
pub use error::{AssemblyError, Result};
pub use graph::{DeBruijnGraph, GraphStats, NodeId};
pub use kmers::KmerCounts;
pub use pipeline::{assemble_kmers, run_assembly, run_assembly_to_dir, Assembly, AssemblyRun};
pub use stats::ContigStats;
