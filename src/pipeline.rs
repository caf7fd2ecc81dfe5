//! End-to-end assembly: reads to k-mers to graph to contigs.

use crate::cleaning::{clean_graph, CleaningReport};
use crate::config::AssemblyConfig;
use crate::correction::adaptive_correction;
use crate::error::{AssemblyError, Result};
use crate::fasta::load_reads;
use crate::graph::{DeBruijnGraph, GraphStats};
use crate::kmers::{count_kmers, kmer_histogram, KmerCounts};
use crate::repeat_resolver::{resolve_repeats, ResolverReport};
use crate::report::write_outputs;
use crate::stats::ContigStats;
use crate::traversal::extract_contigs;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

/// Result of running the graph engine on one k-mer table.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub contigs: Vec<String>,
    pub stats: ContigStats,
    /// Graph size straight after construction
    pub graph_before: GraphStats,
    /// Graph size after repeat resolution and cleaning
    pub graph_after: GraphStats,
    pub resolver: ResolverReport,
    pub cleaning: CleaningReport,
}

impl Assembly {
    /// Coverage cutoff applied to the graph, if one was estimated
    pub fn coverage_cutoff(&self) -> Option<u64> {
        self.resolver.coverage_cutoff
    }
}

/// Everything produced by a run from reads.
#[derive(Debug, Clone)]
pub struct AssemblyRun {
    pub num_reads: usize,
    /// Length of the first read, as a sample of the input
    pub example_read_len: usize,
    pub distinct_kmers: usize,
    pub histogram: BTreeMap<u64, u64>,
    pub assembly: Assembly,
}

/// Build, simplify and traverse the graph for one k-mer table.
pub fn assemble_kmers(counts: &KmerCounts, config: &AssemblyConfig) -> Result<Assembly> {
    config.validate()?;

    let mut graph =
        DeBruijnGraph::from_kmer_counts(counts, config.kmer_length, config.min_kmer_count)?;
    let graph_before = graph.stats();
    info!(
        "Graph before cleaning: {} nodes, {} edges",
        graph_before.nodes, graph_before.edges
    );

    let resolver = resolve_repeats(&mut graph, config);
    let cleaning = clean_graph(&mut graph, config);
    debug_assert!(graph.verify().is_ok(), "graph bookkeeping drifted");

    let graph_after = graph.stats();
    info!(
        "Graph after cleaning: {} nodes, {} edges",
        graph_after.nodes, graph_after.edges
    );

    let contigs = extract_contigs(&graph, config.min_contig_len);
    let stats = ContigStats::from_contigs(&contigs);
    info!(
        "Generated {} contigs >= {} bp (total {} bp, N50 {})",
        stats.num_contigs, config.min_contig_len, stats.total_length, stats.n50
    );

    Ok(Assembly {
        contigs,
        stats,
        graph_before,
        graph_after,
        resolver,
        cleaning,
    })
}

/// Correct reads (if enabled), count k-mers and assemble.
pub fn run_assembly(reads: &[String], config: &AssemblyConfig) -> Result<AssemblyRun> {
    config.validate()?;
    if reads.is_empty() {
        return Err(AssemblyError::empty_input("no reads to assemble"));
    }

    let corrected;
    let reads = if config.correct_reads {
        corrected = adaptive_correction(reads);
        corrected.as_slice()
    } else {
        reads
    };

    let counts = count_kmers(reads, config.kmer_length)?;
    let histogram = kmer_histogram(&counts);
    debug!(
        "{} distinct {}-mers, {} histogram bins",
        counts.len(),
        config.kmer_length,
        histogram.len()
    );

    let assembly = assemble_kmers(&counts, config)?;
    Ok(AssemblyRun {
        num_reads: reads.len(),
        example_read_len: reads.first().map(|r| r.len()).unwrap_or(0),
        distinct_kmers: counts.len(),
        histogram,
        assembly,
    })
}

/// Load reads from FASTA, assemble them, and write every output file into
/// `outdir`. The directory is only created once the reads have loaded.
pub fn run_assembly_to_dir(
    input: &Path,
    outdir: &Path,
    config: &AssemblyConfig,
) -> Result<AssemblyRun> {
    config.validate()?;
    let reads = load_reads(input)?;
    let run = run_assembly(&reads, config)?;
    write_outputs(outdir, input, config, &run)?;
    info!("Results in: {}", outdir.display());
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> AssemblyConfig {
        AssemblyConfig {
            kmer_length: 5,
            min_kmer_count: 1,
            min_component_size: 1,
            min_contig_len: 1,
            correct_reads: false,
            ..AssemblyConfig::default()
        }
    }

    #[test]
    fn test_assemble_linear_kmers() {
        let seq = "ACGTTGCAAGGCTTAC";
        let counts = count_kmers(&[seq], 5).unwrap();
        let counts: KmerCounts = counts.into_iter().map(|(k, _)| (k, 10)).collect();

        let assembly = assemble_kmers(&counts, &small_config()).unwrap();
        assert_eq!(assembly.contigs, vec![seq.to_string()]);
        assert_eq!(assembly.stats.n50, seq.len());
        assert_eq!(assembly.graph_before, assembly.graph_after);
        assert_eq!(assembly.coverage_cutoff(), Some(2));
    }

    #[test]
    fn test_empty_kmer_table() {
        let counts = KmerCounts::new();
        assert!(matches!(
            assemble_kmers(&counts, &small_config()),
            Err(AssemblyError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_wrong_kmer_length() {
        let mut counts = KmerCounts::new();
        counts.insert("ACGTAC".to_string(), 4);
        assert!(matches!(
            assemble_kmers(&counts, &small_config()),
            Err(AssemblyError::InvalidKmerLength { expected: 5, found: 6 })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AssemblyConfig {
            kmer_length: 0,
            ..small_config()
        };
        assert!(matches!(
            run_assembly(&["ACGTACGT".to_string()], &config),
            Err(AssemblyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_run_assembly_no_reads() {
        let reads: Vec<String> = Vec::new();
        assert!(matches!(
            run_assembly(&reads, &small_config()),
            Err(AssemblyError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_all_kmers_filtered_gives_no_contigs() {
        let reads = vec!["ACGTTGCAAGGC".to_string()];
        let config = AssemblyConfig {
            min_kmer_count: 5,
            ..small_config()
        };
        let run = run_assembly(&reads, &config).unwrap();
        assert!(run.assembly.contigs.is_empty());
        assert_eq!(run.assembly.stats, ContigStats::default());
        assert_eq!(run.num_reads, 1);
        assert_eq!(run.distinct_kmers, 8);
    }
}
