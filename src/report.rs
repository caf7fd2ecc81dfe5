//! Run output files.
//!
//! Every file here is a read-only projection of an [`AssemblyRun`]; nothing
//! is fed back into the engine.

use crate::config::AssemblyConfig;
use crate::error::Result;
use crate::fasta::write_contigs;
use crate::graph::GraphStats;
use crate::pipeline::AssemblyRun;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const PARAMS_FILE: &str = "params_used.json";
pub const REPORT_FILE: &str = "report.txt";
pub const HISTOGRAM_FILE: &str = "kmer_histogram.tsv";
pub const STATS_BEFORE_FILE: &str = "graph_stats_before_cleaning.tsv";
pub const STATS_AFTER_FILE: &str = "graph_stats_after_cleaning.tsv";
pub const CONTIGS_FILE: &str = "contigs.fasta";
pub const CONTIG_STATS_FILE: &str = "contig_stats.json";

#[derive(Serialize)]
struct ParamsRecord<'a> {
    input: String,
    outdir: String,
    #[serde(flatten)]
    config: &'a AssemblyConfig,
}

/// Write the parameters of a run. The file loads back as an
/// [`AssemblyConfig`]; the extra path fields are ignored.
pub fn write_params(path: &Path, input: &Path, outdir: &Path, config: &AssemblyConfig) -> Result<()> {
    let record = ParamsRecord {
        input: input.display().to_string(),
        outdir: outdir.display().to_string(),
        config,
    };
    fs::write(path, serde_json::to_string_pretty(&record)?)?;
    Ok(())
}

/// `count\tn_kmers` rows in ascending count order.
pub fn write_kmer_histogram(path: &Path, histogram: &BTreeMap<u64, u64>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "count\tn_kmers")?;
    for (count, n_kmers) in histogram {
        writeln!(writer, "{}\t{}", count, n_kmers)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_graph_stats(path: &Path, stats: &GraphStats) -> Result<()> {
    fs::write(path, format!("nodes\t{}\nedges\t{}\n", stats.nodes, stats.edges))?;
    Ok(())
}

/// Human-readable summary of a run.
pub fn render_report(input: &Path, outdir: &Path, config: &AssemblyConfig, run: &AssemblyRun) -> String {
    let assembly = &run.assembly;
    let stats = &assembly.stats;
    let mut lines = vec![
        "Genome assembly pipeline report".to_string(),
        format!("Input: {}", input.display()),
        format!("Output dir: {}", outdir.display()),
        format!("k: {}", config.kmer_length),
        format!("min_kmer_count: {}", config.min_kmer_count),
        format!("min_component_size: {}", config.min_component_size),
        format!("tip_max_len: {}", config.tip_max_len),
        format!("min_coverage_ratio: {}", config.min_coverage_ratio),
        format!("pop_bubbles: {}", config.pop_bubbles),
    ];
    if config.pop_bubbles {
        lines.push(format!("max_bubble_len: {}", config.max_bubble_len));
    }
    lines.push(format!("read_correction: {}", config.correct_reads));
    lines.push(String::new());

    lines.push(format!("Reads loaded: {}", run.num_reads));
    lines.push(format!("Read length (example): {}", run.example_read_len));
    lines.push(format!("Distinct k-mers (before filtering): {}", run.distinct_kmers));
    lines.push(format!("Histogram saved: {}", HISTOGRAM_FILE));
    lines.push(String::new());

    lines.push("Graph stats before cleaning:".to_string());
    lines.push(format!("  nodes: {}", assembly.graph_before.nodes));
    lines.push(format!("  edges: {}", assembly.graph_before.edges));
    match assembly.coverage_cutoff() {
        Some(cutoff) => lines.push(format!(
            "Coverage cutoff: {} ({} edges removed)",
            cutoff, assembly.resolver.edges_below_cutoff
        )),
        None => lines.push("Coverage cutoff: disabled".to_string()),
    }
    lines.push(format!("Tour bus branches resolved: {}", assembly.resolver.branches_resolved));
    lines.push(format!("Island nodes removed: {}", assembly.cleaning.island_nodes_removed));
    lines.push(format!(
        "Tip nodes removed: {}",
        assembly.cleaning.tip_nodes_removed + assembly.cleaning.late_tip_nodes_removed
    ));
    lines.push(format!("Bubbles popped: {}", assembly.cleaning.bubbles_popped));
    lines.push("Graph stats after cleaning:".to_string());
    lines.push(format!("  nodes: {}", assembly.graph_after.nodes));
    lines.push(format!("  edges: {}", assembly.graph_after.edges));
    lines.push(String::new());

    lines.push(format!("Contigs written: {}", CONTIGS_FILE));
    lines.push(format!("Contigs >= {} bp: {}", config.min_contig_len, stats.num_contigs));
    lines.push(String::new());
    lines.push(format!("num_contigs: {}", stats.num_contigs));
    lines.push(format!("total_length: {}", stats.total_length));
    lines.push(format!("longest: {}", stats.longest));
    lines.push(format!("shortest: {}", stats.shortest));
    lines.push(format!("mean_length: {:.1}", stats.mean_length));
    lines.push(format!("n50: {}", stats.n50));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Write every output file of a run into `outdir`.
pub fn write_outputs(outdir: &Path, input: &Path, config: &AssemblyConfig, run: &AssemblyRun) -> Result<()> {
    fs::create_dir_all(outdir)?;
    let assembly = &run.assembly;

    write_params(&outdir.join(PARAMS_FILE), input, outdir, config)?;
    write_kmer_histogram(&outdir.join(HISTOGRAM_FILE), &run.histogram)?;
    write_graph_stats(&outdir.join(STATS_BEFORE_FILE), &assembly.graph_before)?;
    write_graph_stats(&outdir.join(STATS_AFTER_FILE), &assembly.graph_after)?;
    write_contigs(&assembly.contigs, &outdir.join(CONTIGS_FILE), "contig")?;
    fs::write(
        outdir.join(CONTIG_STATS_FILE),
        serde_json::to_string_pretty(&assembly.stats)?,
    )?;
    fs::write(outdir.join(REPORT_FILE), render_report(input, outdir, config, run))?;
    Ok(())
}
