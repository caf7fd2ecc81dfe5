use crate::config::AssemblyConfig;
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dbgrush", version, about = "De novo de Bruijn graph assembler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file; explicit flags take precedence
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads (grid search only)
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble reads into contigs
    Assemble {
        /// Input reads FASTA file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (created if missing)
        #[arg(short, long)]
        outdir: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },
    /// Search a parameter grid and keep the best assembly
    Optimize {
        /// Input reads FASTA file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the best assembly
        #[arg(short, long)]
        outdir: PathBuf,
    },
}

/// Assembly parameter overrides. Unset flags keep the base value.
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    /// K-mer length [default: 31]
    #[arg(short = 'k', long)]
    pub kmer_length: Option<usize>,

    /// Minimum k-mer count kept in the graph [default: 2]
    #[arg(short = 'm', long)]
    pub min_kmer_count: Option<u64>,

    /// Minimum connected component size in nodes [default: 10]
    #[arg(long)]
    pub min_component_size: Option<usize>,

    /// Maximum tip length in nodes [default: 3]
    #[arg(long)]
    pub tip_max_len: Option<usize>,

    /// Tips below this fraction of the best alternative edge are removed [default: 0.5]
    #[arg(long)]
    pub min_coverage_ratio: Option<f64>,

    /// Enable simple bubble popping
    #[arg(long)]
    pub pop_bubbles: bool,

    /// Maximum bubble arm length [default: 5]
    #[arg(long)]
    pub max_bubble_len: Option<usize>,

    /// Minimum contig length to report [default: 300]
    #[arg(long)]
    pub min_contig_len: Option<usize>,

    /// Maximum branch length followed by Tour Bus [default: 10]
    #[arg(long)]
    pub max_repeat_length: Option<usize>,

    /// Skip coverage cutoff estimation
    #[arg(long)]
    pub no_auto_cutoff: bool,

    /// Skip Tour Bus repeat resolution
    #[arg(long)]
    pub no_tour_bus: bool,

    /// Skip read error correction
    #[arg(long)]
    pub no_correction: bool,
}

impl ParamArgs {
    /// Apply the flags that were given on top of `base`.
    pub fn apply(&self, mut config: AssemblyConfig) -> AssemblyConfig {
        if let Some(k) = self.kmer_length {
            config.kmer_length = k;
        }
        if let Some(count) = self.min_kmer_count {
            config.min_kmer_count = count;
        }
        if let Some(size) = self.min_component_size {
            config.min_component_size = size;
        }
        if let Some(len) = self.tip_max_len {
            config.tip_max_len = len;
        }
        if let Some(ratio) = self.min_coverage_ratio {
            config.min_coverage_ratio = ratio;
        }
        if self.pop_bubbles {
            config.pop_bubbles = true;
        }
        if let Some(len) = self.max_bubble_len {
            config.max_bubble_len = len;
        }
        if let Some(len) = self.min_contig_len {
            config.min_contig_len = len;
        }
        if let Some(len) = self.max_repeat_length {
            config.max_repeat_length = len;
        }
        if self.no_auto_cutoff {
            config.auto_cutoff = false;
        }
        if self.no_tour_bus {
            config.use_tour_bus = false;
        }
        if self.no_correction {
            config.correct_reads = false;
        }
        config
    }
}

impl Cli {
    /// Base configuration: the `--config` file if given, else defaults.
    pub fn base_config(&self) -> Result<AssemblyConfig> {
        match &self.config {
            Some(path) => AssemblyConfig::load(path),
            None => Ok(AssemblyConfig::default()),
        }
    }
}
