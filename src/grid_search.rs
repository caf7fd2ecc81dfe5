//! Parameter grid search over whole assembly runs.
//!
//! Every grid point is assembled from scratch on its own graph, so the
//! points run in parallel on the rayon pool while each run stays
//! single-threaded.

use crate::config::AssemblyConfig;
use crate::error::Result;
use crate::fasta::load_reads;
use crate::pipeline::{run_assembly, run_assembly_to_dir};
use crate::stats::ContigStats;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const RESULTS_FILE: &str = "optimization_results.json";
pub const BEST_PARAMS_FILE: &str = "best_params.json";

/// Values tried for each tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub kmer_lengths: Vec<usize>,
    pub min_kmer_counts: Vec<u64>,
    pub min_component_sizes: Vec<usize>,
    pub tip_max_lens: Vec<usize>,
    pub pop_bubbles: Vec<bool>,
    /// Only varied when bubble popping is on
    pub max_bubble_lens: Vec<usize>,
    pub min_contig_len: usize,
}

impl Default for ParamGrid {
    fn default() -> Self {
        ParamGrid {
            kmer_lengths: vec![17, 19, 21],
            min_kmer_counts: vec![2, 3],
            min_component_sizes: vec![5],
            tip_max_lens: vec![1, 2],
            pop_bubbles: vec![true, false],
            max_bubble_lens: vec![3, 5],
            min_contig_len: 300,
        }
    }
}

impl ParamGrid {
    /// Every grid point applied on top of `base`, in a fixed nesting order.
    pub fn configs(&self, base: &AssemblyConfig) -> Vec<AssemblyConfig> {
        let mut configs = Vec::new();
        for &kmer_length in &self.kmer_lengths {
            for &min_kmer_count in &self.min_kmer_counts {
                for &min_component_size in &self.min_component_sizes {
                    for &tip_max_len in &self.tip_max_lens {
                        for &pop_bubbles in &self.pop_bubbles {
                            let bubble_lens = if pop_bubbles {
                                self.max_bubble_lens.clone()
                            } else {
                                vec![base.max_bubble_len]
                            };
                            for max_bubble_len in bubble_lens {
                                configs.push(AssemblyConfig {
                                    kmer_length,
                                    min_kmer_count,
                                    min_component_size,
                                    tip_max_len,
                                    pop_bubbles,
                                    max_bubble_len,
                                    min_contig_len: self.min_contig_len,
                                    ..base.clone()
                                });
                            }
                        }
                    }
                }
            }
        }
        configs
    }
}

/// 0.6 × total length + 0.4 × N50, or 0 when there are no contigs.
pub fn score(stats: &ContigStats) -> f64 {
    if stats.num_contigs == 0 {
        return 0.0;
    }
    stats.total_length as f64 * 0.6 + stats.n50 as f64 * 0.4
}

/// Outcome of one grid point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub index: usize,
    pub config: AssemblyConfig,
    pub stats: Option<ContigStats>,
    pub score: f64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best: Option<usize>,
    pub trials: Vec<Trial>,
}

impl OptimizationResult {
    pub fn best_trial(&self) -> Option<&Trial> {
        self.best.and_then(|i| self.trials.get(i))
    }
}

/// Run every configuration on the same reads. Failed runs score 0.
pub fn evaluate(reads: &[String], configs: &[AssemblyConfig]) -> Vec<Trial> {
    let total = configs.len();
    configs
        .par_iter()
        .enumerate()
        .map(|(index, config)| match run_assembly(reads, config) {
            Ok(run) => {
                let stats = run.assembly.stats;
                let score = score(&stats);
                info!(
                    "[{}/{}] k={} min_kmer_count={} tip_max_len={} pop_bubbles={}: total={} N50={} score={:.1}",
                    index + 1,
                    total,
                    config.kmer_length,
                    config.min_kmer_count,
                    config.tip_max_len,
                    config.pop_bubbles,
                    stats.total_length,
                    stats.n50,
                    score
                );
                Trial {
                    index,
                    config: config.clone(),
                    stats: Some(stats),
                    score,
                    error: None,
                }
            }
            Err(e) => {
                warn!("[{}/{}] k={} failed: {}", index + 1, total, config.kmer_length, e);
                Trial {
                    index,
                    config: config.clone(),
                    stats: None,
                    score: 0.0,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

/// Index of the highest positive score; ties go to the earliest trial.
pub fn best_trial_index(trials: &[Trial]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, trial) in trials.iter().enumerate() {
        if trial.score <= 0.0 {
            continue;
        }
        match best {
            Some(b) if trials[b].score >= trial.score => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Search the grid, re-run the winner into `outdir` and record every trial
/// in `optimization_results.json`.
pub fn optimize_parameters(
    input: &Path,
    outdir: &Path,
    grid: &ParamGrid,
    base: &AssemblyConfig,
) -> Result<OptimizationResult> {
    fs::create_dir_all(outdir)?;
    let reads = load_reads(input)?;
    let configs = grid.configs(base);
    info!("Testing {} parameter combinations", configs.len());

    let trials = evaluate(&reads, &configs);
    let result = OptimizationResult {
        best: best_trial_index(&trials),
        trials,
    };

    match result.best_trial() {
        Some(best) => {
            info!(
                "Best parameters (trial {}): k={} min_kmer_count={} min_component_size={} tip_max_len={} pop_bubbles={} max_bubble_len={} score={:.1}",
                best.index + 1,
                best.config.kmer_length,
                best.config.min_kmer_count,
                best.config.min_component_size,
                best.config.tip_max_len,
                best.config.pop_bubbles,
                best.config.max_bubble_len,
                best.score
            );
            run_assembly_to_dir(input, outdir, &best.config)?;
            best.config.save(&outdir.join(BEST_PARAMS_FILE))?;
        }
        None => warn!("No parameter combination produced contigs"),
    }

    fs::write(
        outdir.join(RESULTS_FILE),
        serde_json::to_string_pretty(&result)?,
    )?;
    Ok(result)
}
